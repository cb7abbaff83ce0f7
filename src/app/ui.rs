//! Terminal UI rendering — layout, status bar, and conversation panel.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Position};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use super::App;
use super::logging::mask_key;

impl App {
    /// Render the full TUI frame: header bar, conversation log, and input prompt.
    pub fn draw(&mut self, frame: &mut Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(3),
            ])
            .split(frame.area());

        // ── Status bar ───────────────────────────────────────────────
        let turns = self
            .session
            .as_ref()
            .map(|s| s.turn_count().to_string())
            .unwrap_or_else(|| "…".to_string());
        let mut header_spans = vec![
            Span::styled("Co-worker: ", Style::default().fg(Color::DarkGray)),
            Span::styled(self.active_persona_name(), Style::default().fg(Color::Magenta)),
            Span::styled("  Session: ", Style::default().fg(Color::DarkGray)),
            Span::styled(self.session_id.clone(), Style::default().fg(Color::Gray)),
            Span::styled(
                format!("  Turns: {turns}"),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled("  Gemini: ", Style::default().fg(Color::DarkGray)),
            Span::styled(self.gemini_status_label(), Style::default().fg(self.gemini_status_color())),
            Span::styled("  KB: ", Style::default().fg(Color::DarkGray)),
            Span::styled(self.kb_status_label(), Style::default().fg(self.kb_status_color())),
        ];
        if self.is_thinking() {
            header_spans.push(Span::styled(
                "  thinking…",
                Style::default().fg(Color::Yellow),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(header_spans)), chunks[0]);

        // ── Conversation log ─────────────────────────────────────────
        let inner_width = chunks[1].width.saturating_sub(2);
        let inner_height = chunks[1].height.saturating_sub(2) as usize;

        let log_lines: Vec<Line> = self.logs.iter().map(|l| l.render()).collect();
        let log_paragraph = Paragraph::new(Text::from(log_lines)).wrap(Wrap { trim: true });

        let total_visual = log_paragraph.line_count(inner_width);
        let max_scroll = total_visual.saturating_sub(inner_height);

        if (self.scroll_offset as usize) > max_scroll {
            self.scroll_offset = max_scroll as u16;
        }
        let top_row = max_scroll.saturating_sub(self.scroll_offset as usize) as u16;

        let title = if self.scroll_offset > 0 {
            format!(" Conversation [↑{}] ", self.scroll_offset)
        } else {
            " Conversation ".to_string()
        };

        let log_panel = log_paragraph
            .block(Block::default().borders(Borders::ALL).title(title))
            .scroll((top_row, 0));
        frame.render_widget(log_panel, chunks[1]);

        // ── Input prompt ─────────────────────────────────────────────
        let input_panel = Paragraph::new(self.input.as_str())
            .block(Block::default().borders(Borders::ALL).title("Message"));
        frame.render_widget(input_panel, chunks[2]);

        let input_width = chunks[2].width.saturating_sub(2) as usize;
        let cursor = self.cursor.min(input_width);
        frame.set_cursor_position(Position::new(
            chunks[2].x + 1 + cursor as u16,
            chunks[2].y + 1,
        ));
    }

    // ── Status-bar helpers ───────────────────────────────────────────

    pub(crate) fn gemini_status_label(&self) -> String {
        match &self.config.gemini.api_key {
            Some(key) => mask_key(key),
            None => "unset".to_string(),
        }
    }

    fn gemini_status_color(&self) -> Color {
        if self.engine.is_some() {
            Color::Green
        } else {
            Color::Red
        }
    }

    pub(crate) fn kb_status_label(&self) -> String {
        match &self.knowledge {
            Some(kb) => kb.store().collection().to_string(),
            None => "off".to_string(),
        }
    }

    fn kb_status_color(&self) -> Color {
        if self.knowledge.is_some() {
            Color::Green
        } else {
            Color::DarkGray
        }
    }
}
