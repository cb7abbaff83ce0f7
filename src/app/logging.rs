//! Activity-panel log lines and key masking.

use chrono::Local;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Kind of entry in the activity panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    /// A line the user typed.
    User,
    /// A persona reply.
    Reply,
    /// A director hint.
    Director,
    /// Retrieved knowledge-base text.
    Context,
}

impl LogLevel {
    fn label(self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::User => "you",
            LogLevel::Reply => "reply",
            LogLevel::Director => "director",
            LogLevel::Context => "context",
        }
    }

    fn style(self) -> Style {
        match self {
            LogLevel::Info => Style::default().fg(Color::Gray),
            LogLevel::Warn => Style::default().fg(Color::Yellow),
            LogLevel::Error => Style::default().fg(Color::Red),
            LogLevel::User => Style::default().fg(Color::Cyan),
            LogLevel::Reply => Style::default().fg(Color::White),
            LogLevel::Director => Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::ITALIC),
            LogLevel::Context => Style::default().fg(Color::DarkGray),
        }
    }
}

/// One rendered entry in the activity panel.
#[derive(Clone, Debug)]
pub struct LogLine {
    pub timestamp: String,
    pub level: LogLevel,
    /// Speaker shown instead of the level label (persona name for replies).
    pub speaker: Option<String>,
    pub message: String,
}

impl LogLine {
    pub fn new(level: LogLevel, message: String) -> Self {
        Self {
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            level,
            speaker: None,
            message,
        }
    }

    pub fn render(&self) -> Line<'_> {
        let label = self.speaker.as_deref().unwrap_or(self.level.label());
        Line::from(vec![
            Span::styled(
                format!("{} ", self.timestamp),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(
                format!("{label:>8} "),
                self.level.style().add_modifier(Modifier::BOLD),
            ),
            Span::styled(self.message.as_str(), self.level.style()),
        ])
    }
}

/// Show only the edges of a secret: `AIza…xy9Q`.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_key_hides_the_middle() {
        assert_eq!(mask_key("AIzaSyD-1234567890xy9Q"), "AIza…xy9Q");
        assert_eq!(mask_key("short"), "****");
    }
}
