//! `/reset`, `/session`, `/fact`, and `/context` command handlers.

use coworker::session::SessionState;

use super::super::App;
use super::super::logging::LogLevel;

impl App {
    pub(crate) fn handle_reset_command(&mut self) {
        if self.is_thinking() {
            self.log(
                LogLevel::Warn,
                "Wait for the current reply before resetting.".to_string(),
            );
            return;
        }
        let session = SessionState::start(self.persona_id.as_str());
        self.session_id = session.session_id().to_string();
        self.session = Some(session);
        self.last_context = None;
        self.log(
            LogLevel::Info,
            format!("Fresh session {} started.", self.session_id),
        );
    }

    pub(crate) fn show_session(&mut self) {
        let Some(session) = &self.session else {
            self.log(
                LogLevel::Info,
                format!("Session {} is busy with a reply.", self.session_id),
            );
            return;
        };

        let mut lines = vec![
            format!("Session: {}", session.session_id()),
            format!("Persona: {}", session.persona_id()),
            format!(
                "Turns: {} ({} messages)",
                session.turn_count(),
                session.history().len()
            ),
        ];
        if session.facts().is_empty() {
            lines.push("Facts: none".to_string());
        } else {
            lines.push("Facts:".to_string());
            for (key, value) in session.facts() {
                lines.push(format!("  {key} = {value}"));
            }
        }
        for line in lines {
            self.log(LogLevel::Info, line);
        }
    }

    pub(crate) fn handle_fact_command(&mut self, args: Vec<&str>) {
        if args.len() < 2 {
            self.log(LogLevel::Warn, "Usage: /fact <key> <value>".to_string());
            return;
        }
        let key = args[0].to_string();
        let value = args[1..].join(" ");
        match self.session.as_mut() {
            Some(session) => {
                session.remember(key.clone(), value.clone());
                self.log(LogLevel::Info, format!("Noted {key} = {value}."));
            }
            None => self.log(
                LogLevel::Warn,
                "Wait for the current reply before adding facts.".to_string(),
            ),
        }
    }

    pub(crate) fn show_last_context(&mut self) {
        match self.last_context.clone() {
            Some(context) => {
                self.log(LogLevel::Info, "Knowledge used for the last reply:".to_string());
                for snippet in context.split("\n\n") {
                    self.log(LogLevel::Context, snippet.to_string());
                }
            }
            None => self.log(
                LogLevel::Info,
                "The last reply had no knowledge base context.".to_string(),
            ),
        }
    }
}
