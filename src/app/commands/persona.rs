//! `/persona` command handlers.

use coworker::session::SessionState;

use super::super::App;
use super::super::log_src;
use super::super::logging::LogLevel;

impl App {
    pub(crate) fn handle_persona_command(&mut self, args: Vec<&str>) {
        match args.first().copied() {
            None | Some("list") => self.list_personas(),
            Some("use") => match args.get(1) {
                Some(id) => self.switch_persona(id),
                None => self.log(LogLevel::Warn, "Usage: /persona use <id>".to_string()),
            },
            Some("info") => self.show_persona_info(),
            Some(other) => log_src!(
                self,
                LogLevel::Warn,
                format!("Unknown /persona command: {other}")
            ),
        }
    }

    fn list_personas(&mut self) {
        let rows: Vec<String> = self
            .personas
            .iter()
            .map(|p| {
                let marker = if p.id == self.persona_id { "*" } else { " " };
                format!("{marker} {:<8} {} — {}", p.id, p.name, p.focus)
            })
            .collect();
        self.log(LogLevel::Info, "Personas:".to_string());
        for row in rows {
            self.log(LogLevel::Info, row);
        }
    }

    fn switch_persona(&mut self, id: &str) {
        if id == self.persona_id {
            self.log(LogLevel::Info, format!("Already talking to {id}."));
            return;
        }
        if self.is_thinking() {
            self.log(
                LogLevel::Warn,
                "Wait for the current reply before switching persona.".to_string(),
            );
            return;
        }

        if let Some(engine) = &self.engine {
            match engine.with_persona(id) {
                Ok(next) => self.engine = Some(next),
                Err(err) => {
                    log_src!(self, LogLevel::Error, err.to_string());
                    return;
                }
            }
        } else if let Err(err) = self.personas.lookup(id) {
            log_src!(self, LogLevel::Error, err.to_string());
            return;
        }

        self.persona_id = id.to_string();
        let session = SessionState::start(id);
        self.session_id = session.session_id().to_string();
        self.session = Some(session);
        self.last_context = None;
        tracing::info!(persona = %id, session = %self.session_id, "persona switched");

        let name = self.active_persona_name();
        self.log(
            LogLevel::Info,
            format!("Now talking to {name}. New session {}.", self.session_id),
        );
    }

    fn show_persona_info(&mut self) {
        let persona = match self.personas.lookup(&self.persona_id) {
            Ok(p) => p.clone(),
            Err(err) => {
                self.log(LogLevel::Error, err.to_string());
                return;
            }
        };
        self.log(
            LogLevel::Info,
            format!("{} ({}) — {}", persona.name, persona.id, persona.title),
        );
        self.log(LogLevel::Info, format!("Focus: {}", persona.focus));
        self.log(LogLevel::Info, format!("Style: {}", persona.style_guide));
    }
}
