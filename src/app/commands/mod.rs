//! Slash-command dispatch and handler implementations.
//!
//! Every `/command` typed by the user is routed through [`App::handle_command`]
//! and dispatched to the appropriate handler in a focused submodule:
//!
//! | Module      | Commands                                     |
//! |-------------|----------------------------------------------|
//! | `persona`   | `/persona` – list, use, info                 |
//! | `session`   | `/reset`, `/session`, `/fact`, `/context`    |
//! | `knowledge` | `/kb` – status, ingest, clear, check         |

mod knowledge;
mod persona;
mod session;

use super::App;
use super::log_src;
use super::logging::LogLevel;

// ── Command dispatch ─────────────────────────────────────────────────

impl App {
    /// Route a slash-command to the matching handler.
    pub(crate) fn handle_command(&mut self, line: &str) -> anyhow::Result<()> {
        let mut parts = line.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "/help" => self.show_help(),
            "/quit" | "/exit" => self.should_quit = true,
            "/clear" => self.logs.clear(),
            "/persona" | "/p" => self.handle_persona_command(parts.collect()),
            "/reset" => self.handle_reset_command(),
            "/session" => self.show_session(),
            "/fact" => self.handle_fact_command(parts.collect()),
            "/context" => self.show_last_context(),
            "/kb" => self.handle_kb_command(parts.collect()),
            _ => log_src!(self, LogLevel::Warn, format!("Unknown command: {cmd}")),
        }

        Ok(())
    }
}

// ── Help ─────────────────────────────────────────────────────────────

impl App {
    fn show_help(&mut self) {
        let lines = [
            "━━━  Coworker — rehearse the hard conversations  ━━━",
            "",
            "Just type to talk to the current co-worker.",
            "",
            "Personas",
            "  /persona                See available personas",
            "  /persona use <id>       Switch persona (starts a fresh session)",
            "  /persona info           Current persona details",
            "",
            "Session",
            "  /session                Show session id, turns, and facts",
            "  /reset                  Start a fresh session with the same persona",
            "  /fact <key> <value>     Pin a fact to the session",
            "  /context                Show the knowledge used for the last reply",
            "",
            "Knowledge base",
            "  /kb                     Show knowledge base status",
            "  /kb ingest <path>       Add a text file to the knowledge base",
            "  /kb clear               Drop the collection",
            "  /kb check               Compare embedding and collection dimensions",
            "",
            "General",
            "  PgUp / PgDn             Scroll the conversation",
            "  Up / Down               Browse input history",
            "  /clear                  Clear the screen",
            "  /quit                   Exit",
        ];
        for line in lines {
            self.log(LogLevel::Info, line.to_string());
        }
    }
}
