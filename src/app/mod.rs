//! Application core — state, lifecycle, and event dispatch.
//!
//! The [`App`] struct holds all runtime state and is the single entry point
//! for the rest of the binary.  Heavy concerns are delegated to focused
//! submodules:
//!
//! | Module     | Responsibility                               |
//! |------------|----------------------------------------------|
//! | `chat`     | Launching turns and collecting their results |
//! | `commands` | Slash-command dispatch & handlers            |
//! | `input`    | Text-input editing (cursor, insert, etc.)    |
//! | `logging`  | `LogLevel`, `LogLine`, `mask_key`            |
//! | `ui`       | TUI rendering & status-bar helpers           |

mod chat;
mod commands;
mod input;
mod logging;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use coworker::config::{Config, EngineSettings, GeminiConfig, QdrantConfig};
use coworker::constants::MAX_LOGS;
use coworker::director::HelpRequestDirector;
use coworker::engine::{ConversationEngine, TurnResult};
use coworker::error::InvalidPersonaError;
use coworker::gemini::GeminiClient;
use coworker::persona::PersonaRegistry;
use coworker::qdrant::QdrantStore;
use coworker::retrieval::KnowledgeBase;
use coworker::session::SessionState;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers, MouseEventKind};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use self::logging::{LogLevel, LogLine};

/// Results pushed back from background tasks.
pub(crate) enum TaskEvent {
    /// A turn finished; the session comes back with it.
    TurnFinished {
        session: SessionState,
        result: TurnResult,
    },
    /// A knowledge-base task has something to report.
    Log { level: LogLevel, message: String },
}

/// Remote collaborators. All three exist together or not at all: the
/// knowledge base and the engine both need the Gemini key.
pub(crate) struct Backends {
    pub(crate) gemini: Option<GeminiClient>,
    pub(crate) knowledge: Option<KnowledgeBase>,
    pub(crate) engine: Option<ConversationEngine>,
}

impl Backends {
    pub(crate) fn connect(
        gemini: &GeminiConfig,
        qdrant: &QdrantConfig,
        settings: &EngineSettings,
        personas: &Arc<PersonaRegistry>,
        persona_id: &str,
    ) -> Result<Self, InvalidPersonaError> {
        let Some(client) = GeminiClient::from_config(gemini) else {
            return Ok(Backends {
                gemini: None,
                knowledge: None,
                engine: None,
            });
        };
        let knowledge = KnowledgeBase::new(client.clone(), QdrantStore::new(qdrant));
        let engine = ConversationEngine::new(
            persona_id,
            personas.clone(),
            Arc::new(knowledge.clone()),
            Arc::new(client.clone()),
            Arc::new(HelpRequestDirector::new()),
            settings.clone(),
        )?;
        Ok(Backends {
            gemini: Some(client),
            knowledge: Some(knowledge),
            engine: Some(engine),
        })
    }
}

// ── Application state ────────────────────────────────────────────────

/// Top-level application state.
///
/// Fields use `pub(crate)` visibility so that the sibling submodules
/// (`commands`, `chat`, `ui`, …) can access them directly while keeping
/// them hidden from the rest of the crate.
pub struct App {
    pub(crate) runtime: Runtime,
    pub(crate) input: String,
    /// Cursor position in characters, not bytes.
    pub(crate) cursor: usize,
    pub(crate) input_history: Vec<String>,
    pub(crate) history_index: Option<usize>,
    pub(crate) history_stash: String,
    pub(crate) logs: Vec<LogLine>,
    pub(crate) config: Config,
    pub(crate) personas: Arc<PersonaRegistry>,
    pub(crate) gemini: Option<GeminiClient>,
    pub(crate) knowledge: Option<KnowledgeBase>,
    pub(crate) engine: Option<ConversationEngine>,
    pub(crate) persona_id: String,
    /// `None` while a turn owns the session.
    pub(crate) session: Option<SessionState>,
    pub(crate) session_id: String,
    pub(crate) task_tx: mpsc::UnboundedSender<TaskEvent>,
    pub(crate) task_rx: mpsc::UnboundedReceiver<TaskEvent>,
    pub(crate) last_context: Option<String>,
    pub(crate) log_file: Option<PathBuf>,
    pub(crate) scroll_offset: u16,
    pub(crate) should_quit: bool,
}

// ── Lifecycle ────────────────────────────────────────────────────────

impl App {
    /// Create and initialise a new application instance.
    ///
    /// Fails when the configured persona id is not in the catalog.
    pub fn new(config: Config, log_file: Option<PathBuf>) -> Result<Self> {
        let runtime = Runtime::new().context("create tokio runtime")?;
        let personas = match &config.personas_file {
            Some(path) => PersonaRegistry::load(path)
                .with_context(|| format!("load personas from {}", path.display()))?,
            None => PersonaRegistry::builtin(),
        };
        let personas = Arc::new(personas);
        let persona_id = config.persona_id.clone();
        personas.lookup(&persona_id)?;

        let Backends {
            gemini,
            knowledge,
            engine,
        } = Backends::connect(
            &config.gemini,
            &config.qdrant,
            &config.engine,
            &personas,
            &persona_id,
        )?;

        let session = SessionState::start(persona_id.as_str());
        let session_id = session.session_id().to_string();
        let (task_tx, task_rx) = mpsc::unbounded_channel();

        let mut app = App {
            runtime,
            input: String::new(),
            cursor: 0,
            input_history: Vec::new(),
            history_index: None,
            history_stash: String::new(),
            logs: Vec::new(),
            config,
            personas,
            gemini,
            knowledge,
            engine,
            persona_id,
            session: Some(session),
            session_id,
            task_tx,
            task_rx,
            last_context: None,
            log_file,
            scroll_offset: 0,
            should_quit: false,
        };

        app.greet();
        Ok(app)
    }

    fn greet(&mut self) {
        let persona = self.active_persona_name();
        self.log(
            LogLevel::Info,
            format!("Loaded {} persona(s). Current co-worker: {persona}.", self.personas.len()),
        );
        if self.engine.is_none() {
            self.log(
                LogLevel::Error,
                "Missing API key! Set GEMINI_API_KEY in your environment or .env to chat."
                    .to_string(),
            );
        }
        match &self.log_file {
            Some(path) => self.log(LogLevel::Info, format!("Diagnostics: {}", path.display())),
            None => self.log(LogLevel::Warn, "File logging is disabled.".to_string()),
        }
        self.log(
            LogLevel::Info,
            "Type /help for commands, or just start talking.".to_string(),
        );
    }

    pub(crate) fn active_persona_name(&self) -> String {
        self.personas
            .lookup(&self.persona_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|_| self.persona_id.clone())
    }

    /// Whether a turn is waiting on the model.
    pub(crate) fn is_thinking(&self) -> bool {
        self.session.is_none()
    }

    /// Whether the user has requested to quit.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}

// ── Event handling ───────────────────────────────────────────────────

impl App {
    /// Route a terminal event to the appropriate handler.
    pub fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Key(key) => self.handle_key(key)?,
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => self.scroll_up(3),
                MouseEventKind::ScrollDown => self.scroll_down(3),
                _ => {}
            },
            _ => {}
        }
        Ok(())
    }

    /// Dispatch a key press to input editing, commands, or control actions.
    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        match key {
            KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => self.should_quit = true,

            KeyEvent {
                code: KeyCode::Char('l'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => self.logs.clear(),

            KeyEvent { code, .. } => match code {
                KeyCode::Char(ch) => {
                    self.scroll_offset = 0;
                    self.insert_char(ch);
                }
                KeyCode::Backspace => self.backspace(),
                KeyCode::Delete => self.delete(),
                KeyCode::Left => self.move_cursor_left(),
                KeyCode::Right => self.move_cursor_right(),
                KeyCode::Home => self.move_cursor_home(),
                KeyCode::End => self.move_cursor_end(),
                KeyCode::Up => self.history_prev(),
                KeyCode::Down => self.history_next(),
                KeyCode::PageUp => self.scroll_up(10),
                KeyCode::PageDown => self.scroll_down(10),
                KeyCode::Enter => {
                    self.scroll_offset = 0;
                    self.submit_input()?;
                }
                KeyCode::Esc => self.should_quit = true,
                _ => {}
            },
        }
        Ok(())
    }

    /// Submit the current input line for processing.
    fn submit_input(&mut self) -> Result<()> {
        let line = self.input.trim().to_string();
        self.input.clear();
        self.cursor = 0;
        self.history_index = None;

        if line.is_empty() {
            return Ok(());
        }
        if self.input_history.last() != Some(&line) {
            self.input_history.push(line.clone());
        }

        if line.starts_with('/') {
            self.handle_command(&line)?;
        } else {
            self.handle_chat_message(&line);
        }

        Ok(())
    }
}

// ── Scrolling ────────────────────────────────────────────────────────

impl App {
    /// Scroll the activity log up by `n` lines.
    pub(crate) fn scroll_up(&mut self, n: u16) {
        self.scroll_offset = self.scroll_offset.saturating_add(n);
    }

    /// Scroll the activity log down by `n` lines (towards the latest).
    pub(crate) fn scroll_down(&mut self, n: u16) {
        self.scroll_offset = self.scroll_offset.saturating_sub(n);
    }
}

// ── Logging ──────────────────────────────────────────────────────────

/// Log a `Warn`/`Error` message, attaching `[file:line]` in debug-logs builds.
///
/// Without the `debug-logs` feature this behaves like `self.log()`.
macro_rules! log_src {
    ($app:expr, $level:expr, $msg:expr) => {{
        #[cfg(feature = "debug-logs")]
        {
            let loc = format!("{}:{}", file!(), line!());
            $app.log_with_src($level, $msg, &loc);
        }
        #[cfg(not(feature = "debug-logs"))]
        {
            $app.log($level, $msg);
        }
    }};
}
pub(crate) use log_src;

impl App {
    /// Append a message to the activity log.
    pub(crate) fn log(&mut self, level: LogLevel, message: String) {
        self.push_line(LogLine::new(level, message));
    }

    /// Append a line attributed to a named speaker.
    pub(crate) fn log_as(&mut self, level: LogLevel, speaker: &str, message: String) {
        let mut line = LogLine::new(level, message);
        line.speaker = Some(speaker.to_string());
        self.push_line(line);
    }

    /// Append a message with a source location suffix (debug-logs builds only).
    #[cfg(feature = "debug-logs")]
    pub(crate) fn log_with_src(&mut self, level: LogLevel, message: String, src: &str) {
        let tagged = match level {
            LogLevel::Warn | LogLevel::Error => format!("{message}  [{src}]"),
            _ => message,
        };
        self.log(level, tagged);
    }

    fn push_line(&mut self, line: LogLine) {
        self.logs.push(line);
        if self.logs.len() > MAX_LOGS {
            let overflow = self.logs.len() - MAX_LOGS;
            self.logs.drain(0..overflow);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn gemini(api_key: Option<&str>) -> GeminiConfig {
        GeminiConfig {
            api_key: api_key.map(str::to_string),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            llm_model: "gemini-2.5-flash-lite".to_string(),
            embed_model: "gemini-embedding-001".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }

    fn qdrant() -> QdrantConfig {
        QdrantConfig {
            url: "http://localhost:6333".to_string(),
            api_key: None,
            collection: "gucci_sim_data_v2".to_string(),
            vector_size: 3072,
            request_timeout: Duration::from_secs(30),
        }
    }

    #[test]
    fn no_key_means_no_backends() {
        let personas = Arc::new(PersonaRegistry::builtin());
        let backends = Backends::connect(
            &gemini(None),
            &qdrant(),
            &EngineSettings::default(),
            &personas,
            "ceo",
        )
        .unwrap();
        assert!(backends.gemini.is_none());
        assert!(backends.knowledge.is_none());
        assert!(backends.engine.is_none());
    }

    #[test]
    fn key_wires_engine_to_the_knowledge_base() {
        let personas = Arc::new(PersonaRegistry::builtin());
        let backends = Backends::connect(
            &gemini(Some("test-key")),
            &qdrant(),
            &EngineSettings::default(),
            &personas,
            "chro",
        )
        .unwrap();
        let kb = backends.knowledge.unwrap();
        assert_eq!(kb.store().collection(), "gucci_sim_data_v2");
        assert_eq!(backends.engine.unwrap().persona().id, "chro");
    }

    #[test]
    fn unknown_persona_fails_with_a_key() {
        let personas = Arc::new(PersonaRegistry::builtin());
        let err = Backends::connect(
            &gemini(Some("test-key")),
            &qdrant(),
            &EngineSettings::default(),
            &personas,
            "intern",
        )
        .err()
        .unwrap();
        assert_eq!(err.persona_id, "intern");
    }
}
