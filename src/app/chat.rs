//! Chat flow — non-blocking launcher for turns and the task-event pump.
//!
//! A turn moves the session into a tokio task and gets it back through
//! the task channel, so the draw loop keeps running and no second turn can
//! touch the session meanwhile.

use coworker::engine::TurnResult;
use coworker::session::SessionState;

use super::logging::LogLevel;
use super::{App, TaskEvent};

impl App {
    /// Launch a non-blocking chat turn.
    pub(crate) fn handle_chat_message(&mut self, message: &str) {
        let Some(engine) = self.engine.clone() else {
            self.log(
                LogLevel::Error,
                "Chat is offline: set GEMINI_API_KEY and restart.".to_string(),
            );
            return;
        };
        let Some(mut session) = self.session.take() else {
            self.log(
                LogLevel::Warn,
                "Still waiting on the previous reply…".to_string(),
            );
            return;
        };

        self.log(LogLevel::User, message.to_string());

        let tx = self.task_tx.clone();
        let message = message.to_string();
        self.runtime.spawn(async move {
            let result = engine.run_turn(&message, &mut session).await;
            let _ = tx.send(TaskEvent::TurnFinished { session, result });
        });
    }

    /// Drain finished background work into app state. Called every frame.
    pub fn poll_tasks(&mut self) {
        while let Ok(event) = self.task_rx.try_recv() {
            match event {
                TaskEvent::TurnFinished { session, result } => {
                    self.finish_turn(session, result);
                }
                TaskEvent::Log { level, message } => self.log(level, message),
            }
        }
    }

    fn finish_turn(&mut self, session: SessionState, result: TurnResult) {
        let speaker = self.active_persona_name();
        self.log_as(LogLevel::Reply, &speaker, result.assistant_message);
        if let Some(hint) = result.director_hint {
            self.log(LogLevel::Director, hint.to_string());
        }
        self.last_context = if result.context_used.is_empty() {
            None
        } else {
            Some(result.context_used)
        };
        self.session_id = session.session_id().to_string();
        self.session = Some(session);
    }
}
