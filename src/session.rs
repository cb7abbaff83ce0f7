//! Conversation record for a single chat session.
//!
//! A [`SessionState`] lives in memory only. History is append-only and
//! the turn counter moves exactly once per user message, so after every
//! completed turn `history.len() == 2 * turn_count`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Local};
use serde_json::Value;

/// Who produced a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    System,
    Director,
}

impl Role {
    /// Tag used for transcript lines in the assembled prompt.
    pub fn tag(self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Assistant => "ASSISTANT",
            Role::System => "SYSTEM",
            Role::Director => "DIRECTOR",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Director => "director",
        };
        f.write_str(name)
    }
}

/// One conversational turn fragment. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    role: Role,
    content: String,
    timestamp: DateTime<Local>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Local::now(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }
}

/// Full record of one conversation.
#[derive(Debug, Clone)]
pub struct SessionState {
    session_id: String,
    persona_id: String,
    history: Vec<Message>,
    turn_count: u32,
    metadata: BTreeMap<String, Value>,
}

impl SessionState {
    pub fn new(session_id: impl Into<String>, persona_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            persona_id: persona_id.into(),
            history: Vec::new(),
            turn_count: 0,
            metadata: BTreeMap::new(),
        }
    }

    /// Start a session with a freshly generated id.
    pub fn start(persona_id: impl Into<String>) -> Self {
        Self::new(new_session_id(), persona_id)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Persona the history was produced with.
    pub fn persona_id(&self) -> &str {
        &self.persona_id
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.history.last()
    }

    /// The trailing `window` messages, oldest first.
    pub fn recent(&self, window: usize) -> &[Message] {
        let start = self.history.len().saturating_sub(window);
        &self.history[start..]
    }

    /// Append a user message and count the turn.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.history.push(Message::new(Role::User, content));
        self.turn_count += 1;
    }

    /// Append an assistant reply.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.history.push(Message::new(Role::Assistant, content));
    }

    /// Record a learned fact. Later writes to the same key win.
    pub fn remember(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn facts(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    /// Drop the conversation and bind the session to `persona_id`.
    ///
    /// The session id survives a reset.
    pub fn reset(&mut self, persona_id: impl Into<String>) {
        self.persona_id = persona_id.into();
        self.history.clear();
        self.turn_count = 0;
        self.metadata.clear();
    }
}

/// Generate an opaque session identifier.
pub fn new_session_id() -> String {
    format!("session-{:08x}", rand::random::<u32>())
}
