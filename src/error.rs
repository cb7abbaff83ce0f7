//! Error kinds surfaced by the engine and its collaborators.
//!
//! Only [`InvalidPersonaError`] and [`ConfigError`] ever reach a caller.
//! [`RetrievalError`] and [`GenerationError`] are absorbed by
//! [`crate::engine::ConversationEngine::run_turn`], which picks its
//! fallback from the error kind rather than the error text.

use std::path::PathBuf;

/// A persona id that is not part of the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid persona id: {persona_id}")]
pub struct InvalidPersonaError {
    pub persona_id: String,
}

impl InvalidPersonaError {
    pub fn new(persona_id: impl Into<String>) -> Self {
        Self {
            persona_id: persona_id.into(),
        }
    }
}

/// Failure of the retrieval collaborator (embedding or vector search).
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("Knowledge base not configured: {0}")]
    NotConfigured(String),

    #[error("Transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{service} returned {status}: {message}")]
    Service {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("Malformed {service} response: {message}")]
    Malformed {
        service: &'static str,
        message: String,
    },

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Failure of the generation collaborator.
///
/// The split between the two variants drives which reply the user sees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Generation failed: {0}")]
    Other(String),
}

impl GenerationError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GenerationError::RateLimited(_))
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.status().map(|s| s.as_u16()) == Some(429) {
            GenerationError::RateLimited(err.to_string())
        } else {
            GenerationError::Other(err.to_string())
        }
    }
}

/// Configuration problems found while loading settings or the persona catalog.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse persona file {path}: {source}")]
    PersonaFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid persona '{id}': {reason}")]
    Persona { id: String, reason: String },

    #[error("Logging setup failed: {0}")]
    Logging(String),
}
