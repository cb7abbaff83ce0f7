//! Compile-time constants and tunables shared across the crate.

/// Application name used for state directories and log file names.
pub const APP_NAME: &str = "coworker";
/// Application version injected from `Cargo.toml` at compile time.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Persona selected when `COWORKER_PERSONA` is not set.
pub const DEFAULT_PERSONA_ID: &str = "ceo";

/// Default Gemini API base URL.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default Gemini generation model.
pub const DEFAULT_LLM_MODEL: &str = "gemini-2.5-flash-lite";
/// Default Gemini embedding model.
pub const DEFAULT_EMBED_MODEL: &str = "gemini-embedding-001";
/// Output dimension of `gemini-embedding-001`.
pub const DEFAULT_EMBED_DIM: usize = 3072;

/// Default Qdrant endpoint.
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6333";
/// Default Qdrant collection holding the background documents.
pub const DEFAULT_COLLECTION: &str = "gucci_sim_data_v2";

/// Per-request timeout for Gemini and Qdrant calls, in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Number of snippets pulled from the knowledge base per turn.
pub const DEFAULT_TOP_K: usize = 3;
/// Number of trailing history entries included in each prompt.
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

/// Turn count the help-request director must exceed before it speaks up.
pub const DIRECTOR_TURN_THRESHOLD: u32 = 5;

/// Reply used when the generation service reports rate limiting or quota exhaustion.
pub const RATE_LIMITED_REPLY: &str = "The system is currently unavailable due to high traffic \
     (free tier limits). Please give it a minute and try again.";
/// Reply used for every other generation failure.
pub const GENERIC_APOLOGY_REPLY: &str =
    "I apologize, but I encountered an internal error processing your request.";

/// Probe text embedded by the dimension check.
pub const DIMENSION_PROBE_TEXT: &str = "Hello world";

/// Maximum number of log entries kept in the activity panel.
pub const MAX_LOGS: usize = 1000;
