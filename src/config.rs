//! Runtime settings read from the environment (and `.env`, loaded by the binary).

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::constants::{
    DEFAULT_COLLECTION, DEFAULT_EMBED_DIM, DEFAULT_EMBED_MODEL, DEFAULT_GEMINI_BASE_URL,
    DEFAULT_HISTORY_WINDOW, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_LLM_MODEL, DEFAULT_PERSONA_ID, DEFAULT_QDRANT_URL,
    DEFAULT_TOP_K,
};
use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use crate::util::{env_first, env_parse, normalize_url};

/// Gemini endpoint, models, and credentials.
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub llm_model: String,
    pub embed_model: String,
    /// Upper bound on a single HTTP request, connect through body.
    pub request_timeout: Duration,
}

/// Qdrant endpoint and collection layout.
#[derive(Clone, Debug)]
pub struct QdrantConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub collection: String,
    pub vector_size: usize,
    pub request_timeout: Duration,
}

/// Knobs of the turn pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineSettings {
    /// Snippets fetched from the knowledge base per turn.
    pub top_k: usize,
    /// Trailing history entries placed in each prompt.
    pub history_window: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub qdrant: QdrantConfig,
    pub engine: EngineSettings,
    pub persona_id: String,
    pub personas_file: Option<PathBuf>,
    pub logging: LoggingConfig,
}

impl Config {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs = env_parse(&["COWORKER_HTTP_TIMEOUT_SECS"], DEFAULT_HTTP_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "COWORKER_HTTP_TIMEOUT_SECS",
                reason: "must be positive".to_string(),
            });
        }
        let request_timeout = Duration::from_secs(timeout_secs);

        let gemini = GeminiConfig {
            api_key: env_first(&["GEMINI_API_KEY", "GOOGLE_API_KEY"]),
            base_url: validated_url(
                "GEMINI_BASE_URL",
                env_first(&["GEMINI_BASE_URL"]).unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.into()),
            )?,
            llm_model: env_first(&["COWORKER_LLM_MODEL", "LLM_MODEL"])
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            embed_model: env_first(&["COWORKER_EMBED_MODEL", "EMBED_MODEL"])
                .map(|m| m.trim_start_matches("models/").to_string())
                .unwrap_or_else(|| DEFAULT_EMBED_MODEL.to_string()),
            request_timeout,
        };

        let vector_size = env_parse(&["COWORKER_EMBED_DIM", "EMBED_DIM"], DEFAULT_EMBED_DIM)?;
        if vector_size == 0 {
            return Err(ConfigError::Invalid {
                key: "COWORKER_EMBED_DIM",
                reason: "must be positive".to_string(),
            });
        }
        let qdrant = QdrantConfig {
            url: validated_url(
                "QDRANT_URL",
                env_first(&["QDRANT_URL"]).unwrap_or_else(|| DEFAULT_QDRANT_URL.into()),
            )?,
            api_key: env_first(&["QDRANT_API_KEY"]),
            collection: env_first(&["COWORKER_COLLECTION"])
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            vector_size,
            request_timeout,
        };

        let engine = EngineSettings {
            top_k: env_parse(&["COWORKER_TOP_K"], DEFAULT_TOP_K)?,
            history_window: env_parse(&["COWORKER_HISTORY_WINDOW"], DEFAULT_HISTORY_WINDOW)?,
        };

        Ok(Config {
            gemini,
            qdrant,
            engine,
            persona_id: env_first(&["COWORKER_PERSONA"])
                .unwrap_or_else(|| DEFAULT_PERSONA_ID.to_string()),
            personas_file: env_first(&["COWORKER_PERSONAS_FILE"]).map(PathBuf::from),
            logging: LoggingConfig::from_env(),
        })
    }
}

fn validated_url(key: &'static str, raw: String) -> Result<String, ConfigError> {
    let normalized = normalize_url(&raw);
    Url::parse(&normalized).map_err(|err| ConfigError::Invalid {
        key,
        reason: format!("{raw:?} is not a URL: {err}"),
    })?;
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validated_url_normalizes_and_rejects_garbage() {
        assert_eq!(
            validated_url("QDRANT_URL", "localhost:6333".to_string()).unwrap(),
            "http://localhost:6333"
        );
        let err = validated_url("QDRANT_URL", "http://exa mple".to_string()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "QDRANT_URL", .. }));
    }

    #[test]
    fn engine_settings_default_to_reference_values() {
        let settings = EngineSettings::default();
        assert_eq!(settings.top_k, 3);
        assert_eq!(settings.history_window, 10);
    }
}
