//! Structured logging through `tracing`.
//!
//! The terminal belongs to the TUI, so events go to a log file under the
//! platform state directory unless `COWORKER_LOG_FILE` points elsewhere.

use std::path::PathBuf;

use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::constants::APP_NAME;
use crate::error::ConfigError;
use crate::util::env_first;

/// Output encoding of log events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `coworker=debug`.
    pub filter: String,
    pub format: LogFormat,
    /// Explicit log file; `None` means the default state-dir location.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Text,
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let format = match env_first(&["COWORKER_LOG_FORMAT"]).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };
        Self {
            filter: env_first(&["COWORKER_LOG", "RUST_LOG"]).unwrap_or_else(|| "info".to_string()),
            format,
            file: env_first(&["COWORKER_LOG_FILE"]).map(PathBuf::from),
        }
    }
}

/// Default log file: `<state dir>/coworker.log`.
pub fn default_log_file_path() -> Result<PathBuf, ConfigError> {
    let project_dirs = directories::ProjectDirs::from("", "", APP_NAME).ok_or_else(|| {
        ConfigError::Logging("could not determine platform directories".to_string())
    })?;
    let dir = project_dirs
        .state_dir()
        .unwrap_or_else(|| project_dirs.data_local_dir())
        .to_path_buf();
    Ok(dir.join(format!("{APP_NAME}.log")))
}

/// Install the global subscriber. Returns the file events are written to.
pub fn init_logging(config: &LoggingConfig) -> Result<PathBuf, ConfigError> {
    let path = match &config.file {
        Some(path) => path.clone(),
        None => default_log_file_path()?,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;

    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|err| ConfigError::Logging(format!("bad filter {:?}: {err}", config.filter)))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(file),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(file),
            )
            .try_init(),
    };
    result.map_err(|err| ConfigError::Logging(err.to_string()))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_logs_text_at_info() {
        let config = LoggingConfig::default();
        assert_eq!(config.filter, "info");
        assert_eq!(config.format, LogFormat::Text);
        assert!(config.file.is_none());
    }

    #[test]
    fn default_path_ends_with_app_log() {
        if let Ok(path) = default_log_file_path() {
            assert!(path.ends_with("coworker.log"));
        }
    }
}
