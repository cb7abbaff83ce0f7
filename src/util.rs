//! Small utility helpers shared across the crate.

use std::env;
use std::str::FromStr;

use crate::error::ConfigError;

/// Return the first non-empty environment variable from `keys`, or `None`.
pub fn env_first(keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Ok(value) = env::var(key) {
            if !value.trim().is_empty() {
                return Some(value);
            }
        }
    }
    None
}

/// Parse the first set variable in `keys`, falling back to `default` when none is set.
pub fn env_parse<T: FromStr>(keys: &[&'static str], default: T) -> Result<T, ConfigError> {
    let Some(raw) = env_first(keys) else {
        return Ok(default);
    };
    raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
        key: keys[0],
        reason: format!("cannot parse {raw:?}"),
    })
}

/// Normalise a URL by prepending `http://` or `https://` when the scheme is missing.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        return trimmed.to_string();
    }
    let scheme = if trimmed.starts_with("localhost")
        || trimmed.starts_with("127.")
        || trimmed.contains(":6333")
    {
        "http"
    } else {
        "https"
    };
    format!("{scheme}://{trimmed}")
}

/// Split a document into paragraph chunks separated by blank lines.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                chunks.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        chunks.push(current.join("\n"));
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_url_adds_scheme() {
        assert_eq!(normalize_url("localhost:6333/"), "http://localhost:6333");
        assert_eq!(normalize_url("example.cloud.qdrant.io"), "https://example.cloud.qdrant.io");
        assert_eq!(normalize_url("https://x.io/v1/"), "https://x.io/v1");
    }

    #[test]
    fn split_paragraphs_drops_blank_runs() {
        let text = "first line\nstill first\n\n\n  \nsecond\n";
        assert_eq!(
            split_paragraphs(text),
            vec!["first line\nstill first".to_string(), "second".to_string()]
        );
        assert!(split_paragraphs("\n \n").is_empty());
    }
}
