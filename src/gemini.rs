//! Gemini API client — content generation, embeddings, and response helpers.

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde_json::{Value, json};
use tracing::debug;

use crate::config::GeminiConfig;
use crate::error::{GenerationError, RetrievalError};
use crate::generation::Generator;

/// Gemini's task hint for an embedding request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmbedTask {
    RetrievalQuery,
    RetrievalDocument,
}

impl EmbedTask {
    fn as_api_str(self) -> &'static str {
        match self {
            EmbedTask::RetrievalQuery => "RETRIEVAL_QUERY",
            EmbedTask::RetrievalDocument => "RETRIEVAL_DOCUMENT",
        }
    }
}

/// Thin wrapper around the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    llm_model: String,
    embed_model: String,
    http_client: HttpClient,
}

impl GeminiClient {
    /// Build a client from config. Returns `None` when no API key is set.
    pub fn from_config(config: &GeminiConfig) -> Option<Self> {
        let api_key = config.api_key.clone()?;
        let http_client = HttpClient::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|_| HttpClient::new());
        Some(GeminiClient {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            llm_model: config.llm_model.clone(),
            embed_model: config.embed_model.clone(),
            http_client,
        })
    }

    pub fn llm_model(&self) -> &str {
        &self.llm_model
    }

    pub fn embed_model(&self) -> &str {
        &self.embed_model
    }

    /// Single-prompt `generateContent` call.
    pub async fn generate_content(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });
        let path = format!("models/{}:generateContent", self.llm_model);
        let (status, json) = self.request(&path, body).await?;
        if !status.is_success() {
            return Err(classify_generation_failure(status, &json));
        }
        let text = extract_candidate_text(&json);
        if text.trim().is_empty() {
            return Err(GenerationError::Other(format!(
                "empty candidate (finishReason: {})",
                finish_reason(&json).unwrap_or("unknown")
            )));
        }
        Ok(text)
    }

    /// `embedContent` call returning the raw embedding values.
    pub async fn embed_content(
        &self,
        text: &str,
        task: EmbedTask,
    ) -> Result<Vec<f32>, RetrievalError> {
        let body = json!({
            "model": format!("models/{}", self.embed_model),
            "content": { "parts": [{ "text": text }] },
            "taskType": task.as_api_str(),
        });
        let path = format!("models/{}:embedContent", self.embed_model);
        let (status, json) = self.request(&path, body).await?;
        if !status.is_success() {
            return Err(RetrievalError::Service {
                service: "gemini",
                status: status.as_u16(),
                message: api_error_message(&json),
            });
        }
        extract_embedding(&json).ok_or_else(|| RetrievalError::Malformed {
            service: "gemini",
            message: "missing embedding.values".to_string(),
        })
    }

    async fn request(&self, path: &str, body: Value) -> Result<(StatusCode, Value), reqwest::Error> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!("gemini POST {url}");
        let response = self
            .http_client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        let json: Value = serde_json::from_str(&text).unwrap_or_else(|_| json!({ "raw": text }));
        Ok((status, json))
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.generate_content(prompt).await
    }
}

/// Map a failed `generateContent` response onto an error kind.
///
/// HTTP 429 and the `RESOURCE_EXHAUSTED` API status both mean quota.
pub fn classify_generation_failure(status: StatusCode, body: &Value) -> GenerationError {
    let api_status = body
        .pointer("/error/status")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let message = api_error_message(body);
    if status == StatusCode::TOO_MANY_REQUESTS || api_status == "RESOURCE_EXHAUSTED" {
        GenerationError::RateLimited(message)
    } else {
        GenerationError::Other(format!("{status}: {message}"))
    }
}

/// Concatenate the text parts of the first candidate.
pub fn extract_candidate_text(response: &Value) -> String {
    let parts = response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("")
}

/// Pull `embedding.values` out of an `embedContent` response.
pub fn extract_embedding(response: &Value) -> Option<Vec<f32>> {
    response
        .pointer("/embedding/values")?
        .as_array()?
        .iter()
        .map(|v| v.as_f64().map(|f| f as f32))
        .collect()
}

fn finish_reason(response: &Value) -> Option<&str> {
    response
        .pointer("/candidates/0/finishReason")
        .and_then(Value::as_str)
}

fn api_error_message(body: &Value) -> String {
    body.pointer("/error/message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_429_is_rate_limited() {
        let body = json!({"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}});
        let err = classify_generation_failure(StatusCode::TOO_MANY_REQUESTS, &body);
        assert_eq!(err, GenerationError::RateLimited("Quota exceeded".to_string()));
    }

    #[test]
    fn resource_exhausted_status_is_rate_limited_regardless_of_code() {
        let body = json!({"error": {"message": "try later", "status": "RESOURCE_EXHAUSTED"}});
        let err = classify_generation_failure(StatusCode::SERVICE_UNAVAILABLE, &body);
        assert!(err.is_rate_limited());
    }

    #[test]
    fn quota_words_in_a_plain_error_do_not_count() {
        let body = json!({"error": {"message": "429 quota exhausted", "status": "INTERNAL"}});
        let err = classify_generation_failure(StatusCode::INTERNAL_SERVER_ERROR, &body);
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn candidate_parts_are_joined() {
        let response = json!({
            "candidates": [{
                "content": {"parts": [{"text": "I cannot accept "}, {"text": "that."}]},
                "finishReason": "STOP"
            }]
        });
        assert_eq!(extract_candidate_text(&response), "I cannot accept that.");
        assert_eq!(extract_candidate_text(&json!({})), "");
    }

    #[test]
    fn embedding_values_are_parsed() {
        let response = json!({"embedding": {"values": [0.5, -0.25, 1.0]}});
        assert_eq!(extract_embedding(&response), Some(vec![0.5, -0.25, 1.0]));
        assert_eq!(extract_embedding(&json!({"embedding": {}})), None);
    }

    #[test]
    fn client_requires_api_key() {
        let mut config = GeminiConfig {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta/".to_string(),
            llm_model: "gemini-2.5-flash-lite".to_string(),
            embed_model: "gemini-embedding-001".to_string(),
            request_timeout: std::time::Duration::from_secs(30),
        };
        assert!(GeminiClient::from_config(&config).is_none());
        config.api_key = Some("k".to_string());
        let client = GeminiClient::from_config(&config).unwrap();
        assert_eq!(client.base_url, "https://generativelanguage.googleapis.com/v1beta");
        assert_eq!(client.embed_model(), "gemini-embedding-001");
    }
}
