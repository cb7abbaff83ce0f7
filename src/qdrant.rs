//! Qdrant REST client — collection bootstrap, upserts, and similarity queries.

use reqwest::{Client as HttpClient, Method};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::config::QdrantConfig;
use crate::error::RetrievalError;

/// A point to upsert.
#[derive(Clone, Debug, Serialize)]
pub struct QdrantPoint {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: Value,
}

/// Handle on one Qdrant collection.
#[derive(Clone)]
pub struct QdrantStore {
    base_url: String,
    api_key: Option<String>,
    collection: String,
    vector_size: usize,
    http_client: HttpClient,
}

impl QdrantStore {
    pub fn new(config: &QdrantConfig) -> Self {
        let http_client = HttpClient::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|_| HttpClient::new());
        QdrantStore {
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            collection: config.collection.clone(),
            vector_size: config.vector_size,
            http_client,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn url(&self) -> &str {
        &self.base_url
    }

    pub fn vector_size(&self) -> usize {
        self.vector_size
    }

    pub async fn exists(&self) -> Result<bool, RetrievalError> {
        let path = format!("collections/{}/exists", self.collection);
        let json = self.request(Method::GET, &path, None).await?;
        Ok(json
            .pointer("/result/exists")
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    /// Create the collection (cosine distance) when it is missing.
    pub async fn ensure_collection(&self) -> Result<(), RetrievalError> {
        if self.exists().await? {
            return Ok(());
        }
        let path = format!("collections/{}", self.collection);
        let body = json!({ "vectors": { "size": self.vector_size, "distance": "Cosine" } });
        self.request(Method::PUT, &path, Some(body)).await?;
        info!(collection = %self.collection, size = self.vector_size, "created collection");
        Ok(())
    }

    pub async fn upsert(&self, points: &[QdrantPoint]) -> Result<(), RetrievalError> {
        let path = format!("collections/{}/points?wait=true", self.collection);
        self.request(Method::PUT, &path, Some(json!({ "points": points })))
            .await?;
        Ok(())
    }

    /// Payload `text` of the `top_k` nearest points, best match first.
    pub async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<String>, RetrievalError> {
        let path = format!("collections/{}/points/query", self.collection);
        let body = json!({ "query": vector, "limit": top_k, "with_payload": true });
        let json = self.request(Method::POST, &path, Some(body)).await?;
        extract_point_texts(&json)
    }

    pub async fn clear_collection(&self) -> Result<(), RetrievalError> {
        let path = format!("collections/{}", self.collection);
        self.request(Method::DELETE, &path, None).await?;
        info!(collection = %self.collection, "deleted collection");
        Ok(())
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, RetrievalError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!("qdrant {method} {url}");
        let mut builder = self.http_client.request(method, url);
        if let Some(key) = &self.api_key {
            builder = builder.header("api-key", key);
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let json: Value = serde_json::from_str(&text).unwrap_or_else(|_| json!({ "raw": text }));
        if !status.is_success() {
            let message = json
                .pointer("/status/error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| json.to_string());
            return Err(RetrievalError::Service {
                service: "qdrant",
                status: status.as_u16(),
                message,
            });
        }
        Ok(json)
    }
}

/// Collect non-empty payload `text` fields from a `points/query` response.
///
/// A body without `result.points` is malformed, not an empty result.
pub fn extract_point_texts(response: &Value) -> Result<Vec<String>, RetrievalError> {
    let points = response
        .pointer("/result/points")
        .and_then(Value::as_array)
        .ok_or_else(|| RetrievalError::Malformed {
            service: "qdrant",
            message: "missing result.points".to_string(),
        })?;
    Ok(points
        .iter()
        .filter_map(|p| p.pointer("/payload/text").and_then(Value::as_str))
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .collect())
}
