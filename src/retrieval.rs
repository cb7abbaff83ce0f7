//! Retrieval collaborator and the Gemini + Qdrant knowledge base behind it.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use crate::error::RetrievalError;
use crate::gemini::{EmbedTask, GeminiClient};
use crate::qdrant::{QdrantPoint, QdrantStore};
use crate::util::split_paragraphs;

/// Source of background text for a query.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Embed a query for similarity search.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError>;

    /// Snippets most similar to `vector`, most relevant first.
    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<String>, RetrievalError>;
}

/// Outcome of [`KnowledgeBase::check_dimension`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DimensionReport {
    pub model: String,
    pub expected: usize,
    pub actual: usize,
}

impl DimensionReport {
    pub fn matches(&self) -> bool {
        self.expected == self.actual
    }
}

/// Gemini embeddings over a Qdrant collection.
#[derive(Clone)]
pub struct KnowledgeBase {
    embedder: GeminiClient,
    store: QdrantStore,
}

impl KnowledgeBase {
    pub fn new(embedder: GeminiClient, store: QdrantStore) -> Self {
        Self { embedder, store }
    }

    pub fn store(&self) -> &QdrantStore {
        &self.store
    }

    /// Chunk `text` into paragraphs, embed each as a document, and upsert them.
    ///
    /// Returns the number of chunks stored.
    pub async fn ingest(&self, source: &str, text: &str) -> Result<usize, RetrievalError> {
        let chunks = split_paragraphs(text);
        if chunks.is_empty() {
            return Ok(0);
        }
        self.store.ensure_collection().await?;

        let mut points = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.iter().enumerate() {
            let vector = self
                .embedder
                .embed_content(chunk, EmbedTask::RetrievalDocument)
                .await?;
            self.check_len(vector.len())?;
            points.push(QdrantPoint {
                id: rand::random::<u64>(),
                vector,
                payload: json!({ "text": chunk, "source": source, "chunk": index }),
            });
            debug!(source, index, "embedded chunk");
        }
        self.store.upsert(&points).await?;
        info!(source, chunks = points.len(), "ingested document");
        Ok(points.len())
    }

    /// Embed a probe string and compare its length with the collection's vector size.
    pub async fn check_dimension(&self, probe: &str) -> Result<DimensionReport, RetrievalError> {
        let vector = self
            .embedder
            .embed_content(probe, EmbedTask::RetrievalQuery)
            .await?;
        Ok(DimensionReport {
            model: self.embedder.embed_model().to_string(),
            expected: self.store.vector_size(),
            actual: vector.len(),
        })
    }

    fn check_len(&self, actual: usize) -> Result<(), RetrievalError> {
        let expected = self.store.vector_size();
        if actual != expected {
            return Err(RetrievalError::DimensionMismatch { expected, actual });
        }
        Ok(())
    }
}

#[async_trait]
impl Retriever for KnowledgeBase {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let vector = self
            .embedder
            .embed_content(text, EmbedTask::RetrievalQuery)
            .await?;
        self.check_len(vector.len())?;
        Ok(vector)
    }

    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<String>, RetrievalError> {
        self.store.search(vector, top_k).await
    }
}

/// Retriever used when no knowledge base is configured.
#[derive(Clone, Debug)]
pub struct Unconfigured(pub String);

#[async_trait]
impl Retriever for Unconfigured {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, RetrievalError> {
        Err(RetrievalError::NotConfigured(self.0.clone()))
    }

    async fn search(&self, _vector: &[f32], _top_k: usize) -> Result<Vec<String>, RetrievalError> {
        Err(RetrievalError::NotConfigured(self.0.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_report_compares_sizes() {
        let report = DimensionReport {
            model: "gemini-embedding-001".to_string(),
            expected: 3072,
            actual: 768,
        };
        assert!(!report.matches());
        assert!(DimensionReport { actual: 3072, ..report }.matches());
    }

    #[tokio::test]
    async fn unconfigured_retriever_always_fails() {
        let retriever = Unconfigured("GEMINI_API_KEY not set".to_string());
        let err = retriever.embed("hello").await.unwrap_err();
        assert!(matches!(err, RetrievalError::NotConfigured(_)));
        assert!(retriever.search(&[0.1], 3).await.is_err());
    }
}
