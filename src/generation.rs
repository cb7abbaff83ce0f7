//! Generation collaborator: turns an assembled prompt into reply text.

use async_trait::async_trait;

use crate::error::GenerationError;

/// Anything that can produce an in-character reply for a prompt.
///
/// Implementations must report quota exhaustion as
/// [`GenerationError::RateLimited`] so the engine can pick the friendlier
/// user-facing message.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}
