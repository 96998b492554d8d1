use async_trait::async_trait;

use crate::error::Result;

/// An opaque text-completion model: one prompt in, one text answer out.
///
/// Implementations do not retry; the caller sees the first failure.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}
