//! Text-to-vector embedding client.
//!
//! Provides the [`EmbeddingProvider`] trait and an OpenAI-compatible HTTP
//! implementation. The provider is created via [`create_provider`] from
//! configuration.

pub mod openai;

use async_trait::async_trait;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};

/// Trait for embedding text into vectors.
///
/// Implementations fail with [`Error::InvalidInput`] for empty or oversize
/// text and with [`Error::UpstreamUnavailable`] when the service cannot
/// answer. Failures are never retried here.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a vector.
    async fn embed(&self, text: &str, api_key: &str) -> Result<Vec<f32>>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}

/// Create an embedding provider from config.
///
/// Currently only `"openai"` (any OpenAI-compatible endpoint) is supported.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "openai" => {
            let provider = openai::OpenAiEmbeddingProvider::new(config)?;
            Ok(Box::new(provider))
        }
        other => Err(Error::invalid(format!(
            "unknown embedding provider: {other}. Supported: openai"
        ))),
    }
}
