//! Streamed answer generation.
//!
//! A [`CompletionProvider`] turns an assembled prompt into an [`AnswerStream`]:
//! a lazy, finite, non-restartable sequence of text fragments in the exact
//! order the upstream service emits them. Dropping the stream releases the
//! underlying connection, which is how a disconnected caller cancels the
//! upstream call.

pub mod openai;
pub mod sse;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::config::GenerationConfig;
use crate::error::{Error, Result};

/// Text fragments of a generated answer.
///
/// A failure after streaming started is delivered as a single final
/// `Err(Error::MidStreamFailure)`; fragments already yielded stay delivered.
pub type AnswerStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Open a streamed completion for `prompt`.
    ///
    /// Fails before any fragment is produced with [`Error::InvalidInput`] or
    /// [`Error::UpstreamUnavailable`].
    async fn stream_answer(&self, prompt: &str, api_key: &str) -> Result<AnswerStream>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}

/// Create a completion provider from config.
///
/// Currently only `"openai"` (any OpenAI-compatible endpoint) is supported.
pub fn create_provider(config: &GenerationConfig) -> Result<Box<dyn CompletionProvider>> {
    match config.provider.as_str() {
        "openai" => {
            let provider = openai::OpenAiCompletionProvider::new(config)?;
            Ok(Box::new(provider))
        }
        other => Err(Error::invalid(format!(
            "unknown generation provider: {other}. Supported: openai"
        ))),
    }
}
