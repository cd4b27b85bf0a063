pub mod ask;
pub mod search;
pub mod stats;
pub mod tip;

use std::sync::Arc;

use anyhow::{Context, Result};

use wreck::config::WreckConfig;
use wreck::corpus::Corpus;
use wreck::embedding;
use wreck::retrieval::RetrievalService;

/// Load the configured corpus.
pub fn load_corpus(config: &WreckConfig) -> Result<Corpus> {
    let path = config.resolved_corpus_path();
    Corpus::load(&path).with_context(|| format!("failed to load corpus from {}", path.display()))
}

/// Build a retrieval service over the configured corpus and embedding provider.
pub fn open_retrieval(config: &WreckConfig) -> Result<RetrievalService> {
    let corpus = Arc::new(load_corpus(config)?);
    let provider: Arc<dyn embedding::EmbeddingProvider> =
        Arc::from(embedding::create_provider(&config.embedding)?);
    Ok(RetrievalService::new(corpus, provider))
}

pub fn require_api_key(config: &WreckConfig) -> Result<&str> {
    config
        .api_key
        .as_deref()
        .context("OPENAI_API_KEY must be set for search and ask")
}

/// First `max_chars` characters of `text` on one line, with an ellipsis if cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > max_chars {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{cut}...")
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_flattens_and_truncates_on_char_boundaries() {
        assert_eq!(preview("short\n\ntext", 20), "short text");
        assert_eq!(preview("ééééé", 3), "ééé...");
    }
}
