//! Query → embedding → ranked passages.
//!
//! [`RetrievalService`] owns the corpus for the life of the process and
//! orchestrates the embedding client and the [`scorer`].

pub mod scorer;

use std::sync::Arc;
use std::time::Instant;

use crate::corpus::Corpus;
use crate::embedding::EmbeddingProvider;
use crate::error::{Error, Result};

pub use scorer::{cosine_similarity, ScoredPassage};

/// Smallest number of passages a retrieval returns (corpus permitting).
pub const MIN_MATCHES: usize = 1;
/// Hard upper bound on passages per retrieval; keeps the assembled prompt bounded.
pub const MAX_MATCHES: usize = 10;

/// Ranked passages for one query, best first.
pub type RetrievalResult<'a> = Vec<ScoredPassage<'a>>;

/// Clamp a caller-requested match count to `[MIN_MATCHES, MAX_MATCHES]`.
pub fn clamp_matches(requested: i64) -> usize {
    requested.clamp(MIN_MATCHES as i64, MAX_MATCHES as i64) as usize
}

pub struct RetrievalService {
    corpus: Arc<Corpus>,
    embedding: Arc<dyn EmbeddingProvider>,
}

impl RetrievalService {
    pub fn new(corpus: Arc<Corpus>, embedding: Arc<dyn EmbeddingProvider>) -> Self {
        Self { corpus, embedding }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Return the best `k` passages for `query`, `k` clamped to `[1, 10]`.
    ///
    /// All-or-nothing: any failure yields an error and no partial result. The
    /// only suspension point is the embedding call.
    pub async fn retrieve(&self, query: &str, k: i64, api_key: &str) -> Result<RetrievalResult<'_>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::invalid("query must not be empty"));
        }
        let k = clamp_matches(k);
        let start = Instant::now();

        let query_embedding = self.embedding.embed(query, api_key).await?;

        if let Some(expected) = self.corpus.dimensions() {
            if query_embedding.len() != expected {
                tracing::error!(
                    expected,
                    actual = query_embedding.len(),
                    model = %self.embedding.model(),
                    "query embedding does not match corpus dimensionality"
                );
                return Err(Error::DimensionMismatch {
                    expected,
                    actual: query_embedding.len(),
                });
            }
        }

        let results = scorer::rank(&query_embedding, self.corpus.passages(), k);

        tracing::info!(
            k,
            returned = results.len(),
            top_score = results.first().map(|r| r.score).unwrap_or(0.0),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "retrieval complete"
        );

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_matches_bounds() {
        assert_eq!(clamp_matches(-3), 1);
        assert_eq!(clamp_matches(0), 1);
        assert_eq!(clamp_matches(1), 1);
        assert_eq!(clamp_matches(7), 7);
        assert_eq!(clamp_matches(10), 10);
        assert_eq!(clamp_matches(50), 10);
        assert_eq!(clamp_matches(i64::MAX), 10);
    }
}
