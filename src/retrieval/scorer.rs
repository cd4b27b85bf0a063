//! Exhaustive cosine-similarity scoring over the corpus.
//!
//! Every query is scored against every passage (O(N·D)). That is the one real
//! scaling limit of the system; a corpus beyond a few hundred thousand passages
//! would need an approximate nearest-neighbour index instead.

use crate::corpus::types::Passage;

/// A passage paired with its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPassage<'a> {
    pub passage: &'a Passage,
    pub score: f32,
}

/// Cosine similarity in `[-1, 1]`. Defined as `0` when either vector has zero
/// norm so a degenerate embedding can never poison the ranking with `NaN`.
///
/// Accumulates in `f64`; squared `f32` components cannot overflow there.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "cosine_similarity on unequal dimensions");

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    if score.is_nan() {
        0.0
    } else {
        score.clamp(-1.0, 1.0) as f32
    }
}

/// Score every passage against `query`, order by descending score and keep
/// the first `k`. Ties keep corpus order (`sort_by` is stable).
pub fn rank<'a>(query: &[f32], passages: &'a [Passage], k: usize) -> Vec<ScoredPassage<'a>> {
    let mut scored: Vec<ScoredPassage<'a>> = passages
        .iter()
        .map(|passage| ScoredPassage {
            passage,
            score: cosine_similarity(query, &passage.embedding),
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(k);
    scored
}
