//! Prompt assembly for answer generation.

use crate::retrieval::ScoredPassage;

/// Separator placed between passage contents.
pub const PASSAGE_SEPARATOR: &str = "\n\n";

/// Build the answer prompt from ranked passages, best first. Every passage's
/// content appears exactly once and in result order; nothing is truncated
/// beyond what the match count already bounds.
pub fn assemble_prompt(query: &str, results: &[ScoredPassage<'_>]) -> String {
    assemble_prompt_from_contents(query, results.iter().map(|r| r.passage.content.as_str()))
}

pub fn assemble_prompt_from_contents<'a>(
    query: &str,
    contents: impl IntoIterator<Item = &'a str>,
) -> String {
    let passages: Vec<&str> = contents.into_iter().collect();
    format!(
        "Use the following passages to provide an answer to the query: \"{}\"\n\n{}",
        query.trim(),
        passages.join(PASSAGE_SEPARATOR)
    )
}
