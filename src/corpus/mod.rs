//! The static passage corpus.
//!
//! A [`Corpus`] is loaded once at startup from the ingestion job's JSON export,
//! validated, and then shared read-only (behind an `Arc`) for the life of the
//! process.

pub mod types;

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use types::{CorpusFile, Passage, PostType};

/// Immutable, validated collection of embedded passages.
#[derive(Debug, Clone)]
pub struct Corpus {
    passages: Vec<Passage>,
    dimensions: Option<usize>,
    author: Option<String>,
    /// Post count from the export document; bare passage arrays carry none.
    post_count: Option<usize>,
}

/// Summary counts reported by `wreck stats` and `/healthz`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusStats {
    pub posts: usize,
    pub passages: usize,
    pub dimensions: Option<usize>,
    pub by_type: BTreeMap<String, usize>,
    pub total_tokens: usize,
    pub total_characters: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Corpus {
    /// Build a corpus, checking that every passage carries an embedding of the
    /// same dimensionality.
    pub fn new(passages: Vec<Passage>) -> Result<Self> {
        let mut dimensions = None;
        for (idx, passage) in passages.iter().enumerate() {
            let len = passage.embedding.len();
            if len == 0 {
                return Err(Error::Corpus(format!(
                    "passage {idx} ({}) has an empty embedding",
                    passage.post_title
                )));
            }
            match dimensions {
                None => dimensions = Some(len),
                Some(expected) if expected != len => {
                    return Err(Error::Corpus(format!(
                        "passage {idx} ({}) has {len} dimensions, expected {expected}",
                        passage.post_title
                    )));
                }
                Some(_) => {}
            }
        }

        Ok(Self {
            passages,
            dimensions,
            author: None,
            post_count: None,
        })
    }

    /// Parse either the full export document or a bare passage array.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: CorpusFile = serde_json::from_str(json)
            .map_err(|e| Error::Corpus(format!("failed to parse corpus JSON: {e}")))?;

        match file {
            CorpusFile::Document(doc) => {
                let author = doc.author;
                let post_count = doc.posts.len();
                let passages = doc.posts.into_iter().flat_map(|p| p.chunks).collect();
                let mut corpus = Self::new(passages)?;
                corpus.author = author;
                corpus.post_count = Some(post_count);
                Ok(corpus)
            }
            CorpusFile::Passages(passages) => Self::new(passages),
        }
    }

    /// Read and validate a corpus file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Corpus(format!("failed to read {}: {e}", path.display())))?;
        let corpus = Self::from_json_str(&contents)?;

        tracing::info!(
            path = %path.display(),
            passages = corpus.len(),
            dimensions = corpus.dimensions().unwrap_or(0),
            "corpus loaded"
        );
        Ok(corpus)
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Embedding dimensionality shared by every passage; `None` for an empty corpus.
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    pub fn stats(&self) -> CorpusStats {
        let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
        for kind in [PostType::Post, PostType::Mini] {
            by_type.insert(kind.as_str().to_string(), 0);
        }
        let mut urls = std::collections::HashSet::new();
        let mut total_tokens = 0;
        let mut total_characters = 0;

        for passage in &self.passages {
            *by_type.entry(passage.post_type.as_str().to_string()).or_default() += 1;
            urls.insert(passage.post_url.as_str());
            total_tokens += passage.content_tokens;
            total_characters += passage.content_length;
        }

        CorpusStats {
            posts: self.post_count.unwrap_or(urls.len()),
            passages: self.passages.len(),
            dimensions: self.dimensions,
            by_type,
            total_tokens,
            total_characters,
            author: self.author.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(title: &str, url: &str, post_type: PostType, embedding: Vec<f32>) -> Passage {
        let content = format!("{title} body");
        Passage {
            post_title: title.into(),
            post_url: url.into(),
            post_date: None,
            post_type,
            content_length: content.chars().count(),
            content_tokens: 3,
            content,
            embedding,
        }
    }

    #[test]
    fn rejects_mixed_dimensions() {
        let err = Corpus::new(vec![
            passage("a", "u1", PostType::Post, vec![1.0, 0.0]),
            passage("b", "u2", PostType::Post, vec![1.0, 0.0, 0.0]),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Corpus(_)));
        assert!(err.to_string().contains("expected 2"));
    }

    #[test]
    fn rejects_empty_embedding() {
        let err = Corpus::new(vec![passage("a", "u1", PostType::Post, vec![])]).unwrap_err();
        assert!(err.to_string().contains("empty embedding"));
    }

    #[test]
    fn empty_corpus_has_no_dimensions() {
        let corpus = Corpus::new(Vec::new()).unwrap();
        assert!(corpus.is_empty());
        assert_eq!(corpus.dimensions(), None);
    }

    #[test]
    fn parses_export_document_in_post_order() {
        let json = r#"{
            "current_date": "2023-03-20",
            "author": "Tim Urban",
            "url": "https://waitbutwhy.com",
            "length": 10,
            "tokens": 4,
            "posts": [
                {
                    "title": "First", "url": "https://x/1", "date": "Jan 2015", "type": "post",
                    "content": "...", "length": 5, "tokens": 2,
                    "chunks": [
                        {"post_title": "First", "post_url": "https://x/1", "post_date": "Jan 2015",
                         "post_type": "post", "content": "one", "content_length": 3,
                         "content_tokens": 1, "embedding": [1.0, 0.0]},
                        {"post_title": "First", "post_url": "https://x/1", "post_date": "Jan 2015",
                         "post_type": "post", "content": "two", "content_length": 3,
                         "content_tokens": 1, "embedding": [0.0, 1.0]}
                    ]
                },
                {
                    "title": "Mini", "url": "https://x/2", "type": "mini",
                    "chunks": [
                        {"post_title": "Mini", "post_url": "https://x/2",
                         "post_type": "mini", "content": "three", "content_length": 5,
                         "content_tokens": 2, "embedding": [0.5, 0.5]}
                    ]
                }
            ]
        }"#;

        let corpus = Corpus::from_json_str(json).unwrap();
        let contents: Vec<&str> = corpus.passages().iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
        assert_eq!(corpus.dimensions(), Some(2));
        assert_eq!(corpus.passages()[2].post_date, None);

        let stats = corpus.stats();
        assert_eq!(stats.posts, 2);
        assert_eq!(stats.passages, 3);
        assert_eq!(stats.by_type["post"], 2);
        assert_eq!(stats.by_type["mini"], 1);
        assert_eq!(stats.total_tokens, 4);
        assert_eq!(stats.author.as_deref(), Some("Tim Urban"));
    }

    #[test]
    fn posts_without_chunks_still_count() {
        let json = r#"{
            "author": "Tim Urban",
            "posts": [
                {"title": "Empty", "url": "https://x/0", "type": "mini", "chunks": []},
                {"title": "Full", "url": "https://x/1", "type": "post", "chunks": [
                    {"post_title": "Full", "post_url": "https://x/1", "post_type": "post",
                     "content": "only", "content_length": 4, "content_tokens": 1,
                     "embedding": [1.0, 0.0]}
                ]}
            ]
        }"#;

        let stats = Corpus::from_json_str(json).unwrap().stats();
        assert_eq!(stats.posts, 2);
        assert_eq!(stats.passages, 1);
        assert_eq!(stats.by_type["mini"], 0);
    }

    #[test]
    fn bare_array_counts_distinct_urls_as_posts() {
        let corpus = Corpus::new(vec![
            passage("a", "https://x/1", PostType::Post, vec![1.0]),
            passage("a", "https://x/1", PostType::Post, vec![0.5]),
            passage("b", "https://x/2", PostType::Mini, vec![0.2]),
        ])
        .unwrap();
        assert_eq!(corpus.stats().posts, 2);
    }

    #[test]
    fn parses_bare_passage_array() {
        let json = r#"[
            {"post_title": "T", "post_url": "u", "post_date": null, "post_type": "mini",
             "content": "c", "content_length": 1, "content_tokens": 1, "embedding": [0.1, 0.2, 0.3]}
        ]"#;
        let corpus = Corpus::from_json_str(json).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.passages()[0].post_type, PostType::Mini);
    }

    #[test]
    fn unknown_post_type_is_rejected() {
        let json = r#"[
            {"post_title": "T", "post_url": "u", "post_type": "essay",
             "content": "c", "content_length": 1, "content_tokens": 1, "embedding": [0.1]}
        ]"#;
        assert!(matches!(Corpus::from_json_str(json), Err(Error::Corpus(_))));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("corpus.json");
        std::fs::write(
            &path,
            r#"[{"post_title": "T", "post_url": "u", "post_type": "post",
                 "content": "c", "content_length": 1, "content_tokens": 1, "embedding": [1.0]}]"#,
        )
        .unwrap();
        let corpus = Corpus::load(&path).unwrap();
        assert_eq!(corpus.len(), 1);

        let missing = Corpus::load(tmp.path().join("nope.json")).unwrap_err();
        assert!(missing.to_string().contains("failed to read"));
    }
}
