//! Passage and corpus-file type definitions.
//!
//! Defines [`PostType`] (the two kinds of source post), [`Passage`] (one
//! embedded chunk of a post), and the on-disk export shapes
//! [`CorpusDocument`] / [`Post`] produced by the ingestion job.

use serde::{Deserialize, Serialize};

/// The kind of post a passage was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostType {
    /// A full-length article.
    Post,
    /// A short-form "mini" post.
    Mini,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Mini => "mini",
        }
    }
}

impl std::fmt::Display for PostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chunk of a source post together with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub post_title: String,
    pub post_url: String,
    /// Publication date as written by the ingestion job; absent for undated posts.
    #[serde(default)]
    pub post_date: Option<String>,
    pub post_type: PostType,
    pub content: String,
    /// Character count of `content`.
    pub content_length: usize,
    /// Token count of `content` under the embedding model's tokenizer.
    pub content_tokens: usize,
    pub embedding: Vec<f32>,
}

/// One post of the export document. Only `chunks` feed the corpus; the post
/// itself is only counted.
#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(rename = "type")]
    pub post_type: PostType,
    #[serde(default)]
    pub length: usize,
    #[serde(default)]
    pub tokens: usize,
    pub chunks: Vec<Passage>,
}

/// The full export written by the ingestion job.
#[derive(Debug, Clone, Deserialize)]
pub struct CorpusDocument {
    #[serde(default)]
    pub current_date: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    pub posts: Vec<Post>,
}

/// Accepted corpus file shapes: the full export, or a bare passage array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CorpusFile {
    Document(CorpusDocument),
    Passages(Vec<Passage>),
}
