//! Question answering over a static corpus of blog posts.
//!
//! `wreck` accepts a natural-language query, retrieves the most semantically
//! relevant passages by cosine similarity against precomputed embeddings, and
//! optionally streams an answer synthesized from those passages by a language
//! model.
//!
//! # Architecture
//!
//! - **Corpus**: passages with embeddings, loaded once from the ingestion job's
//!   JSON export and shared read-only
//! - **Embeddings**: OpenAI-compatible `/embeddings` endpoint, one call per query
//! - **Search**: exhaustive cosine similarity, stable top-K with K in `[1, 10]`
//! - **Answers**: OpenAI-compatible `/chat/completions` with `stream: true`,
//!   forwarded fragment by fragment
//! - **Transport**: HTTP via axum (`/api/search`, `/api/answer`)
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`corpus`]: Passage types and the corpus loader
//! - [`embedding`]: Query embedding client
//! - [`retrieval`]: Similarity scoring and the retrieval service
//! - [`context`]: Prompt assembly from retrieved passages
//! - [`generation`]: Streamed answer generation
//! - [`server`]: HTTP handlers
//! - [`lightning`]: Lightning-address tipping
//! - [`error`]: Error taxonomy

pub mod config;
pub mod context;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod lightning;
pub mod retrieval;
pub mod server;
mod upstream;
