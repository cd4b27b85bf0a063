//! OpenAI-compatible embedding provider.
//!
//! Implements [`EmbeddingProvider`] against `POST {base_url}/embeddings`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::EmbeddingProvider;
use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use crate::upstream::{self, ApiErrorBody};

const SERVICE: &str = "embedding";

/// Async embeddings client that talks to OpenAI-compatible endpoints.
pub struct OpenAiEmbeddingProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    max_input_tokens: usize,
}

impl OpenAiEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        if config.model.trim().is_empty() {
            return Err(Error::invalid("missing embedding model name"));
        }
        let client = upstream::build_client(Duration::from_secs(config.timeout_secs.max(1)), SERVICE)?;

        Ok(Self {
            client,
            endpoint: upstream::endpoint(&config.base_url, "embeddings"),
            model: config.model.clone(),
            max_input_tokens: config.max_input_tokens,
        })
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

/// A 2xx body is not trusted blindly: it is either the expected payload or an
/// error envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmbeddingReply {
    Success(EmbeddingResponse),
    Failure(ApiErrorBody),
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed(&self, text: &str, api_key: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(Error::invalid("text to embed must not be empty"));
        }
        let estimated = upstream::estimate_tokens(text);
        if estimated > self.max_input_tokens {
            return Err(Error::invalid(format!(
                "text is ~{estimated} tokens, embedding model accepts at most {}",
                self.max_input_tokens
            )));
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key.trim())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::upstream(SERVICE, e))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::upstream(SERVICE, format!("error reading response: {e}")))?;
        if !status.is_success() {
            return Err(upstream::classify_failure(SERVICE, status, &body));
        }

        let reply: EmbeddingReply = serde_json::from_str(&body)
            .map_err(|e| Error::upstream(SERVICE, format!("malformed response: {e}")))?;
        match reply {
            EmbeddingReply::Success(mut parsed) => {
                parsed.data.sort_by_key(|entry| entry.index);
                parsed
                    .data
                    .into_iter()
                    .next()
                    .map(|entry| entry.embedding)
                    .filter(|embedding| !embedding.is_empty())
                    .ok_or_else(|| Error::upstream(SERVICE, "response contained no embedding"))
            }
            EmbeddingReply::Failure(failure) => Err(Error::upstream(SERVICE, failure.error.message)),
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}
