//! HTTP boundary: `POST /api/search`, `POST /api/answer`, `GET /healthz`.
//!
//! Provides [`router`] for building the axum app over shared state and
//! [`serve`] which wires the corpus, embedding client, and completion client
//! into a running server.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::config::WreckConfig;
use crate::corpus::types::{Passage, PostType};
use crate::corpus::Corpus;
use crate::embedding;
use crate::error::Error;
use crate::generation::{self, CompletionProvider};
use crate::retrieval::{RetrievalService, ScoredPassage};

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub retrieval: Arc<RetrievalService>,
    pub completion: Arc<dyn CompletionProvider>,
    pub default_matches: i64,
    /// Used when a request carries no `apiKey`.
    pub fallback_api_key: Option<Arc<str>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default, deserialize_with = "saturating_matches")]
    pub matches: Option<i64>,
    #[serde(default)]
    pub include_embeddings: bool,
}

/// Any JSON integer is a valid match count; values past `i64::MAX` saturate
/// and are clamped like every other out-of-range count.
fn saturating_matches<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Some(n) = number.as_i64() {
        Ok(Some(n))
    } else if number.is_u64() {
        Ok(Some(i64::MAX))
    } else {
        Err(serde::de::Error::custom(format!(
            "matches must be an integer, got {number}"
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub prompt: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// One passage in a search response.
#[derive(Debug, Serialize)]
pub struct PassageRecord<'a> {
    pub post_title: &'a str,
    pub post_url: &'a str,
    pub post_date: Option<&'a str>,
    pub post_type: PostType,
    pub content: &'a str,
    pub content_length: usize,
    pub content_tokens: usize,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<&'a [f32]>,
}

impl<'a> PassageRecord<'a> {
    fn from_scored(scored: &ScoredPassage<'a>, include_embedding: bool) -> Self {
        let p: &'a Passage = scored.passage;
        Self {
            post_title: &p.post_title,
            post_url: &p.post_url,
            post_date: p.post_date.as_deref(),
            post_type: p.post_type,
            content: &p.content,
            content_length: p.content_length,
            content_tokens: p.content_tokens,
            score: scored.score,
            embedding: include_embedding.then_some(p.embedding.as_slice()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    passages: usize,
    dimensions: Option<usize>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::info!(error = %self, "request rejected");
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/search", post(search_handler))
        .route("/api/answer", post(answer_handler))
        .with_state(state)
}

impl AppState {
    fn resolve_api_key(&self, supplied: Option<&str>) -> Result<String, Error> {
        supplied
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .or_else(|| self.fallback_api_key.as_deref().map(str::to_string))
            .ok_or_else(|| Error::invalid("missing API key"))
    }
}

fn request_span(route: &'static str) -> tracing::Span {
    tracing::info_span!("request", id = %uuid::Uuid::now_v7(), route)
}

async fn healthz(State(state): State<AppState>) -> Json<HealthBody> {
    let corpus = state.retrieval.corpus();
    Json(HealthBody {
        status: "ok",
        passages: corpus.len(),
        dimensions: corpus.dimensions(),
    })
}

async fn search_handler(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Response, Error> {
    async move {
        let Json(request) = payload.map_err(|e| Error::invalid(e.body_text()))?;
        let api_key = state.resolve_api_key(request.api_key.as_deref())?;
        let matches = request.matches.unwrap_or(state.default_matches);

        tracing::info!(query_len = request.query.len(), matches, "search");

        let results = state
            .retrieval
            .retrieve(&request.query, matches, &api_key)
            .await?;
        let records: Vec<PassageRecord<'_>> = results
            .iter()
            .map(|r| PassageRecord::from_scored(r, request.include_embeddings))
            .collect();

        Ok(Json(records).into_response())
    }
    .instrument(request_span("search"))
    .await
}

async fn answer_handler(
    State(state): State<AppState>,
    payload: Result<Json<AnswerRequest>, JsonRejection>,
) -> Result<Response, Error> {
    let span = request_span("answer");
    let stream = async {
        let Json(request) = payload.map_err(|e| Error::invalid(e.body_text()))?;
        let api_key = state.resolve_api_key(request.api_key.as_deref())?;

        tracing::info!(
            prompt_len = request.prompt.len(),
            model = %state.completion.model(),
            "answer"
        );
        state.completion.stream_answer(&request.prompt, &api_key).await
    }
    .instrument(span.clone())
    .await?;

    // A mid-stream failure ends the body cleanly after the fragments already
    // sent; it is logged, not encoded into the response.
    let body = stream
        .take_while(move |item| {
            if let Err(err) = item {
                span.in_scope(|| tracing::warn!(error = %err, "answer truncated"));
            }
            futures::future::ready(item.is_ok())
        })
        .map(|item| item.map(axum::body::Bytes::from));

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(body),
    )
        .into_response())
}

/// Load the corpus and build shared state from config.
pub fn build_state(config: &WreckConfig) -> Result<AppState> {
    let corpus_path = config.resolved_corpus_path();
    let corpus = Arc::new(
        Corpus::load(&corpus_path)
            .with_context(|| format!("failed to load corpus from {}", corpus_path.display()))?,
    );

    let embedding: Arc<dyn embedding::EmbeddingProvider> =
        Arc::from(embedding::create_provider(&config.embedding)?);
    tracing::info!(model = %embedding.model(), "embedding provider ready");

    let completion: Arc<dyn CompletionProvider> =
        Arc::from(generation::create_provider(&config.generation)?);
    tracing::info!(model = %completion.model(), "completion provider ready");

    if config.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY not set; requests must supply apiKey");
    }

    Ok(AppState {
        retrieval: Arc::new(RetrievalService::new(corpus, embedding)),
        completion,
        default_matches: config.retrieval.default_matches,
        fallback_api_key: config.api_key.as_deref().map(Arc::from),
    })
}

/// Start the HTTP server and run until ctrl-c.
pub async fn serve(config: WreckConfig) -> Result<()> {
    let bind_addr = config.bind_addr();
    let state = build_state(&config)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "wreck listening at http://{bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down HTTP server");
        })
        .await
        .context("server error")?;

    Ok(())
}
