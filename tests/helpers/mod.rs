#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use wreck::corpus::types::{Passage, PostType};
use wreck::corpus::Corpus;
use wreck::embedding::EmbeddingProvider;
use wreck::error::{Error, Result};
use wreck::generation::{AnswerStream, CompletionProvider};
use wreck::retrieval::RetrievalService;
use wreck::server::{self, AppState};

/// Build a passage whose title and URL derive from `content`.
pub fn passage(content: &str, embedding: Vec<f32>) -> Passage {
    Passage {
        post_title: format!("Post {content}"),
        post_url: format!("https://waitbutwhy.com/{content}"),
        post_date: Some("January 2015".into()),
        post_type: PostType::Post,
        content: content.to_string(),
        content_length: content.chars().count(),
        content_tokens: content.split_whitespace().count(),
        embedding,
    }
}

/// The three-passage corpus: A = [1,0], B = [0,1], C = [0.7,0.7].
pub fn abc_corpus() -> Arc<Corpus> {
    Arc::new(
        Corpus::new(vec![
            passage("A", vec![1.0, 0.0]),
            passage("B", vec![0.0, 1.0]),
            passage("C", vec![0.7, 0.7]),
        ])
        .unwrap(),
    )
}

/// `n` two-dimensional passages `p0..pn` fanned out over a quarter circle.
pub fn fan_corpus(n: usize) -> Arc<Corpus> {
    let passages = (0..n)
        .map(|i| {
            let angle = std::f32::consts::FRAC_PI_2 * i as f32 / n as f32;
            passage(&format!("p{i}"), vec![angle.cos(), angle.sin()])
        })
        .collect();
    Arc::new(Corpus::new(passages).unwrap())
}

/// Embedding stub: fixed vectors per text, a fallback, or a forced failure.
#[derive(Default)]
pub struct StubEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    fallback: Option<Vec<f32>>,
    fail: bool,
    calls: AtomicUsize,
    keys: Mutex<Vec<String>>,
}

impl StubEmbedder {
    /// Every text embeds to `vector`.
    pub fn constant(vector: Vec<f32>) -> Arc<Self> {
        Arc::new(Self {
            fallback: Some(vector),
            ..Self::default()
        })
    }

    pub fn with_vectors(pairs: &[(&str, Vec<f32>)]) -> Arc<Self> {
        Arc::new(Self {
            vectors: pairs
                .iter()
                .map(|(text, v)| (text.to_string(), v.clone()))
                .collect(),
            ..Self::default()
        })
    }

    /// Every call fails as if the network were down.
    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn keys_seen(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed(&self, text: &str, api_key: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.keys.lock().unwrap().push(api_key.to_string());
        if self.fail {
            return Err(Error::upstream("embedding", "connection refused"));
        }
        self.vectors
            .get(text)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| Error::upstream("embedding", format!("no stub vector for {text:?}")))
    }

    fn model(&self) -> &str {
        "stub-embedding"
    }
}

/// Completion stub yielding fixed fragments, optionally failing after `fail_after`.
#[derive(Default)]
pub struct StubCompletion {
    fragments: Vec<String>,
    fail_after: Option<usize>,
    refuse: bool,
    prompts: Mutex<Vec<String>>,
}

impl StubCompletion {
    pub fn fragments(fragments: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            ..Self::default()
        })
    }

    pub fn failing_after(fragments: &[&str], fail_after: usize) -> Arc<Self> {
        Arc::new(Self {
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            fail_after: Some(fail_after),
            ..Self::default()
        })
    }

    /// The initial call fails.
    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            refuse: true,
            ..Self::default()
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for StubCompletion {
    async fn stream_answer(&self, prompt: &str, _api_key: &str) -> Result<AnswerStream> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.refuse {
            return Err(Error::upstream("completion", "HTTP 503: overloaded"));
        }
        let mut items: Vec<Result<String>> = Vec::new();
        for (i, fragment) in self.fragments.iter().enumerate() {
            if self.fail_after == Some(i) {
                items.push(Err(Error::MidStreamFailure("connection reset".into())));
                break;
            }
            items.push(Ok(fragment.clone()));
        }
        Ok(Box::pin(futures::stream::iter(items)))
    }

    fn model(&self) -> &str {
        "stub-completion"
    }
}

pub fn app_state(
    corpus: Arc<Corpus>,
    embedder: Arc<dyn EmbeddingProvider>,
    completion: Arc<dyn CompletionProvider>,
    fallback_api_key: Option<&str>,
) -> AppState {
    AppState {
        retrieval: Arc::new(RetrievalService::new(corpus, embedder)),
        completion,
        default_matches: 5,
        fallback_api_key: fallback_api_key.map(Arc::from),
    }
}

/// Serve `router` on an ephemeral local port; returns the base URL.
pub async fn spawn_router(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

pub async fn spawn_app(state: AppState) -> String {
    spawn_router(server::router(state)).await
}
