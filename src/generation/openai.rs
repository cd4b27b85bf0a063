//! OpenAI-compatible streaming chat-completions provider.

use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use super::sse::SseDecoder;
use super::{AnswerStream, CompletionProvider};
use crate::config::GenerationConfig;
use crate::error::{Error, Result};
use crate::upstream::{self, ApiErrorBody};

const SERVICE: &str = "completion";
const DONE_SENTINEL: &str = "[DONE]";

pub struct OpenAiCompletionProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    system_prompt: String,
    temperature: f32,
    max_tokens: usize,
    max_prompt_tokens: usize,
}

impl OpenAiCompletionProvider {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        if config.model.trim().is_empty() {
            return Err(Error::invalid("missing completion model name"));
        }
        let client = upstream::build_client(Duration::from_secs(config.timeout_secs.max(1)), SERVICE)?;

        Ok(Self {
            client,
            endpoint: upstream::endpoint(&config.base_url, "chat/completions"),
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_prompt_tokens: config.max_prompt_tokens,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: usize,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// One streamed event: a delta chunk or an error envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChunkReply {
    Chunk(ChatChunk),
    Failure(ApiErrorBody),
}

#[derive(Debug, PartialEq)]
enum StreamEvent {
    Fragment(String),
    Empty,
    Done,
}

fn parse_event(data: &str) -> Result<StreamEvent> {
    if data.trim() == DONE_SENTINEL {
        return Ok(StreamEvent::Done);
    }
    let reply: ChunkReply = serde_json::from_str(data)
        .map_err(|e| Error::MidStreamFailure(format!("unparseable event: {e}")))?;
    match reply {
        ChunkReply::Chunk(chunk) => {
            let text = chunk
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content)
                .unwrap_or_default();
            if text.is_empty() {
                Ok(StreamEvent::Empty)
            } else {
                Ok(StreamEvent::Fragment(text))
            }
        }
        ChunkReply::Failure(failure) => Err(Error::MidStreamFailure(failure.error.message)),
    }
}

struct StreamState<S> {
    body: Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    body_done: bool,
    finished: bool,
    fragments: usize,
}

impl<S> StreamState<S> {
    fn fail(mut self, err: Error) -> Option<(Result<String>, Self)> {
        tracing::warn!(fragments = self.fragments, error = %err, "answer stream terminated early");
        self.finished = true;
        Some((Err(err), self))
    }

    fn end(&mut self) {
        self.finished = true;
        tracing::debug!(fragments = self.fragments, "answer stream complete");
    }
}

/// Turn an SSE byte stream from a chat-completions endpoint into text
/// fragments. Generic over the byte source so it can be driven without a
/// network connection.
pub fn decode_answer_stream<S, B, E>(body: S) -> AnswerStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = StreamState {
        body: Box::pin(body),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        body_done: false,
        finished: false,
        fragments: 0,
    };

    let stream = futures::stream::unfold(state, |mut st| async move {
        loop {
            if st.finished {
                return None;
            }

            if let Some(data) = st.pending.pop_front() {
                match parse_event(&data) {
                    Ok(StreamEvent::Fragment(text)) => {
                        st.fragments += 1;
                        return Some((Ok(text), st));
                    }
                    Ok(StreamEvent::Empty) => continue,
                    Ok(StreamEvent::Done) => {
                        st.end();
                        return None;
                    }
                    Err(err) => return st.fail(err),
                }
            }

            if st.body_done {
                st.end();
                return None;
            }

            match st.body.next().await {
                Some(Ok(bytes)) => match st.decoder.push(bytes.as_ref()) {
                    Ok(events) => st.pending.extend(events),
                    Err(e) => return st.fail(Error::MidStreamFailure(format!("invalid UTF-8: {e}"))),
                },
                Some(Err(e)) => return st.fail(Error::MidStreamFailure(e.to_string())),
                None => {
                    st.body_done = true;
                    match st.decoder.finish() {
                        Ok(events) => st.pending.extend(events),
                        Err(e) => {
                            return st.fail(Error::MidStreamFailure(format!("invalid UTF-8: {e}")))
                        }
                    }
                }
            }
        }
    });

    Box::pin(stream)
}

#[async_trait]
impl CompletionProvider for OpenAiCompletionProvider {
    async fn stream_answer(&self, prompt: &str, api_key: &str) -> Result<AnswerStream> {
        if prompt.trim().is_empty() {
            return Err(Error::invalid("prompt must not be empty"));
        }
        let estimated = upstream::estimate_tokens(prompt);
        if estimated > self.max_prompt_tokens {
            return Err(Error::invalid(format!(
                "prompt is ~{estimated} tokens, limit is {}",
                self.max_prompt_tokens
            )));
        }

        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: true,
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
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(upstream::classify_failure(SERVICE, status, &body));
        }

        tracing::info!(model = %self.model, prompt_tokens = estimated, "answer stream opened");
        Ok(decode_answer_stream(resp.bytes_stream()))
    }

    fn model(&self) -> &str {
        &self.model
    }
}
