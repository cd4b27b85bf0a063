//! Shared plumbing for the OpenAI-compatible HTTP collaborators.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::Error;

/// Error envelope returned by OpenAI-compatible APIs.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Rough token estimate (4 characters per token, rounded up).
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Build a client with a connect timeout and a per-read idle timeout. No total
/// timeout is set so that long streamed bodies are not cut off.
pub(crate) fn build_client(timeout: Duration, service: &'static str) -> crate::error::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(timeout)
        .read_timeout(timeout)
        .build()
        .map_err(|e| Error::upstream(service, format!("failed to build HTTP client: {e}")))
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{path}", base_url.trim_end_matches('/'))
}

/// Map a non-success upstream reply to the error taxonomy. A 400 means the
/// service rejected our input; anything else means the service is unusable.
pub(crate) fn classify_failure(service: &'static str, status: StatusCode, body: &str) -> Error {
    let detail = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| match b.error.kind {
            Some(kind) => format!("{kind}: {}", b.error.message),
            None => b.error.message,
        })
        .unwrap_or_else(|_| body.trim().to_string());

    if status == StatusCode::BAD_REQUEST {
        Error::invalid(format!("{service} rejected input: {detail}"))
    } else {
        Error::upstream(service, format!("HTTP {status}: {detail}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        // counts characters, not bytes
        assert_eq!(estimate_tokens("éééé"), 1);
    }

    #[test]
    fn bad_request_is_invalid_input() {
        let body = r#"{"error": {"message": "too many tokens", "type": "invalid_request_error"}}"#;
        let err = classify_failure("embedding", StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, Error::InvalidInput(ref m) if m.contains("too many tokens")));
    }

    #[test]
    fn other_statuses_are_upstream_unavailable() {
        let err = classify_failure("completion", StatusCode::SERVICE_UNAVAILABLE, "overloaded");
        match err {
            Error::UpstreamUnavailable { service, reason } => {
                assert_eq!(service, "completion");
                assert!(reason.contains("503"));
                assert!(reason.contains("overloaded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        assert_eq!(endpoint("http://h/v1/", "embeddings"), "http://h/v1/embeddings");
        assert_eq!(endpoint("http://h/v1", "chat/completions"), "http://h/v1/chat/completions");
    }
}
