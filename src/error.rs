//! Error taxonomy shared by the retrieval and generation pipeline.
//!
//! The embedding and completion clients are the only components that fail for
//! reasons outside local control; everything they return propagates unchanged
//! up to the request handlers, which map it onto an HTTP status via
//! [`Error::status_code`].

use axum::http::StatusCode;
use thiserror::Error;

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the retrieval and answer pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller supplied something unusable: empty query, malformed match
    /// count, oversize prompt, or a missing credential.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An external service (embedding, completion, lightning) could not be
    /// reached or answered with a failure status.
    #[error("{service} unavailable: {reason}")]
    UpstreamUnavailable {
        /// Which collaborator failed.
        service: &'static str,
        /// Transport error or upstream status/body.
        reason: String,
    },

    /// The completion stream broke after fragments were already delivered.
    #[error("answer stream interrupted: {0}")]
    MidStreamFailure(String),

    /// A query vector and the corpus disagree on dimensionality.
    #[error("embedding dimension mismatch: corpus has {expected}, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The corpus file could not be read or violates an invariant.
    #[error("corpus error: {0}")]
    Corpus(String),
}

impl Error {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn upstream(service: &'static str, reason: impl ToString) -> Self {
        Self::UpstreamUnavailable {
            service,
            reason: reason.to_string(),
        }
    }

    /// HTTP status returned to the caller when this error ends a request.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::UpstreamUnavailable { .. } | Self::MidStreamFailure(_) => StatusCode::BAD_GATEWAY,
            Self::DimensionMismatch { .. } | Self::Corpus(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(Error::invalid("empty").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::upstream("embedding", "connection refused").status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            Error::DimensionMismatch {
                expected: 3,
                actual: 2
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn upstream_display_names_the_service() {
        let err = Error::upstream("completion", "HTTP 503");
        assert_eq!(err.to_string(), "completion unavailable: HTTP 503");
    }
}
