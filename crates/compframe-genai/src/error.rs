//! Generation service errors
//!
//! Every failure from the generation backend is classified into a structured
//! kind at the client boundary. Retry and fallback-model policy upstream
//! keys on the kind, never on message text.

use serde::{Deserialize, Serialize};

/// Classified failure kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Backend reported overload (e.g. HTTP 529)
    Overloaded,
    /// Backend rate-limited the caller (HTTP 429)
    RateLimited,
    /// Any other non-success API response
    Api,
    /// Transport-level failure (connect, TLS, stream interruption)
    Network,
    /// Response text yielded no parseable JSON value
    Parse,
    /// Response was well-formed but missing expected content
    InvalidResponse,
}

impl ErrorKind {
    /// Whether the failure indicates backend pressure, warranting a
    /// fallback model on retry
    #[inline]
    #[must_use]
    pub fn is_backpressure(&self) -> bool {
        matches!(self, Self::Overloaded | Self::RateLimited)
    }
}

/// Generation service error with its classified kind
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct GenerationError {
    pub kind: ErrorKind,
    pub message: String,
}

impl GenerationError {
    /// Create an error of the given kind
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Parse failure
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    /// Classify a non-success HTTP status into an error kind
    #[must_use]
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let kind = match status {
            529 => ErrorKind::Overloaded,
            429 => ErrorKind::RateLimited,
            _ => ErrorKind::Api,
        };
        Self::new(kind, format!("API error ({status}): {}", body.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(GenerationError::from_status(529, "x").kind, ErrorKind::Overloaded);
        assert_eq!(GenerationError::from_status(429, "x").kind, ErrorKind::RateLimited);
        assert_eq!(GenerationError::from_status(500, "x").kind, ErrorKind::Api);
    }

    #[test]
    fn backpressure_kinds_route_to_fallback() {
        assert!(ErrorKind::Overloaded.is_backpressure());
        assert!(ErrorKind::RateLimited.is_backpressure());
        assert!(!ErrorKind::Api.is_backpressure());
        assert!(!ErrorKind::Parse.is_backpressure());
    }

    #[test]
    fn error_display_names_kind() {
        let err = GenerationError::parse("no JSON found");
        assert!(err.to_string().contains("Parse"));
        assert!(err.to_string().contains("no JSON found"));
    }
}
