//! Transport error types

use std::fmt;
use thiserror::Error;

/// Transport error with classification
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
    /// HTTP status for `ServerError`
    pub status: Option<u16>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Timeout, message)
    }

    pub fn server_error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            ..Self::new(TransportErrorKind::ServerError, message)
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Protocol, message)
    }

    /// Whether a retry could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            TransportErrorKind::Network | TransportErrorKind::Timeout => true,
            TransportErrorKind::ServerError => {
                matches!(self.status, Some(429 | 500..=599) | None)
            }
            TransportErrorKind::Protocol => false,
        }
    }
}

/// Error classification. The session treats every kind the same way; the
/// kind exists for logging and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// Connection refused, reset, DNS failure
    Network,
    /// No reply within the configured timeout
    Timeout,
    /// Non-2xx response
    ServerError,
    /// Reply arrived but did not match the expected shape
    Protocol,
}

impl TransportErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::ServerError => "server_error",
            Self::Protocol => "protocol",
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
