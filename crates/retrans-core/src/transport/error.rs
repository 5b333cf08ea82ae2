//! Transport-level failures (no HTTP response was obtained).

use crate::context::ContextError;
use std::fmt;

/// Coarse failure category, used by retry predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// Operation timed out (connect/read/overall).
    Timeout,
    /// TCP connect failed.
    Connect,
    /// Host or proxy name could not be resolved.
    Resolve,
    /// Connection dropped while sending or receiving.
    ConnectionReset,
    /// Peer closed the connection before a complete response.
    UnexpectedEof,
    /// Request context was canceled.
    Canceled,
    /// The request itself is malformed (bad URL, unsupported scheme).
    InvalidRequest,
    /// Reading the request body failed.
    Body,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Resolve => "resolve",
            TransportErrorKind::ConnectionReset => "connection reset",
            TransportErrorKind::UnexpectedEof => "unexpected eof",
            TransportErrorKind::Canceled => "canceled",
            TransportErrorKind::InvalidRequest => "invalid request",
            TransportErrorKind::Body => "request body",
            TransportErrorKind::Other => "transport",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ContextError> for TransportError {
    fn from(err: ContextError) -> Self {
        let kind = match err {
            ContextError::Canceled => TransportErrorKind::Canceled,
            ContextError::DeadlineExceeded => TransportErrorKind::Timeout,
        };
        TransportError::new(kind, err.to_string())
    }
}
