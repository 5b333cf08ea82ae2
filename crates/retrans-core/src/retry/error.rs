//! The error signal a retry decision is made on.

use crate::api_error::ApiError;
use crate::transport::{TransportError, TransportErrorKind};

/// Primary error signal of one attempt: a transport error, an application
/// error embedded in the response, or a response that could not be inspected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Failure {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Reading the response body for inspection failed.
    #[error("unable to check response for error: {0}")]
    BodySnapshot(String),
}

impl Failure {
    pub fn transport_kind(&self) -> Option<TransportErrorKind> {
        match self {
            Failure::Transport(e) => Some(e.kind()),
            _ => None,
        }
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Failure::Api(e) => Some(e),
            _ => None,
        }
    }

    /// Application error code, if this is an application error.
    pub fn code(&self) -> Option<u16> {
        self.api_error().map(|e| e.code)
    }
}
