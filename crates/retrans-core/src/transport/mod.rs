//! The transport contract: execute one request, get a response or an error.
//!
//! Retrying transports implement the same trait as the transports they wrap,
//! so callers cannot tell them apart except by latency and success rate.

mod libcurl;
mod error;

pub use libcurl::{CurlOptions, CurlTransport};
pub use error::{TransportError, TransportErrorKind};

use crate::request::Request;
use crate::response::Response;
use std::sync::Arc;

/// What one execution of a request produced.
pub type Outcome = Result<Response, TransportError>;

/// Executes requests. Implementations must be safe to share between threads;
/// wrappers add no synchronization of their own.
pub trait Transport: Send + Sync {
    fn round_trip(&self, request: Request) -> Outcome;
}

pub type DynTransport = Arc<dyn Transport>;

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn round_trip(&self, request: Request) -> Outcome {
        (**self).round_trip(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn round_trip(&self, request: Request) -> Outcome {
        (**self).round_trip(request)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn round_trip(&self, request: Request) -> Outcome {
        (**self).round_trip(request)
    }
}
