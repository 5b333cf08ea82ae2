//! Retrying HTTP transport.
//!
//! [`RetryTransport`] decorates any [`Transport`]: every logical request is
//! duplicated per attempt, classified by [`ErrorClassifier`], and retried with
//! Fibonacci backoff until it succeeds, fails terminally, or its deadline
//! passes. Callers see exactly the response or error the inner transport
//! produced for the last attempt.

pub mod api_error;
pub mod body;
pub mod config;
pub mod context;
pub mod headers;
pub mod logging;
pub mod request;
pub mod response;
pub mod retry;
pub mod transport;

pub use api_error::{ApiError, ErrorDetail};
pub use body::{Body, CloneError};
pub use config::TransportConfig;
pub use context::{Context, ContextError, Wait};
pub use headers::Headers;
pub use request::{Method, Request};
pub use response::Response;
pub use retry::{
    Classification, ErrorClassifier, Execution, ExitReason, Failure, RetryPredicate,
    RetryTransport,
};
pub use transport::{
    CurlTransport, DynTransport, Outcome, Transport, TransportError, TransportErrorKind,
};
