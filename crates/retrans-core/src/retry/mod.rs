//! Retrying transport.
//!
//! This module encapsulates error classification (transport errors and
//! application errors embedded in responses), the Fibonacci backoff policy,
//! and the deadline-bounded retry loop that ties them together around an
//! inner [`Transport`](crate::transport::Transport).

mod classify;
mod error;
mod policy;
mod predicate;
mod run;

pub use classify::{Classification, ErrorClassifier};
pub use error::Failure;
pub use policy::{Backoff, BackoffSchedule, INITIAL_BACKOFF};
pub use predicate::{
    default_predicates, RetryPredicate, BACKEND_ERROR_REASONS, RATE_LIMIT_REASONS,
    RETRYABLE_STATUS_CODES,
};
pub use run::{Execution, ExitReason, RetryTransport, DEFAULT_TIMEOUT};
