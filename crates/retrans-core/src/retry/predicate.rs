//! Retry predicates: named, pure match functions over a [`Failure`].
//!
//! The classifier walks an ordered list of predicates and retries on the
//! first match. New transient error shapes are handled by adding a predicate,
//! not by changing the classifier.

use super::error::Failure;
use crate::transport::TransportErrorKind;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// HTTP codes retried by default.
pub const RETRYABLE_STATUS_CODES: [u16; 4] = [429, 500, 502, 503];

/// Service error reasons that mean "slow down".
pub const RATE_LIMIT_REASONS: [&str; 2] = ["rateLimitExceeded", "userRateLimitExceeded"];

/// Service error reasons for transient server-side failures.
pub const BACKEND_ERROR_REASONS: [&str; 2] = ["backendError", "internalError"];

type MatchFn = dyn Fn(&Failure) -> bool + Send + Sync;

/// A named match function. Must be pure: the same failure always gives the
/// same answer, and no state is kept between calls.
#[derive(Clone)]
pub struct RetryPredicate {
    name: Cow<'static, str>,
    check: Arc<MatchFn>,
}

impl RetryPredicate {
    pub fn new<F>(name: impl Into<Cow<'static, str>>, check: F) -> Self
    where
        F: Fn(&Failure) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    /// Matches application errors with one of `codes`.
    pub fn status_codes(
        name: impl Into<Cow<'static, str>>,
        codes: impl IntoIterator<Item = u16>,
    ) -> Self {
        let codes: Vec<u16> = codes.into_iter().collect();
        Self::new(name, move |f| f.code().is_some_and(|c| codes.contains(&c)))
    }

    /// Matches application errors carrying one of `reasons`.
    pub fn reasons<S: Into<String>>(
        name: impl Into<Cow<'static, str>>,
        reasons: impl IntoIterator<Item = S>,
    ) -> Self {
        let reasons: Vec<String> = reasons.into_iter().map(Into::into).collect();
        Self::new(name, move |f| {
            f.api_error()
                .is_some_and(|e| reasons.iter().any(|r| e.has_reason(r)))
        })
    }

    /// Matches transport errors of one of `kinds`.
    pub fn transport_kinds(
        name: impl Into<Cow<'static, str>>,
        kinds: impl IntoIterator<Item = TransportErrorKind>,
    ) -> Self {
        let kinds: Vec<TransportErrorKind> = kinds.into_iter().collect();
        Self::new(name, move |f| {
            f.transport_kind().is_some_and(|k| kinds.contains(&k))
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, failure: &Failure) -> bool {
        (self.check)(failure)
    }
}

impl fmt::Debug for RetryPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RetryPredicate").field(&self.name).finish()
    }
}

/// Predicates for common transient conditions, in evaluation order.
pub fn default_predicates() -> Vec<RetryPredicate> {
    vec![
        RetryPredicate::transport_kinds("network_timeout", [TransportErrorKind::Timeout]),
        RetryPredicate::transport_kinds(
            "connection_reset",
            [TransportErrorKind::ConnectionReset],
        ),
        RetryPredicate::transport_kinds("unexpected_eof", [TransportErrorKind::UnexpectedEof]),
        RetryPredicate::transport_kinds(
            "temporary_network",
            [TransportErrorKind::Connect, TransportErrorKind::Resolve],
        ),
        RetryPredicate::status_codes("common_retryable_status", RETRYABLE_STATUS_CODES),
        RetryPredicate::reasons("rate_limit_exceeded", RATE_LIMIT_REASONS),
        RetryPredicate::reasons("transient_backend_error", BACKEND_ERROR_REASONS),
    ]
}
