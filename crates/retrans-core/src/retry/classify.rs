//! Turn the outcome of one attempt into a retry decision.

use super::error::Failure;
use super::predicate::{default_predicates, RetryPredicate};
use crate::api_error::ApiError;
use crate::response::Response;
use crate::transport::Outcome;
use std::sync::Arc;

/// Judgment on one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Success,
    /// A predicate matched; another attempt may succeed.
    Retryable(Failure),
    Terminal(Failure),
}

impl Classification {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Classification::Retryable(_))
    }
}

/// Holds an immutable, ordered predicate list. Cloning shares the list, and
/// classification keeps no state, so one classifier serves concurrent calls.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    predicates: Arc<[RetryPredicate]>,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(default_predicates())
    }
}

impl ErrorClassifier {
    pub fn new(predicates: Vec<RetryPredicate>) -> Self {
        Self {
            predicates: predicates.into(),
        }
    }

    /// This classifier's predicates followed by `extra`.
    pub fn extended(&self, extra: impl IntoIterator<Item = RetryPredicate>) -> Self {
        let mut predicates = self.predicates.to_vec();
        predicates.extend(extra);
        Self::new(predicates)
    }

    pub fn predicates(&self) -> &[RetryPredicate] {
        &self.predicates
    }

    /// Classify an attempt. A transport error takes precedence; otherwise a
    /// non-2xx response is inspected for an application error. Inspection
    /// snapshots the body and leaves a re-readable copy in the response.
    pub fn classify(&self, outcome: &mut Outcome) -> Classification {
        let failure = match outcome {
            Err(e) => Failure::Transport(e.clone()),
            Ok(resp) => match inspect(resp) {
                Ok(None) => return Classification::Success,
                Ok(Some(api)) => Failure::Api(api),
                Err(failure) => return Classification::Terminal(failure),
            },
        };
        self.judge(failure)
    }

    /// Run the predicates over an error signal.
    pub fn judge(&self, failure: Failure) -> Classification {
        match self.predicates.iter().find(|p| p.matches(&failure)) {
            Some(p) => {
                tracing::debug!(predicate = p.name(), "retryable error: {}", failure);
                Classification::Retryable(failure)
            }
            None => Classification::Terminal(failure),
        }
    }
}

fn inspect(resp: &mut Response) -> Result<Option<ApiError>, Failure> {
    if resp.is_success() {
        return Ok(None);
    }
    let bytes = resp
        .snapshot_body()
        .map_err(|e| Failure::BodySnapshot(e.to_string()))?;
    Ok(ApiError::check(resp.status, &bytes))
}
