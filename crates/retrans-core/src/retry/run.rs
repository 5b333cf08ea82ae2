//! Retry loop: execute a request until success, a terminal failure, or the
//! deadline.

use super::classify::{Classification, ErrorClassifier};
use super::policy::BackoffSchedule;
use crate::config::TransportConfig;
use crate::context::{Context, Wait};
use crate::request::Request;
use crate::transport::{Outcome, Transport};
use std::time::Duration;
use tracing::{debug, warn};

/// Deadline applied when the caller's context has none.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

/// How a retry loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Success,
    /// Last attempt failed with an error no predicate matched.
    Terminal,
    /// Still retryable, but the deadline passed or the context was canceled.
    DeadlineExceeded,
    /// The body could not be duplicated; the original request ran exactly once.
    DegradedSingleAttempt,
}

/// Result of [`RetryTransport::execute`]: the last real outcome plus how the
/// loop got there.
#[derive(Debug)]
pub struct Execution {
    pub outcome: Outcome,
    pub attempts: u32,
    pub exit: ExitReason,
}

/// Deadline owned by one loop. Only a locally created context is released
/// when the loop ends; a caller's context is never canceled here.
enum DeadlineScope {
    External(Context),
    Local(Context),
}

impl DeadlineScope {
    fn establish(caller: Option<&Context>, ceiling: Duration) -> Self {
        match caller {
            Some(ctx) if ctx.deadline().is_some() => DeadlineScope::External(ctx.clone()),
            Some(ctx) => DeadlineScope::Local(Context::child_with_timeout(ctx, ceiling)),
            None => DeadlineScope::Local(Context::with_timeout(ceiling)),
        }
    }

    fn context(&self) -> &Context {
        match self {
            DeadlineScope::External(ctx) | DeadlineScope::Local(ctx) => ctx,
        }
    }
}

impl Drop for DeadlineScope {
    fn drop(&mut self) {
        if let DeadlineScope::Local(ctx) = self {
            if !ctx.is_done() {
                ctx.cancel();
            }
        }
    }
}

/// Wraps a transport and retries transient failures with Fibonacci backoff,
/// bounded by the request deadline. It is itself a [`Transport`].
#[derive(Debug, Clone)]
pub struct RetryTransport<T> {
    inner: T,
    classifier: ErrorClassifier,
    backoff: BackoffSchedule,
    default_timeout: Duration,
}

impl<T: Transport> RetryTransport<T> {
    /// Retry transport with the default predicates.
    pub fn new(inner: T) -> Self {
        Self::with_classifier(inner, ErrorClassifier::default())
    }

    pub fn with_classifier(inner: T, classifier: ErrorClassifier) -> Self {
        Self {
            inner,
            classifier,
            backoff: BackoffSchedule::default(),
            default_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Default predicates plus the ones the config adds, with the config's
    /// deadline and backoff.
    pub fn from_config(inner: T, cfg: &TransportConfig) -> Self {
        let classifier = ErrorClassifier::default().extended(cfg.extra_predicates());
        Self::with_classifier(inner, classifier)
            .backoff(cfg.backoff_schedule())
            .default_timeout(cfg.default_timeout())
    }

    pub fn backoff(mut self, schedule: BackoffSchedule) -> Self {
        self.backoff = schedule;
        self
    }

    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn classifier(&self) -> &ErrorClassifier {
        &self.classifier
    }

    /// Run the retry loop for one logical request.
    pub fn execute(&self, mut request: Request) -> Execution {
        let scope = DeadlineScope::establish(request.context(), self.default_timeout);
        let ctx = scope.context();

        // Recorders on the inner side may require the original body to have
        // been read; the body itself is preserved.
        if let Err(e) = request.drain_body() {
            warn!("consuming original request body failed: {}", e);
        }

        debug!(method = %request.method, url = %request.url, "starting retry loop");
        let mut backoff = self.backoff.start();
        let mut attempts = 0u32;
        let (outcome, exit) = loop {
            let attempt = match request.try_clone() {
                Ok(copy) => copy.with_context(ctx.clone()),
                Err(e) => {
                    warn!("unable to copy request body: {}; running request as non-retryable", e);
                    request.set_context(ctx.clone());
                    attempts += 1;
                    break (
                        self.inner.round_trip(request),
                        ExitReason::DegradedSingleAttempt,
                    );
                }
            };

            debug!(attempt = attempts, "request attempt");
            let mut outcome = self.inner.round_trip(attempt);
            attempts += 1;

            match self.classifier.classify(&mut outcome) {
                Classification::Success => {
                    debug!("stopping retries, last request was successful");
                    break (outcome, ExitReason::Success);
                }
                Classification::Terminal(cause) => {
                    debug!("stopping retries, last request failed with non-retryable error: {}", cause);
                    break (outcome, ExitReason::Terminal);
                }
                Classification::Retryable(cause) => {
                    if let Some(err) = ctx.err() {
                        debug!("stopping retries, {}: last error: {}", err, cause);
                        break (outcome, ExitReason::DeadlineExceeded);
                    }
                    let delay = backoff.delay();
                    debug!(?delay, "waiting before trying request again: {}", cause);
                    match ctx.wait_for(delay) {
                        Wait::Done(err) => {
                            debug!("stopping retries, context done: {}", err);
                            break (outcome, ExitReason::DeadlineExceeded);
                        }
                        Wait::Elapsed => {
                            debug!(?delay, "finished waiting before next retry");
                            backoff.advance();
                        }
                    }
                }
            }
        };

        debug!(attempts, ?exit, "returning after {} attempts", attempts);
        Execution {
            outcome,
            attempts,
            exit,
        }
    }
}

impl<T: Transport> Transport for RetryTransport<T> {
    fn round_trip(&self, request: Request) -> Outcome {
        self.execute(request).outcome
    }
}
