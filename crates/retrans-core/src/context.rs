//! Cancellation and deadline signal shared between a caller and a request.
//!
//! A `Context` is a cheap handle to shared state: clones observe the same
//! deadline and the same done signal. Child contexts are canceled together
//! with their parent. Waiting on a context races a timer against the done
//! signal, so a backoff wait ends early when the deadline passes or the
//! context is canceled.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

/// Why a context is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("context canceled")]
    Canceled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Result of [`Context::wait_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// The full duration elapsed and the context is still live.
    Elapsed,
    /// The context finished first.
    Done(ContextError),
}

#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

struct Inner {
    deadline: Option<Instant>,
    state: Mutex<State>,
    cond: Condvar,
}

#[derive(Default)]
struct State {
    done: Option<ContextError>,
    children: Vec<Weak<Inner>>,
}

impl Inner {
    fn new(deadline: Option<Instant>) -> Self {
        Self {
            deadline,
            state: Mutex::new(State::default()),
            cond: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deadline_passed(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }

    fn err(&self) -> Option<ContextError> {
        let state = self.lock();
        if let Some(err) = state.done {
            return Some(err);
        }
        self.deadline_passed(Instant::now())
            .then_some(ContextError::DeadlineExceeded)
    }

    fn finish(&self, reason: ContextError) {
        let children = {
            let mut state = self.lock();
            if state.done.is_some() {
                return;
            }
            let reason = if self.deadline_passed(Instant::now()) {
                ContextError::DeadlineExceeded
            } else {
                reason
            };
            state.done = Some(reason);
            std::mem::take(&mut state.children)
        };
        self.cond.notify_all();
        for child in children.iter().filter_map(Weak::upgrade) {
            child.finish(reason);
        }
    }
}

impl Context {
    /// A context that is never done unless canceled explicitly.
    pub fn background() -> Self {
        Self {
            inner: Arc::new(Inner::new(None)),
        }
    }

    /// A context whose deadline is `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(deadline_after(timeout))
    }

    /// A context with an absolute deadline. `None` behaves like [`Context::background`].
    pub fn with_deadline(deadline: Option<Instant>) -> Self {
        Self {
            inner: Arc::new(Inner::new(deadline)),
        }
    }

    /// A child of `parent` that is done at `timeout` from now, at the parent's
    /// deadline if that comes earlier, or when the parent is canceled.
    pub fn child_with_timeout(parent: &Context, timeout: Duration) -> Self {
        let own = deadline_after(timeout);
        let deadline = match (parent.deadline(), own) {
            (Some(p), Some(o)) => Some(p.min(o)),
            (p, o) => p.or(o),
        };
        let child = Arc::new(Inner::new(deadline));
        {
            let mut state = parent.inner.lock();
            if let Some(reason) = state.done {
                drop(state);
                child.finish(reason);
            } else {
                state.children.retain(|w| w.strong_count() > 0);
                state.children.push(Arc::downgrade(&child));
            }
        }
        Self { inner: child }
    }

    /// Cancel this context and all of its children. No-op once done.
    pub fn cancel(&self) {
        self.inner.finish(ContextError::Canceled);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Time left until the deadline, `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// `None` while the context is live.
    pub fn err(&self) -> Option<ContextError> {
        self.inner.err()
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Block for `duration` or until the context is done, whichever is first.
    pub fn wait_for(&self, duration: Duration) -> Wait {
        let timer_end = Instant::now().checked_add(duration);
        let mut state = self.inner.lock();
        loop {
            if let Some(err) = state.done {
                return Wait::Done(err);
            }
            let now = Instant::now();
            if self.inner.deadline_passed(now) {
                return Wait::Done(ContextError::DeadlineExceeded);
            }
            if timer_end.is_some_and(|end| now >= end) {
                return Wait::Elapsed;
            }
            let wake = match (self.inner.deadline, timer_end) {
                (Some(d), Some(end)) => Some(d.min(end)),
                (d, end) => d.or(end),
            };
            state = match wake {
                Some(wake) => {
                    self.inner
                        .cond
                        .wait_timeout(state, wake - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => self
                    .inner
                    .cond
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
            };
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("remaining", &self.remaining())
            .field("err", &self.err())
            .finish()
    }
}

/// Roughly thirty years; stands in for timeouts too large to add to `now`.
const FAR_FUTURE: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

fn deadline_after(timeout: Duration) -> Option<Instant> {
    let now = Instant::now();
    now.checked_add(timeout)
        .or_else(|| now.checked_add(FAR_FUTURE))
}
