//! In-memory transport that replays a fixed script of outcomes.
//!
//! Each call pops the next step; once the script runs out the last step
//! repeats. Every call is recorded (time, body, deadline) for assertions.

use retrans_core::{Body, Outcome, Request, Response, Transport, TransportError, TransportErrorKind};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub enum Step {
    Status(u16),
    StatusBody(u16, &'static str),
    Error(TransportErrorKind),
    /// Sleep, then answer with the status.
    Slow(Duration, u16),
}

#[derive(Debug, Clone)]
pub struct Call {
    pub at: Instant,
    pub body: Vec<u8>,
    pub remaining: Option<Duration>,
}

pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    last: Mutex<Option<Step>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            last: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Gaps between consecutive calls.
    pub fn gaps(&self) -> Vec<Duration> {
        let calls = self.calls();
        calls.windows(2).map(|w| w[1].at - w[0].at).collect()
    }

    fn next_step(&self) -> Step {
        let mut last = self.last.lock().unwrap();
        if let Some(step) = self.steps.lock().unwrap().pop_front() {
            *last = Some(step);
        }
        last.clone().expect("script must not be empty")
    }
}

impl Transport for ScriptedTransport {
    fn round_trip(&self, request: Request) -> Outcome {
        let remaining = request.context().and_then(|c| c.remaining());
        let at = Instant::now();
        let body = request.body.into_bytes().unwrap_or_default();
        self.calls.lock().unwrap().push(Call {
            at,
            body,
            remaining,
        });
        match self.next_step() {
            Step::Status(code) => Ok(Response::new(code)),
            Step::StatusBody(code, body) => Ok(Response::new(code).with_body(Body::from(body))),
            Step::Error(kind) => Err(TransportError::new(kind, "scripted failure")),
            Step::Slow(delay, code) => {
                thread::sleep(delay);
                Ok(Response::new(code))
            }
        }
    }
}
