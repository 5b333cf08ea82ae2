//! Application-level errors carried by non-2xx responses.
//!
//! Services answer failures with a JSON envelope such as
//!
//! ```text
//! {"error": {"code": 403, "message": "Rate Limit Exceeded", "status": "PERMISSION_DENIED",
//!            "errors": [{"domain": "usageLimits", "reason": "rateLimitExceeded", "message": "..."}]}}
//! ```
//!
//! Bodies that do not decode still produce an [`ApiError`] carrying the HTTP
//! status and the raw text.

use serde::Deserialize;
use std::fmt;

/// Longest body excerpt shown by `Display`.
const BODY_EXCERPT: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
    /// Canonical status name, e.g. `RESOURCE_EXHAUSTED`.
    pub status: Option<String>,
    pub details: Vec<ErrorDetail>,
    /// Raw response body.
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize)]
struct Envelope {
    error: EnvelopeError,
}

#[derive(Deserialize)]
struct EnvelopeError {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

impl ApiError {
    /// `None` for 2xx responses, otherwise the decoded error.
    pub fn check(status: u16, body: &[u8]) -> Option<ApiError> {
        if (200..300).contains(&status) {
            return None;
        }
        let mut err = ApiError {
            code: status,
            message: String::new(),
            status: None,
            details: Vec::new(),
            body: String::from_utf8_lossy(body).into_owned(),
        };
        if let Ok(Envelope { error }) = serde_json::from_slice::<Envelope>(body) {
            if error.code != 0 {
                err.code = error.code;
            }
            err.message = error.message;
            err.status = error.status;
            err.details = error.errors;
        }
        Some(err)
    }

    pub fn reasons(&self) -> impl Iterator<Item = &str> {
        self.details.iter().map(|d| d.reason.as_str())
    }

    pub fn has_reason(&self, reason: &str) -> bool {
        self.reasons().any(|r| r == reason)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.code)?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        } else if !self.body.is_empty() {
            let excerpt: String = self.body.chars().take(BODY_EXCERPT).collect();
            write!(f, ": {}", excerpt.trim())?;
        }
        let reasons: Vec<&str> = self.reasons().filter(|r| !r.is_empty()).collect();
        if !reasons.is_empty() {
            write!(f, " ({})", reasons.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}
