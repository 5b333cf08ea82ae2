//! HTTP response as returned by a transport.

use crate::body::Body;
use crate::headers::Headers;
use std::io;
use std::sync::Arc;

#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub headers: Headers,
    pub body: Body,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Body::Empty,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Copy of the body bytes; the body stays readable for the caller.
    pub fn snapshot_body(&mut self) -> io::Result<Arc<[u8]>> {
        self.body.snapshot()
    }

    pub fn bytes(self) -> io::Result<Vec<u8>> {
        self.body.into_bytes()
    }

    /// Body as text, with invalid UTF-8 replaced.
    pub fn text(self) -> io::Result<String> {
        Ok(String::from_utf8_lossy(&self.bytes()?).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn success_range() {
        assert!(Response::new(200).is_success());
        assert!(Response::new(204).is_success());
        assert!(!Response::new(304).is_success());
        assert!(!Response::new(429).is_success());
    }

    #[test]
    fn snapshot_leaves_body_for_the_caller() {
        let mut resp = Response::new(503).with_body(Body::from_reader(Cursor::new(b"busy".to_vec())));
        let snap = resp.snapshot_body().unwrap();
        assert_eq!(&snap[..], b"busy");
        assert_eq!(resp.text().unwrap(), "busy");
    }
}
