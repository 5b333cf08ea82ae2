//! Request and response bodies.
//!
//! A body is re-readable unless it is a [`Body::Stream`]. Retrying a request
//! needs a fresh copy of the body for every attempt, so only re-readable
//! bodies can be retried.

use std::fmt;
use std::io::{self, Cursor, Read};
use std::sync::Arc;

/// Produces a fresh reader over the same body content on every call.
pub type BodyFactory = Arc<dyn Fn() -> io::Result<Box<dyn Read + Send>> + Send + Sync>;

pub enum Body {
    Empty,
    /// In-memory bytes; clones share the buffer.
    Bytes(Arc<[u8]>),
    /// Re-opened through the factory for each use (e.g. a file on disk).
    Replayable(BodyFactory),
    /// Single-use reader. Cannot be duplicated.
    Stream(Box<dyn Read + Send>),
}

/// Why a body could not be duplicated.
#[derive(Debug, thiserror::Error)]
pub enum CloneError {
    #[error("request body is a single-use stream")]
    NotReplayable,
    #[error("re-opening request body failed: {0}")]
    Reopen(#[source] io::Error),
}

impl Body {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Body::Bytes(Arc::from(bytes.into()))
    }

    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Body::Stream(Box::new(reader))
    }

    pub fn replayable<F>(factory: F) -> Self
    where
        F: Fn() -> io::Result<Box<dyn Read + Send>> + Send + Sync + 'static,
    {
        Body::Replayable(Arc::new(factory))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Bytes(b) => b.is_empty(),
            Body::Replayable(_) | Body::Stream(_) => false,
        }
    }

    pub fn is_rereadable(&self) -> bool {
        !matches!(self, Body::Stream(_))
    }

    /// Independent copy for one use. Replayable bodies are re-opened.
    pub fn try_clone(&self) -> Result<Body, CloneError> {
        match self {
            Body::Empty => Ok(Body::Empty),
            Body::Bytes(b) => Ok(Body::Bytes(Arc::clone(b))),
            Body::Replayable(factory) => factory().map(Body::Stream).map_err(CloneError::Reopen),
            Body::Stream(_) => Err(CloneError::NotReplayable),
        }
    }

    pub fn into_reader(self) -> io::Result<Box<dyn Read + Send>> {
        match self {
            Body::Empty => Ok(Box::new(io::empty())),
            Body::Bytes(b) => Ok(Box::new(Cursor::new(b))),
            Body::Replayable(factory) => factory(),
            Body::Stream(r) => Ok(r),
        }
    }

    pub fn into_bytes(self) -> io::Result<Vec<u8>> {
        match self {
            Body::Empty => Ok(Vec::new()),
            Body::Bytes(b) => Ok(b.to_vec()),
            other => {
                let mut buf = Vec::new();
                other.into_reader()?.read_to_end(&mut buf)?;
                Ok(buf)
            }
        }
    }

    /// Read the whole body and keep it in memory as [`Body::Bytes`], so it can
    /// be read again. On a read error the bytes already read are put back in
    /// front of the unread remainder.
    pub fn snapshot(&mut self) -> io::Result<Arc<[u8]>> {
        match std::mem::replace(self, Body::Empty) {
            Body::Empty => Ok(Arc::from(Vec::new())),
            Body::Bytes(b) => {
                *self = Body::Bytes(Arc::clone(&b));
                Ok(b)
            }
            Body::Replayable(factory) => {
                let res = read_all(&factory);
                *self = Body::Replayable(factory);
                res.map(Arc::from)
            }
            Body::Stream(mut r) => {
                let mut buf = Vec::new();
                match r.read_to_end(&mut buf) {
                    Ok(_) => {
                        let bytes: Arc<[u8]> = Arc::from(buf);
                        *self = Body::Bytes(Arc::clone(&bytes));
                        Ok(bytes)
                    }
                    Err(e) => {
                        *self = Body::Stream(Box::new(Cursor::new(buf).chain(r)));
                        Err(e)
                    }
                }
            }
        }
    }

    /// Read the body to the end once and return the byte count. Re-readable
    /// bodies are untouched; a stream is buffered in place and stays a
    /// single-use stream.
    pub fn drain(&mut self) -> io::Result<u64> {
        match std::mem::replace(self, Body::Empty) {
            Body::Stream(mut r) => {
                let mut buf = Vec::new();
                match r.read_to_end(&mut buf) {
                    Ok(n) => {
                        *self = Body::Stream(Box::new(Cursor::new(buf)));
                        Ok(n as u64)
                    }
                    Err(e) => {
                        *self = Body::Stream(Box::new(Cursor::new(buf).chain(r)));
                        Err(e)
                    }
                }
            }
            other => {
                let res = match &other {
                    Body::Replayable(factory) => {
                        factory().and_then(|mut r| io::copy(&mut r, &mut io::sink()))
                    }
                    Body::Bytes(b) => Ok(b.len() as u64),
                    _ => Ok(0),
                };
                *self = other;
                res
            }
        }
    }
}

fn read_all(factory: &BodyFactory) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    factory()?.read_to_end(&mut buf)?;
    Ok(buf)
}

impl Default for Body {
    fn default() -> Self {
        Body::Empty
    }
}

impl From<Vec<u8>> for Body {
    fn from(v: Vec<u8>) -> Self {
        Body::from_bytes(v)
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::from_bytes(s.into_bytes())
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Body::from_bytes(s.as_bytes())
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Empty"),
            Body::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            Body::Replayable(_) => f.write_str("Replayable"),
            Body::Stream(_) => f.write_str("Stream"),
        }
    }
}
