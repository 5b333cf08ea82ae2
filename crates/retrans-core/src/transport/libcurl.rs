//! Blocking transport on libcurl (curl crate).
//!
//! One `Easy` handle per request. The request context bounds the transfer: its
//! remaining time becomes the curl timeout and the progress callback aborts
//! the transfer once the context is done.

use super::{Outcome, Transport, TransportError, TransportErrorKind};
use crate::body::Body;
use crate::config::TransportConfig;
use crate::context::Context;
use crate::headers::Headers;
use crate::request::{Method, Request};
use crate::response::Response;
use curl::easy::{Easy, List};
use std::str;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    pub follow_redirects: bool,
    pub max_redirects: u32,
    pub user_agent: Option<String>,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            follow_redirects: true,
            max_redirects: 10,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CurlTransport {
    options: CurlOptions,
}

impl CurlTransport {
    pub fn new(options: CurlOptions) -> Self {
        Self { options }
    }

    pub fn from_config(cfg: &TransportConfig) -> Self {
        Self::new(CurlOptions {
            connect_timeout: Duration::from_secs(cfg.http.connect_timeout_secs),
            follow_redirects: cfg.http.follow_redirects,
            max_redirects: cfg.http.max_redirects,
            user_agent: cfg.http.user_agent.clone(),
        })
    }

    pub fn options(&self) -> &CurlOptions {
        &self.options
    }

    fn perform(&self, request: Request) -> Outcome {
        let context = request.context().cloned();
        if let Some(err) = context.as_ref().and_then(Context::err) {
            return Err(err.into());
        }
        let method = request.method;
        let url = request.url;
        let headers = request.headers;
        let payload = request
            .body
            .into_bytes()
            .map_err(|e| TransportError::new(TransportErrorKind::Body, e.to_string()))?;

        let mut easy = Easy::new();
        easy.url(url.as_str()).map_err(curl_error)?;
        match method {
            Method::Head => easy.nobody(true).map_err(curl_error)?,
            Method::Get if payload.is_empty() => easy.get(true).map_err(curl_error)?,
            // Bodyless DELETE/OPTIONS: no Content-Length or form Content-Type.
            Method::Delete | Method::Options if payload.is_empty() => {
                easy.custom_request(method.as_str()).map_err(curl_error)?
            }
            _ => {
                easy.post_field_size(payload.len() as u64)
                    .map_err(curl_error)?;
                easy.post_fields_copy(&payload).map_err(curl_error)?;
                if method != Method::Post {
                    easy.custom_request(method.as_str()).map_err(curl_error)?;
                }
            }
        }
        easy.follow_location(self.options.follow_redirects)
            .map_err(curl_error)?;
        easy.max_redirections(self.options.max_redirects)
            .map_err(curl_error)?;
        easy.connect_timeout(self.options.connect_timeout)
            .map_err(curl_error)?;
        if let Some(ua) = &self.options.user_agent {
            easy.useragent(ua).map_err(curl_error)?;
        }
        if let Some(remaining) = context.as_ref().and_then(Context::remaining) {
            easy.timeout(remaining.max(Duration::from_millis(1)))
                .map_err(curl_error)?;
        }
        if context.is_some() {
            easy.progress(true).map_err(curl_error)?;
        }

        // Build curl list for request headers ("Name: value").
        if !headers.is_empty() {
            let mut list = List::new();
            for (name, value) in headers.iter() {
                list.append(&format!("{}: {}", name.trim(), value.trim()))
                    .map_err(curl_error)?;
            }
            easy.http_headers(list).map_err(curl_error)?;
        }

        let mut header_lines: Vec<String> = Vec::new();
        let mut body: Vec<u8> = Vec::new();
        let performed = {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    if let Ok(s) = str::from_utf8(data) {
                        header_lines.push(s.trim_end().to_string());
                    }
                    true
                })
                .map_err(curl_error)?;
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(curl_error)?;
            if let Some(ctx) = &context {
                transfer
                    .progress_function(|_, _, _, _| !ctx.is_done())
                    .map_err(curl_error)?;
            }
            transfer.perform()
        };

        if let Err(e) = performed {
            // Aborted or timed out because the context finished: report the context's reason.
            if e.is_aborted_by_callback() || e.is_operation_timedout() {
                if let Some(err) = context.as_ref().and_then(Context::err) {
                    return Err(err.into());
                }
            }
            return Err(curl_error(e));
        }

        let code = easy.response_code().map_err(curl_error)?;
        tracing::trace!(%method, %url, status = code, bytes = body.len(), "curl transfer done");
        Ok(Response {
            status: u16::try_from(code).unwrap_or(0),
            headers: final_headers(&header_lines),
            body: Body::from_bytes(body),
        })
    }
}

impl Transport for CurlTransport {
    fn round_trip(&self, request: Request) -> Outcome {
        self.perform(request)
    }
}

/// Headers of the last response in a redirect chain.
fn final_headers(lines: &[String]) -> Headers {
    let mut headers = Headers::new();
    for line in lines {
        if line.starts_with("HTTP/") {
            headers.clear();
            continue;
        }
        if let Some((name, value)) = Headers::parse_line(line) {
            headers.append(name, value);
        }
    }
    headers
}

fn curl_error(e: curl::Error) -> TransportError {
    TransportError::new(classify_curl_error(&e), e.to_string())
}

/// Map a curl error onto a transport error kind.
fn classify_curl_error(e: &curl::Error) -> TransportErrorKind {
    if e.is_operation_timedout() {
        return TransportErrorKind::Timeout;
    }
    if e.is_couldnt_connect() {
        return TransportErrorKind::Connect;
    }
    if e.is_couldnt_resolve_host() || e.is_couldnt_resolve_proxy() {
        return TransportErrorKind::Resolve;
    }
    if e.is_recv_error() || e.is_send_error() {
        return TransportErrorKind::ConnectionReset;
    }
    if e.is_got_nothing() || e.is_partial_file() {
        return TransportErrorKind::UnexpectedEof;
    }
    if e.is_aborted_by_callback() {
        return TransportErrorKind::Canceled;
    }
    if e.is_read_error() {
        return TransportErrorKind::Body;
    }
    if e.is_url_malformed() || e.is_unsupported_protocol() {
        return TransportErrorKind::InvalidRequest;
    }
    TransportErrorKind::Other
}
