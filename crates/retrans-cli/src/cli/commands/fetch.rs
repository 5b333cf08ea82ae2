//! `retrans get` / `retrans send` – run one request through the retry transport.

use anyhow::{Context as _, Result};
use retrans_core::{
    ApiError, Body, Context, CurlTransport, Headers, Method, Request, RetryTransport,
    TransportConfig,
};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::RequestArgs;

/// Where the request body comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchBody {
    None,
    Data(String),
    File(PathBuf),
    Stdin,
}

impl FetchBody {
    pub fn from_flags(data: Option<String>, data_file: Option<PathBuf>, stdin: bool) -> Self {
        match (data, data_file) {
            (Some(data), _) => FetchBody::Data(data),
            (None, Some(path)) => FetchBody::File(path),
            (None, None) if stdin => FetchBody::Stdin,
            (None, None) => FetchBody::None,
        }
    }

    fn into_body(self) -> Result<Body> {
        Ok(match self {
            FetchBody::None => Body::Empty,
            FetchBody::Data(data) => Body::from(data),
            FetchBody::File(path) => {
                anyhow::ensure!(path.is_file(), "data file {} not found", path.display());
                Body::replayable(move || {
                    let file = File::open(&path)?;
                    Ok(Box::new(file) as Box<dyn Read + Send>)
                })
            }
            FetchBody::Stdin => Body::from_reader(io::stdin()),
        })
    }
}

/// Build the request and the context that bounds it. Without `--timeout` the
/// context has no deadline and the configured default applies.
pub fn build_request(
    method: Method,
    url: &str,
    body: FetchBody,
    args: &RequestArgs,
) -> Result<(Request, Context)> {
    let mut request =
        Request::parse(method, url).with_context(|| format!("invalid URL {}", url))?;
    let scheme = request.url.scheme();
    anyhow::ensure!(
        scheme == "http" || scheme == "https",
        "unsupported URL scheme {}",
        scheme
    );
    for line in &args.headers {
        let (name, value) = Headers::parse_line(line)
            .ok_or_else(|| anyhow::anyhow!("invalid header {:?}, expected 'Name: value'", line))?;
        request.headers.append(name, value);
    }
    request.body = body.into_body()?;
    let ctx = match args.timeout {
        Some(secs) => {
            anyhow::ensure!(secs > 0, "--timeout must be greater than zero");
            Context::with_timeout(Duration::from_secs(secs))
        }
        None => Context::background(),
    };
    request.set_context(ctx.clone());
    Ok((request, ctx))
}

pub async fn run_fetch(
    cfg: &TransportConfig,
    method: Method,
    url: &str,
    body: FetchBody,
    args: &RequestArgs,
) -> Result<()> {
    let (request, ctx) = build_request(method, url, body, args)?;
    let transport = RetryTransport::from_config(CurlTransport::from_config(cfg), cfg);

    let mut task = tokio::task::spawn_blocking(move || transport.execute(request));
    let exec = tokio::select! {
        res = &mut task => res.context("request task join")?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, canceling request");
            ctx.cancel();
            task.await.context("request task join")?
        }
    };
    tracing::info!(
        attempts = exec.attempts,
        exit = ?exec.exit,
        "{} {} finished",
        method,
        url
    );

    let resp = exec
        .outcome
        .with_context(|| format!("{} {} failed after {} attempt(s)", method, url, exec.attempts))?;
    let status = resp.status;
    let headers = resp.headers.clone();
    let bytes = resp.bytes().context("reading response body")?;

    let mut out = io::stdout().lock();
    if args.include {
        writeln!(out, "HTTP {}", status)?;
        for (name, value) in headers.iter() {
            writeln!(out, "{}: {}", name, value)?;
        }
        writeln!(out)?;
    }
    out.write_all(&bytes)?;
    out.flush()?;

    if let Some(err) = ApiError::check(status, &bytes) {
        anyhow::bail!("{} after {} attempt(s)", err, exec.attempts);
    }
    Ok(())
}
