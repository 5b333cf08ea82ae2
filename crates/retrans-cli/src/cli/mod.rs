//! CLI for the retrans retrying HTTP client.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use retrans_core::config;
use retrans_core::Method;
use std::path::PathBuf;

use commands::{run_config, run_fetch, FetchBody};

/// Top-level CLI for retrans.
#[derive(Debug, Parser)]
#[command(name = "retrans")]
#[command(about = "retrans: HTTP requests with deadline-bounded retries", long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of ~/.config/retrans/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Options shared by every command that sends a request.
#[derive(Debug, Clone, Default, Args)]
pub struct RequestArgs {
    /// Extra request header, e.g. -H 'Accept: application/json'. Repeatable.
    #[arg(short = 'H', long = "header", value_name = "NAME: VALUE")]
    pub headers: Vec<String>,

    /// Overall deadline in seconds for all attempts (default from config).
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print the status line and response headers before the body.
    #[arg(short, long)]
    pub include: bool,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// GET a URL, retrying transient failures.
    Get {
        /// HTTP/HTTPS URL.
        url: String,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// Send a request with any method and an optional body.
    Send {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE, HEAD, OPTIONS).
        method: Method,

        /// HTTP/HTTPS URL.
        url: String,

        /// Request body given inline.
        #[arg(long, conflicts_with_all = ["data_file", "stdin"])]
        data: Option<String>,

        /// Request body read from a file (re-read for every attempt).
        #[arg(long, value_name = "PATH", conflicts_with = "stdin")]
        data_file: Option<PathBuf>,

        /// Request body read from stdin (sent once, never retried).
        #[arg(long)]
        stdin: bool,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// Print the effective configuration.
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = match &cli.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Get { url, request } => {
                run_fetch(&cfg, Method::Get, &url, FetchBody::None, &request).await?
            }
            CliCommand::Send {
                method,
                url,
                data,
                data_file,
                stdin,
                request,
            } => {
                let body = FetchBody::from_flags(data, data_file, stdin);
                run_fetch(&cfg, method, &url, body, &request).await?
            }
            CliCommand::Config => run_config(&cfg, cli.config.as_deref())?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
