//! CLI command handlers.

mod config;
mod fetch;

pub use config::run_config;
pub use fetch::{build_request, run_fetch, FetchBody};
