//! `retrans config` – print the effective configuration as TOML.

use anyhow::Result;
use retrans_core::config::{self, TransportConfig};
use std::path::Path;

pub fn run_config(cfg: &TransportConfig, explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => config::config_path()?,
    };
    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(cfg)?);
    Ok(())
}
