//! Tests for the get, send and config subcommands.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use retrans_core::Method;

#[test]
fn cli_parse_get() {
    match parse(&["retrans", "get", "https://api.example.com/v1/users"]) {
        CliCommand::Get { url, request } => {
            assert_eq!(url, "https://api.example.com/v1/users");
            assert!(request.headers.is_empty());
            assert!(request.timeout.is_none());
            assert!(!request.include);
        }
        _ => panic!("expected Get"),
    }
}

#[test]
fn cli_parse_get_with_request_flags() {
    match parse(&[
        "retrans",
        "get",
        "https://api.example.com/v1/users",
        "-H",
        "Accept: application/json",
        "--header",
        "X-Trace: 1",
        "--timeout",
        "30",
        "-i",
    ]) {
        CliCommand::Get { request, .. } => {
            assert_eq!(request.headers, ["Accept: application/json", "X-Trace: 1"]);
            assert_eq!(request.timeout, Some(30));
            assert!(request.include);
        }
        _ => panic!("expected Get with flags"),
    }
}

#[test]
fn cli_parse_send_data() {
    match parse(&[
        "retrans",
        "send",
        "post",
        "https://api.example.com/v1/groups",
        "--data",
        r#"{"email":"g@example.com"}"#,
    ]) {
        CliCommand::Send {
            method,
            url,
            data,
            data_file,
            stdin,
            ..
        } => {
            assert_eq!(method, Method::Post);
            assert_eq!(url, "https://api.example.com/v1/groups");
            assert_eq!(data.as_deref(), Some(r#"{"email":"g@example.com"}"#));
            assert!(data_file.is_none());
            assert!(!stdin);
        }
        _ => panic!("expected Send"),
    }
}

#[test]
fn cli_parse_send_data_file() {
    match parse(&[
        "retrans",
        "send",
        "PUT",
        "https://api.example.com/v1/groups/g",
        "--data-file",
        "/tmp/body.json",
    ]) {
        CliCommand::Send {
            method, data_file, ..
        } => {
            assert_eq!(method, Method::Put);
            assert_eq!(
                data_file.as_deref(),
                Some(std::path::Path::new("/tmp/body.json"))
            );
        }
        _ => panic!("expected Send with --data-file"),
    }
}

#[test]
fn cli_rejects_unknown_method() {
    assert!(Cli::try_parse_from(["retrans", "send", "BREW", "https://example.com/"]).is_err());
}

#[test]
fn cli_rejects_two_body_sources() {
    assert!(Cli::try_parse_from([
        "retrans",
        "send",
        "POST",
        "https://example.com/",
        "--data",
        "x",
        "--stdin",
    ])
    .is_err());
}

#[test]
fn cli_parse_config_global_flag() {
    let cli = Cli::try_parse_from(["retrans", "config", "--config", "/etc/retrans.toml"]).unwrap();
    assert!(matches!(cli.command, CliCommand::Config));
    assert_eq!(
        cli.config.as_deref(),
        Some(std::path::Path::new("/etc/retrans.toml"))
    );
}
