// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

#[test]
fn parses_minimal_toml_with_defaults() {
    let config = Config::from_toml_str(
        r#"
        host = "db.example.com"
        database = "mydb"
        listen_path = "/devices/livingroom"
        "#,
    )
    .unwrap();

    assert_eq!(config.host, "db.example.com");
    assert!(config.auth.is_none());
    assert_eq!(config.keepalive_ms, 45_000);
    assert_eq!(config.reconnect_base_ms, 500);
    assert_eq!(config.reconnect_max_ms, 30 * 60 * 1000);
}

#[test]
fn parses_auth_section() {
    let config = Config::from_toml_str(
        r#"
        host = "db.example.com"
        database = "mydb"
        listen_path = "/devices/livingroom"

        [auth]
        token_url = "https://tokens.example/issue"
        device_id = "livingroom"
        password = "hunter2"
        "#,
    )
    .unwrap();

    assert_eq!(
        config.token_url().unwrap(),
        "https://tokens.example/issue?device_id=livingroom&password=hunter2"
    );
}

#[test]
fn ws_url_carries_version_and_namespace() {
    let config = Config::from_toml_str(
        r#"
        host = "db.example.com"
        database = "mydb"
        listen_path = "/x"
        "#,
    )
    .unwrap();

    assert_eq!(config.ws_url(), "wss://db.example.com/.ws?v=5&ns=mydb");
}

#[test]
fn missing_host_is_an_error() {
    let result = Config::from_toml_str(r#"database = "mydb""#);
    assert!(result.is_err());
}

#[test]
fn token_url_is_none_without_auth() {
    let config = Config::from_toml_str(
        r#"
        host = "db.example.com"
        database = "mydb"
        listen_path = "/x"
        "#,
    )
    .unwrap();
    assert!(config.token_url().is_none());
}
