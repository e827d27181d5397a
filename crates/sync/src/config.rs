// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connection and authentication settings.
//!
//! Settings are plain data, usually loaded from TOML:
//!
//! ```toml
//! host = "myproject.firebaseio.example"
//! database = "myproject"
//! listen_path = "/devices/livingroom"
//!
//! [auth]
//! token_url = "https://tokens.example/issue"
//! device_id = "livingroom"
//! password = "hunter2"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database host, e.g. `myproject.firebaseio.example`.
    pub host: String,
    /// Database namespace (the `ns` query parameter of the session URL).
    pub database: String,
    /// Path the client listens on for server pushes.
    pub listen_path: String,
    /// Token endpoint settings. Absent means unauthenticated sessions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,
    /// Keepalive interval in milliseconds (default: 45000).
    #[serde(default = "default_keepalive_ms")]
    pub keepalive_ms: u64,
    /// Initial reconnect delay in milliseconds (default: 500).
    #[serde(default = "default_reconnect_base_ms")]
    pub reconnect_base_ms: u64,
    /// Maximum reconnect delay in milliseconds (default: 30 minutes).
    #[serde(default = "default_reconnect_max_ms")]
    pub reconnect_max_ms: u64,
}

/// Token endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub token_url: String,
    pub device_id: String,
    pub password: String,
}

fn default_keepalive_ms() -> u64 {
    45_000
}

fn default_reconnect_base_ms() -> u64 {
    500
}

fn default_reconnect_max_ms() -> u64 {
    30 * 60 * 1000
}

impl Config {
    /// Parses a TOML document into settings.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// The session URL: `wss://{host}/.ws?v=5&ns={database}`.
    pub fn ws_url(&self) -> String {
        format!("wss://{}/.ws?v=5&ns={}", self.host, self.database)
    }

    /// The credential endpoint with device identity applied, or `None`
    /// when running unauthenticated.
    pub fn token_url(&self) -> Option<String> {
        self.auth.as_ref().map(|auth| {
            format!(
                "{}?device_id={}&password={}",
                auth.token_url, auth.device_id, auth.password
            )
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
