// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Token retrieval over HTTP.
//!
//! The client only needs one HTTP capability: fetch a URL and hand back
//! the response asynchronously. Keeping it behind a trait lets tests
//! script the token endpoint.

use std::thread;

use tracing::debug;

/// Callback receiving `(status, body)`.
///
/// Status 0 means the request never completed. May be invoked from any
/// thread; receivers marshal onto their own loop.
pub type FetchCallback = Box<dyn FnOnce(u16, String) + Send>;

/// Asynchronous HTTP fetch capability.
pub trait TokenFetcher: Send {
    fn fetch(&self, url: &str, on_result: FetchCallback);
}

/// Fetches with blocking reqwest on a short-lived worker thread.
#[derive(Debug, Default)]
pub struct HttpTokenFetcher;

impl HttpTokenFetcher {
    pub fn new() -> Self {
        HttpTokenFetcher
    }
}

impl TokenFetcher for HttpTokenFetcher {
    fn fetch(&self, url: &str, on_result: FetchCallback) {
        let url = url.to_string();
        let spawned = thread::Builder::new()
            .name("cinder-fetch".to_string())
            .spawn(move || match reqwest::blocking::get(&url) {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response.text().unwrap_or_default();
                    on_result(status, body);
                }
                Err(err) => {
                    debug!("token fetch failed: {err}");
                    on_result(0, String::new());
                }
            });
        if let Err(err) = spawned {
            debug!("token fetch thread spawn failed: {err}");
        }
    }
}
