// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test doubles: a scripted channel, a scripted token fetcher, and
//! a bounded loop driver.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::channel::{Channel, ChannelEvent, EventSink, Frame};
use crate::config::{AuthConfig, Config};
use crate::fetch::{FetchCallback, TokenFetcher};
use crate::scheduler::EventScheduler;

/// A hello frame carrying a host and session id.
pub const HELLO: &str = r#"{"t":"c","d":{"t":"h","d":{"h":"host1","s":"sess1"}}}"#;

/// Runs the loop on the current thread until `window` from now.
pub fn drive(scheduler: &EventScheduler, window: Duration) {
    let quitter = scheduler.clone();
    scheduler.run_after(Instant::now() + window, move || quitter.quit());
    scheduler.run();
}

/// Config pointing at fixture endpoints, with a fast reconnect base so
/// tests do not sit out production delays.
pub fn test_config(with_auth: bool) -> Config {
    Config {
        host: "db.example.com".to_string(),
        database: "mydb".to_string(),
        listen_path: "/devices/test".to_string(),
        auth: with_auth.then(|| AuthConfig {
            token_url: "https://tokens.example/issue".to_string(),
            device_id: "dev1".to_string(),
            password: "pw".to_string(),
        }),
        keepalive_ms: 45_000,
        reconnect_base_ms: 1,
        reconnect_max_ms: 50,
    }
}

#[derive(Default)]
struct MockChannelState {
    sink: Option<EventSink>,
    sent: Vec<String>,
    connected: bool,
    connect_ok: bool,
    connect_calls: u32,
}

/// Scripted [`Channel`]: records sends, lets the test inject frames.
pub struct MockChannel {
    state: Arc<Mutex<MockChannelState>>,
}

/// Test-side handle to a [`MockChannel`] owned by the client.
#[derive(Clone)]
pub struct MockChannelHandle {
    state: Arc<Mutex<MockChannelState>>,
}

/// Creates a connected pair: the channel to hand to the client, and the
/// handle the test keeps.
pub fn mock_channel() -> (Box<dyn Channel>, MockChannelHandle) {
    let state = Arc::new(Mutex::new(MockChannelState {
        connect_ok: true,
        ..MockChannelState::default()
    }));
    (
        Box::new(MockChannel {
            state: Arc::clone(&state),
        }),
        MockChannelHandle { state },
    )
}

fn lock_state(state: &Arc<Mutex<MockChannelState>>) -> MutexGuard<'_, MockChannelState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Channel for MockChannel {
    fn set_event_sink(&mut self, sink: EventSink) {
        lock_state(&self.state).sink = Some(sink);
    }

    fn connect(&mut self) -> bool {
        let mut state = lock_state(&self.state);
        state.connect_calls += 1;
        state.connected = state.connect_ok;
        state.connect_ok
    }

    fn disconnect(&mut self) {
        lock_state(&self.state).connected = false;
    }

    fn send_text(&mut self, text: &str) {
        let mut state = lock_state(&self.state);
        if state.connected {
            state.sent.push(text.to_string());
        }
    }
}

impl MockChannelHandle {
    pub fn deliver_text(&self, text: &str) {
        self.deliver(ChannelEvent::Frame(Frame::text(text)));
    }

    pub fn deliver_frame(&self, frame: Frame) {
        self.deliver(ChannelEvent::Frame(frame));
    }

    pub fn drop_connection(&self) {
        self.deliver(ChannelEvent::Disconnected);
    }

    pub fn sent(&self) -> Vec<String> {
        lock_state(&self.state).sent.clone()
    }

    pub fn clear_sent(&self) {
        lock_state(&self.state).sent.clear();
    }

    pub fn connect_calls(&self) -> u32 {
        lock_state(&self.state).connect_calls
    }

    pub fn refuse_connects(&self) {
        lock_state(&self.state).connect_ok = false;
    }

    fn deliver(&self, event: ChannelEvent) {
        let state = lock_state(&self.state);
        if let Some(sink) = &state.sink {
            sink(event);
        }
    }
}

#[derive(Default)]
struct MockFetcherState {
    response: Option<(u16, String)>,
    requests: Vec<String>,
}

/// Scripted [`TokenFetcher`]: answers every fetch with one canned
/// response, or leaves it forever pending when none is set.
pub struct MockFetcher {
    state: Arc<Mutex<MockFetcherState>>,
}

#[derive(Clone)]
pub struct MockFetcherHandle {
    state: Arc<Mutex<MockFetcherState>>,
}

pub fn mock_fetcher(response: Option<(u16, &str)>) -> (Box<dyn TokenFetcher>, MockFetcherHandle) {
    let state = Arc::new(Mutex::new(MockFetcherState {
        response: response.map(|(status, body)| (status, body.to_string())),
        requests: Vec::new(),
    }));
    (
        Box::new(MockFetcher {
            state: Arc::clone(&state),
        }),
        MockFetcherHandle { state },
    )
}

impl TokenFetcher for MockFetcher {
    fn fetch(&self, url: &str, on_result: FetchCallback) {
        let response = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.requests.push(url.to_string());
            state.response.clone()
        };
        if let Some((status, body)) = response {
            on_result(status, body);
        }
    }
}

impl MockFetcherHandle {
    pub fn requests(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .requests
            .clone()
    }
}
