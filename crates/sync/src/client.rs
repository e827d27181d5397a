// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The synchronization protocol state machine.
//!
//! `SyncClient` keeps a local path-addressed JSON tree converged with the
//! remote database: it drives the session handshake, keepalive, credential
//! refresh, and listen registration, applies server-pushed tree diffs, and
//! schedules backoff-governed reconnects. Everything runs as closures on
//! the [`EventScheduler`] loop; the channel and fetcher collaborators hand
//! their results to the loop through it.
//!
//! Writes are optimistic: [`SyncClient::publish`] applies locally first and
//! the wire send is best effort. A write racing a disconnect is not queued
//! or rolled back — the tree reconverges from server pushes after the next
//! listen registration.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use cinder_core::document::DocumentTree;
use cinder_core::protocol::{self, Action, DataCommand, PushAction, ServerCommand};
use cinder_core::Backoff;

use crate::channel::{Channel, ChannelEvent, Frame, FrameOpcode};
use crate::config::Config;
use crate::error::Result;
use crate::fetch::{HttpTokenFetcher, TokenFetcher};
use crate::scheduler::EventScheduler;
use crate::websocket::WebsocketChannel;

/// Credential refresh runs this long before the reported token expiry.
const AUTH_REFRESH_MARGIN: Duration = Duration::from_secs(120);

/// Connection lifecycle. `Connected` and `Reconnecting` are mutually
/// exclusive by construction; the authenticated/listening capabilities are
/// independent flags next to this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Cancellation token for self-rescheduling timers.
///
/// A timer captures the epoch current at schedule time; once a disconnect
/// or reconnect bumps the client's epoch the timer is a no-op. This is the
/// sole cancellation mechanism — closures already handed to the scheduler
/// cannot be withdrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Epoch(u64);

type UpdateHandler = Box<dyn FnMut() + Send>;
type AuthHandler = Box<dyn FnMut(bool) + Send>;

/// Handle to the protocol state machine. Clones share one client.
#[derive(Clone)]
pub struct SyncClient {
    inner: Arc<Mutex<ClientInner>>,
}

struct ClientInner {
    config: Config,
    scheduler: EventScheduler,
    channel: Box<dyn Channel>,
    fetcher: Box<dyn TokenFetcher>,
    tree: DocumentTree,
    backoff: Backoff,

    link: LinkState,
    authenticated: bool,
    listening: bool,
    epoch: Epoch,

    request_seq: u64,
    auth_request: Option<u64>,
    listen_request: Option<u64>,

    real_host: Option<String>,
    session_id: Option<String>,

    on_update: Option<UpdateHandler>,
    on_auth: Option<AuthHandler>,

    weak_self: Weak<Mutex<ClientInner>>,
}

impl SyncClient {
    /// Creates a client with the production WebSocket channel and HTTP
    /// token fetcher.
    pub fn new(config: Config, scheduler: EventScheduler) -> Self {
        let channel = Box::new(WebsocketChannel::new(config.ws_url()));
        Self::with_collaborators(config, scheduler, channel, Box::new(HttpTokenFetcher::new()))
    }

    /// Creates a client over explicit collaborators, e.g. scripted doubles
    /// in tests. The channel's event sink is installed here; events are
    /// marshaled onto the scheduler loop before they touch client state.
    pub fn with_collaborators(
        config: Config,
        scheduler: EventScheduler,
        mut channel: Box<dyn Channel>,
        fetcher: Box<dyn TokenFetcher>,
    ) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<Mutex<ClientInner>>| {
            let sink_weak = weak.clone();
            let sink_scheduler = scheduler.clone();
            channel.set_event_sink(Box::new(move |event| {
                let weak = sink_weak.clone();
                sink_scheduler.run_now(move || {
                    if let Some(inner) = weak.upgrade() {
                        lock_inner(&inner).on_channel_event(event);
                    }
                });
            }));

            let backoff = Backoff::new(config.reconnect_base_ms, config.reconnect_max_ms);
            Mutex::new(ClientInner {
                config,
                scheduler,
                channel,
                fetcher,
                tree: DocumentTree::new(),
                backoff,
                link: LinkState::Disconnected,
                authenticated: false,
                listening: false,
                epoch: Epoch(0),
                request_seq: 0,
                auth_request: None,
                listen_request: None,
                real_host: None,
                session_id: None,
                on_update: None,
                on_auth: None,
                weak_self: weak.clone(),
            })
        });
        SyncClient { inner }
    }

    /// Starts a connection attempt.
    pub fn connect(&self) {
        self.lock().connect();
    }

    /// Tears the session down. In-flight timers become no-ops.
    pub fn disconnect(&self) {
        self.lock().disconnect();
    }

    /// Forces a backoff-delayed reconnect. No-op while one is pending.
    pub fn reconnect(&self) {
        self.lock().reconnect();
    }

    /// Applies `value` at `path` locally and best-effort publishes it.
    pub fn publish(&self, path: &str, value: Value) -> Result<()> {
        self.lock().publish(path, value)
    }

    /// Returns a snapshot of the subtree at `path`.
    pub fn get(&self, path: &str) -> Option<Value> {
        self.lock().tree.get(path).cloned()
    }

    /// Registers a callback invoked after each applied server push.
    pub fn set_update_handler(&self, handler: impl FnMut() + Send + 'static) {
        self.lock().on_update = Some(Box::new(handler));
    }

    /// Registers a callback invoked with each authentication outcome.
    pub fn set_auth_handler(&self, handler: impl FnMut(bool) + Send + 'static) {
        self.lock().on_auth = Some(Box::new(handler));
    }

    pub fn link_state(&self) -> LinkState {
        self.lock().link
    }

    pub fn is_connected(&self) -> bool {
        self.lock().link == LinkState::Connected
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().authenticated
    }

    pub fn is_listening(&self) -> bool {
        self.lock().listening
    }

    /// The host the server reported in its hello, once connected.
    pub fn real_host(&self) -> Option<String> {
        self.lock().real_host.clone()
    }

    /// The session id from the server's hello, when one was given.
    pub fn session_id(&self) -> Option<String> {
        self.lock().session_id.clone()
    }

    fn lock(&self) -> MutexGuard<'_, ClientInner> {
        lock_inner(&self.inner)
    }
}

fn lock_inner(inner: &Arc<Mutex<ClientInner>>) -> MutexGuard<'_, ClientInner> {
    // The client is logically single-threaded: state is only touched from
    // loop-thread closures, so the lock is uncontended by design.
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ClientInner {
    fn connect(&mut self) {
        self.link = LinkState::Connecting;
        self.authenticated = false;
        self.listening = false;
        self.auth_request = None;
        self.listen_request = None;
        self.real_host = None;
        self.session_id = None;
        info!("connecting to {}", self.config.host);
        if !self.channel.connect() {
            warn!("connection initiation failed");
            self.reconnect();
        }
    }

    fn disconnect(&mut self) {
        self.epoch = Epoch(self.epoch.0 + 1);
        self.channel.disconnect();
        self.link = LinkState::Disconnected;
        self.authenticated = false;
        self.listening = false;
        self.auth_request = None;
        self.listen_request = None;
    }

    fn reconnect(&mut self) {
        if self.link == LinkState::Reconnecting {
            return;
        }
        self.disconnect();
        self.link = LinkState::Reconnecting;
        let delay = self.backoff.next_delay();
        info!("reconnecting in {}ms", delay.as_millis());
        self.run_gated(delay, |client| client.connect());
    }

    fn on_channel_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Frame(frame) => self.on_frame(frame),
            ChannelEvent::Disconnected => {
                if self.link != LinkState::Disconnected {
                    info!("channel dropped");
                    self.reconnect();
                }
            }
        }
    }

    fn on_frame(&mut self, frame: Frame) {
        match frame.opcode {
            FrameOpcode::Text => self.on_text_frame(&frame.payload),
            FrameOpcode::Close => {
                if self.link != LinkState::Disconnected {
                    info!("close frame received");
                    self.reconnect();
                }
            }
            // Transport-level control traffic; the channel answers pings.
            FrameOpcode::Binary
            | FrameOpcode::Ping
            | FrameOpcode::Pong
            | FrameOpcode::Continuation => {}
        }
    }

    fn on_text_frame(&mut self, text: &str) {
        debug!("frame: {text}");
        let Some(command) = ServerCommand::parse(text) else {
            warn!("dropping unrecognized frame");
            return;
        };
        match command {
            ServerCommand::Hello { host, session_id } => self.on_hello(host, session_id),
            ServerCommand::Reset => {
                info!("server requested reset");
                self.reconnect();
            }
            ServerCommand::Ack {
                request_id, status, ..
            } => self.on_ack(request_id, &status),
            ServerCommand::Push { action, path, data } => self.on_push(action, &path, data),
        }
    }

    /// The session is up: announce the client, start keepalive, and begin
    /// the auth-or-listen sequence.
    fn on_hello(&mut self, host: String, session_id: Option<String>) {
        info!("session established with {host}");
        self.real_host = Some(host);
        self.session_id = session_id;
        self.link = LinkState::Connected;
        self.backoff.reset();

        self.send_client_info();
        self.send_keepalive();
        if self.config.token_url().is_some() {
            self.refresh_auth();
        } else {
            self.send_listen();
        }
    }

    fn on_ack(&mut self, request_id: u64, status: &str) {
        let ok = status == protocol::STATUS_OK;
        if self.auth_request == Some(request_id) {
            self.auth_request = None;
            self.authenticated = ok;
            if !ok {
                warn!("authentication rejected: {status}");
            }
            if let Some(on_auth) = self.on_auth.as_mut() {
                on_auth(ok);
            }
        } else if self.listen_request == Some(request_id) {
            self.listen_request = None;
            self.listening = ok;
            if !ok {
                warn!("listen rejected: {status}");
            }
        } else {
            debug!("ack for untracked request {request_id}: {status}");
        }
    }

    fn on_push(&mut self, action: PushAction, path: &str, data: Value) {
        let applied = match action {
            PushAction::Replace => self.tree.replace_at(path, data),
            PushAction::Merge => match data {
                Value::Object(updates) => self.tree.merge_at(path, updates),
                _ => {
                    warn!("merge push without object body at {path}");
                    return;
                }
            },
        };
        match applied {
            Ok(()) => {
                if let Some(on_update) = self.on_update.as_mut() {
                    on_update();
                }
            }
            Err(err) => warn!("dropping server push at {path}: {err}"),
        }
    }

    fn publish(&mut self, path: &str, value: Value) -> Result<()> {
        let body = protocol::publish_body(path, &value);
        self.tree.replace_at(path, value)?;
        self.send_data_command(Action::Put, body);
        Ok(())
    }

    /// Sends `text` when the session is up. Dropped otherwise.
    fn send(&mut self, text: &str) -> bool {
        if self.link != LinkState::Connected {
            return false;
        }
        self.channel.send_text(text);
        true
    }

    /// Wraps `body` in a data envelope and sends it, returning the request
    /// id when the send went out.
    fn send_data_command(&mut self, action: Action, body: Value) -> Option<u64> {
        self.request_seq += 1;
        let command = DataCommand::new(self.request_seq, action, body);
        if self.send(&command.to_json()) {
            Some(command.request_id)
        } else {
            None
        }
    }

    fn send_client_info(&mut self) {
        self.send_data_command(Action::Stats, protocol::client_info_body());
    }

    /// Sends a keepalive and reschedules itself for the configured
    /// interval; a reconnect in between breaks the chain via the epoch.
    fn send_keepalive(&mut self) {
        debug!("keepalive");
        self.send(protocol::KEEPALIVE_FRAME);
        let interval = Duration::from_millis(self.config.keepalive_ms);
        self.run_gated(interval, |client| client.send_keepalive());
    }

    fn send_listen(&mut self) {
        info!("subscribing to {}", self.config.listen_path);
        let body = protocol::listen_body(&self.config.listen_path);
        self.listen_request = self.send_data_command(Action::Listen, body);
    }

    fn send_listen_if_needed(&mut self) {
        if !self.listening && self.listen_request.is_none() {
            self.send_listen();
        }
    }

    /// Fetches a fresh id token and, once it arrives, presents it and
    /// schedules the next refresh shortly before expiry.
    fn refresh_auth(&mut self) {
        let Some(url) = self.config.token_url() else {
            return;
        };
        info!("fetching auth token");
        let weak = self.weak_self.clone();
        let scheduler = self.scheduler.clone();
        let token = self.epoch;
        self.fetcher.fetch(
            &url,
            Box::new(move |status, body| {
                scheduler.run_now(move || {
                    if let Some(inner) = weak.upgrade() {
                        let mut client = lock_inner(&inner);
                        if client.epoch == token {
                            client.on_auth_response(status, &body);
                        }
                    }
                });
            }),
        );
    }

    fn on_auth_response(&mut self, status: u16, body: &str) {
        let Some((id_token, expires_in)) = parse_token_response(status, body) else {
            // Not retried until the next full reconnect.
            warn!("auth token fetch failed (status {status}); refresh abandoned");
            return;
        };
        self.auth_request = self.send_data_command(Action::Auth, protocol::auth_body(&id_token));
        self.send_listen_if_needed();
        let refresh_in = expires_in.saturating_sub(AUTH_REFRESH_MARGIN);
        self.run_gated(refresh_in, |client| client.refresh_auth());
    }

    /// Schedules `action` after `delay`, skipped if the epoch has moved on
    /// by the time it fires.
    fn run_gated(&self, delay: Duration, action: impl FnOnce(&mut ClientInner) + Send + 'static) {
        let token = self.epoch;
        let weak = self.weak_self.clone();
        self.scheduler.run_delayed(delay, move || {
            if let Some(inner) = weak.upgrade() {
                let mut client = lock_inner(&inner);
                if client.epoch == token {
                    action(&mut client);
                }
            }
        });
    }
}

fn parse_token_response(status: u16, body: &str) -> Option<(String, Duration)> {
    if !(200..300).contains(&status) {
        return None;
    }
    let json: Value = serde_json::from_str(body).ok()?;
    let id_token = json.get("id_token")?.as_str()?.to_string();
    let expires_in = json.get("expires_in")?.as_u64()?;
    Some((id_token, Duration::from_secs(expires_in)))
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
