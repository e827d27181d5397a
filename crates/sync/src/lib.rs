// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! cinder-sync: cooperative runtime and protocol client.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐ closures  ┌────────────────┐
//! │ SyncClient │──────────►│ EventScheduler │  (single loop thread)
//! └────────────┘           └────────────────┘
//!       │ owns                     ▲ run_now + wake
//!       ▼                          │
//! ┌────────────┐  events   ┌───────┴─────────┐
//! │  Channel   │──────────►│ I/O threads     │
//! │  Fetcher   │           │ (ws, http)      │
//! └────────────┘           └─────────────────┘
//! ```
//!
//! Protocol state lives on the scheduler's loop thread; the channel and
//! fetcher collaborators run their own I/O and hand results to the loop by
//! registering closures. Swapping the collaborators for scripted doubles
//! makes the whole state machine testable without a network.

pub mod channel;
pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod scheduler;
pub mod websocket;

pub use channel::{Channel, ChannelEvent, EventSink, Frame, FrameOpcode};
pub use client::{LinkState, SyncClient};
pub use config::{AuthConfig, Config};
pub use error::{Error, Result};
pub use fetch::{FetchCallback, HttpTokenFetcher, TokenFetcher};
pub use scheduler::EventScheduler;
pub use websocket::WebsocketChannel;

#[cfg(test)]
mod test_helpers;
