// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! cinder-core: data model and wire protocol for the cinder sync client.
//!
//! This crate provides the pure pieces of the client: the path-addressed
//! document tree, the wire-envelope builders and parser, and the reconnect
//! backoff calculator. The runtime (scheduler, channel, state machine)
//! lives in cinder-sync.

pub mod backoff;
pub mod document;
pub mod error;
pub mod protocol;

pub use backoff::Backoff;
pub use document::DocumentTree;
pub use error::{Error, Result};
pub use protocol::{Action, DataCommand, PushAction, ServerCommand};
