// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Duplex text channel consumed by the sync client.
//!
//! The trait is deliberately narrow so a scripted double can stand in for
//! the production WebSocket during tests. Implementations deliver inbound
//! traffic through an installed event sink; the sink may be invoked from
//! the channel's I/O context, so receivers marshal onto their own loop.

/// RFC 6455 frame opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOpcode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
}

/// A single inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub opcode: FrameOpcode,
    pub payload: String,
}

impl Frame {
    pub fn text(payload: impl Into<String>) -> Self {
        Frame {
            opcode: FrameOpcode::Text,
            payload: payload.into(),
        }
    }
}

/// Events delivered by a channel implementation.
#[derive(Debug)]
pub enum ChannelEvent {
    /// A frame arrived.
    Frame(Frame),
    /// The transport dropped. No further frames until the next
    /// [`Channel::connect`]. Not emitted for a local
    /// [`Channel::disconnect`].
    Disconnected,
}

/// Callback receiving channel events.
pub type EventSink = Box<dyn Fn(ChannelEvent) + Send + Sync>;

/// A duplex text transport.
pub trait Channel: Send {
    /// Installs the event callback. Must be called before
    /// [`Channel::connect`].
    fn set_event_sink(&mut self, sink: EventSink);

    /// Starts connecting. Returns false if initiation itself failed; the
    /// session is only up once the server's hello arrives as a frame.
    fn connect(&mut self) -> bool;

    /// Tears down the connection. `connect` may be called again after.
    fn disconnect(&mut self);

    /// Sends a text frame. Silently drops it when not connected.
    fn send_text(&mut self, text: &str);
}
