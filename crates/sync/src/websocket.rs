// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Production WebSocket channel.
//!
//! Each connection runs on a dedicated I/O thread with a current-thread
//! tokio runtime, keeping the cooperative loop free of async plumbing.
//! Outbound texts flow through an unbounded channel; inbound frames and
//! the disconnect notification flow out through the installed event sink.

use std::sync::Arc;
use std::thread;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use crate::channel::{Channel, ChannelEvent, EventSink, Frame, FrameOpcode};

enum Outbound {
    Text(String),
    Close,
}

/// WebSocket implementation of [`Channel`].
pub struct WebsocketChannel {
    url: String,
    sink: Option<Arc<EventSink>>,
    outbound: Option<mpsc::UnboundedSender<Outbound>>,
}

impl WebsocketChannel {
    /// Creates a channel for `url` (`ws://` or `wss://`). Nothing happens
    /// until [`Channel::connect`].
    pub fn new(url: impl Into<String>) -> Self {
        WebsocketChannel {
            url: url.into(),
            sink: None,
            outbound: None,
        }
    }
}

impl Channel for WebsocketChannel {
    fn set_event_sink(&mut self, sink: EventSink) {
        self.sink = Some(Arc::new(sink));
    }

    fn connect(&mut self) -> bool {
        let Some(sink) = self.sink.clone() else {
            warn!("websocket connect without an event sink");
            return false;
        };
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                warn!("websocket runtime setup failed: {err}");
                return false;
            }
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let url = self.url.clone();
        thread::Builder::new()
            .name("cinder-ws".to_string())
            .spawn(move || runtime.block_on(io_loop(url, rx, sink)))
            .map(|_| {
                self.outbound = Some(tx);
                true
            })
            .unwrap_or(false)
    }

    fn disconnect(&mut self) {
        if let Some(tx) = self.outbound.take() {
            let _ = tx.send(Outbound::Close);
        }
    }

    fn send_text(&mut self, text: &str) {
        if let Some(tx) = &self.outbound {
            let _ = tx.send(Outbound::Text(text.to_string()));
        }
    }
}

async fn io_loop(url: String, mut rx: mpsc::UnboundedReceiver<Outbound>, sink: Arc<EventSink>) {
    let stream = match connect_async(&url).await {
        Ok((stream, _response)) => stream,
        Err(err) => {
            warn!("websocket connect to {url} failed: {err}");
            sink(ChannelEvent::Disconnected);
            return;
        }
    };
    debug!("websocket connected to {url}");
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            command = rx.recv() => match command {
                Some(Outbound::Text(text)) => {
                    if write.send(Message::Text(text.into())).await.is_err() {
                        sink(ChannelEvent::Disconnected);
                        return;
                    }
                }
                // Local teardown: close quietly, no Disconnected event.
                Some(Outbound::Close) | None => {
                    let _ = write.send(Message::Close(None)).await;
                    return;
                }
            },
            message = read.next() => match message {
                Some(Ok(message)) => {
                    if let Some(frame) = frame_from_message(&message) {
                        sink(ChannelEvent::Frame(frame));
                    }
                }
                Some(Err(err)) => {
                    debug!("websocket read error: {err}");
                    sink(ChannelEvent::Disconnected);
                    return;
                }
                None => {
                    sink(ChannelEvent::Disconnected);
                    return;
                }
            },
        }
    }
}

fn frame_from_message(message: &Message) -> Option<Frame> {
    match message {
        Message::Text(text) => Some(Frame::text(text.to_string())),
        Message::Binary(data) => Some(Frame {
            opcode: FrameOpcode::Binary,
            payload: String::from_utf8_lossy(data).into_owned(),
        }),
        Message::Ping(_) => Some(Frame {
            opcode: FrameOpcode::Ping,
            payload: String::new(),
        }),
        Message::Pong(_) => Some(Frame {
            opcode: FrameOpcode::Pong,
            payload: String::new(),
        }),
        Message::Close(_) => Some(Frame {
            opcode: FrameOpcode::Close,
            payload: String::new(),
        }),
        // Raw continuation frames are reassembled by the library.
        Message::Frame(_) => None,
    }
}

#[cfg(test)]
#[path = "websocket_tests.rs"]
mod tests;
