// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

#[test]
fn text_messages_map_to_text_frames() {
    let frame = frame_from_message(&Message::Text("{\"t\":\"c\"}".into())).unwrap();
    assert_eq!(frame, Frame::text("{\"t\":\"c\"}"));
}

#[test]
fn control_messages_keep_their_opcodes() {
    let ping = frame_from_message(&Message::Ping(Vec::new().into())).unwrap();
    assert_eq!(ping.opcode, FrameOpcode::Ping);

    let pong = frame_from_message(&Message::Pong(Vec::new().into())).unwrap();
    assert_eq!(pong.opcode, FrameOpcode::Pong);

    let close = frame_from_message(&Message::Close(None)).unwrap();
    assert_eq!(close.opcode, FrameOpcode::Close);
}

#[test]
fn binary_messages_map_to_binary_frames() {
    let frame = frame_from_message(&Message::Binary(b"\x01\x02".to_vec().into())).unwrap();
    assert_eq!(frame.opcode, FrameOpcode::Binary);
}

#[test]
fn send_without_connect_is_dropped() {
    let mut channel = WebsocketChannel::new("wss://db.example.com/.ws");
    // No connection; the frame just disappears.
    channel.send_text("0");
}

#[test]
fn connect_without_sink_fails_initiation() {
    let mut channel = WebsocketChannel::new("wss://db.example.com/.ws");
    assert!(!channel.connect());
}
