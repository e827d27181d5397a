// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol for the realtime-database session.
//!
//! Every message is a JSON envelope `{"t": kind, "d": body}`. Kind `"c"`
//! carries session-lifecycle (control) commands, kind `"d"` carries data
//! commands: acknowledged client requests and server-pushed tree updates.
//! The layouts here are fixed by the remote service; do not reshape them.

use serde_json::{json, Value};

/// The keepalive text frame, sent verbatim at a fixed interval.
pub const KEEPALIVE_FRAME: &str = "0";

/// Acknowledgment status reported for a successful request.
pub const STATUS_OK: &str = "ok";

/// Actions carried in the `"a"` field of an outbound data command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Client info / version announcement (`"s"`).
    Stats,
    /// Publish a value at a path (`"p"`).
    Put,
    /// Register for updates below a path (`"q"`).
    Listen,
    /// Present a credential (`"auth"`).
    Auth,
}

impl Action {
    /// The wire spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Stats => "s",
            Action::Put => "p",
            Action::Listen => "q",
            Action::Auth => "auth",
        }
    }
}

/// An outbound data command: `{"t":"d","d":{"r":<id>,"a":<action>,"b":<body>}}`.
///
/// The request id correlates the server's acknowledgment; ids are assigned
/// by the client and strictly increase within a connection instance.
#[derive(Debug, Clone)]
pub struct DataCommand {
    pub request_id: u64,
    pub action: Action,
    pub body: Value,
}

impl DataCommand {
    pub fn new(request_id: u64, action: Action, body: Value) -> Self {
        DataCommand {
            request_id,
            action,
            body,
        }
    }

    /// Serializes the full envelope to compact JSON.
    pub fn to_json(&self) -> String {
        json!({
            "t": "d",
            "d": {
                "r": self.request_id,
                "a": self.action.as_str(),
                "b": self.body,
            },
        })
        .to_string()
    }
}

/// Body for the client-info announcement sent after the session handshake.
pub fn client_info_body() -> Value {
    json!({"c": {"espcxx": 1}})
}

/// Body for publishing `value` at `path`.
pub fn publish_body(path: &str, value: &Value) -> Value {
    json!({"p": path, "d": value})
}

/// Body for registering a listen on `path`.
pub fn listen_body(path: &str) -> Value {
    json!({"p": path, "h": ""})
}

/// Body presenting an id token as the session credential.
pub fn auth_body(token: &str) -> Value {
    json!({"cred": token})
}

/// How a server push applies to the local tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushAction {
    /// `"d"`: the subtree at the path is replaced.
    Replace,
    /// `"m"`: the body's keys are independent overwrites below the path.
    Merge,
}

/// A parsed inbound server command.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerCommand {
    /// Control hello: the session is up. Carries the serving host and,
    /// when present, a session id.
    Hello {
        host: String,
        session_id: Option<String>,
    },
    /// Control reset: the server wants the client to reconnect.
    Reset,
    /// Acknowledgment of an outbound request.
    Ack {
        request_id: u64,
        status: String,
        data: Value,
    },
    /// Server-initiated tree update.
    Push {
        action: PushAction,
        path: String,
        data: Value,
    },
}

impl ServerCommand {
    /// Parses a raw text frame.
    ///
    /// Returns `None` for malformed JSON, unknown envelope kinds, and
    /// commands missing required fields; callers drop such frames.
    pub fn parse(text: &str) -> Option<ServerCommand> {
        let frame: Value = serde_json::from_str(text).ok()?;
        let body = frame.get("d")?;
        match frame.get("t")?.as_str()? {
            "c" => parse_control(body),
            "d" => parse_data(body),
            _ => None,
        }
    }
}

fn parse_control(body: &Value) -> Option<ServerCommand> {
    match body.get("t")?.as_str()? {
        "h" => {
            let data = body.get("d")?;
            let host = data.get("h")?.as_str()?.to_string();
            let session_id = data.get("s").and_then(Value::as_str).map(str::to_string);
            Some(ServerCommand::Hello { host, session_id })
        }
        "r" => Some(ServerCommand::Reset),
        _ => None,
    }
}

fn parse_data(body: &Value) -> Option<ServerCommand> {
    // A request id marks the body as a response to one of our commands.
    if let Some(request_id) = body.get("r").and_then(Value::as_u64) {
        let ack = body.get("b")?;
        let status = ack.get("s")?.as_str()?.to_string();
        let data = ack.get("d").cloned().unwrap_or(Value::Null);
        return Some(ServerCommand::Ack {
            request_id,
            status,
            data,
        });
    }

    let action = match body.get("a")?.as_str()? {
        "d" => PushAction::Replace,
        "m" => PushAction::Merge,
        _ => return None,
    };
    let push = body.get("b")?;
    let path = push.get("p")?.as_str()?.to_string();
    let data = push.get("d").cloned().unwrap_or(Value::Null);
    Some(ServerCommand::Push { action, path, data })
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
