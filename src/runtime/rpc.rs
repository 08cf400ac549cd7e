//! JSON-RPC 2.0 message types and a brace-depth-tolerant NDJSON framer
//! (§4.6.1, §6). Messages are ordinary newline-delimited JSON, but the
//! framer doesn't actually require the newline — it tracks brace depth
//! and emits a message as soon as one complete JSON value closes, which
//! also tolerates a client that closes stdin after its last message
//! without a trailing `\n`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl Request {
    /// A notification carries no `id` and never receives a response.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), data: None }
    }

    pub fn with_data(code: i64, message: impl Into<String>, data: Value) -> Self {
        Self { code, message: message.into(), data: Some(data) }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Self { jsonrpc: "2.0", id, result: Some(result), error: None }
    }

    pub fn failure(id: Value, error: RpcError) -> Self {
        Self { jsonrpc: "2.0", id, result: None, error: Some(error) }
    }
}

/// Accumulates raw bytes and emits complete JSON-RPC messages as soon as
/// their top-level braces balance, regardless of whether a `\n` followed.
#[derive(Debug, Default)]
pub struct MessageFramer {
    buf: String,
}

impl MessageFramer {
    pub fn new() -> Self {
        Self { buf: String::new() }
    }

    /// Feed newly-read input and drain every complete message it unlocks.
    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        self.buf.push_str(chunk);
        self.drain()
    }

    fn drain(&mut self) -> Vec<String> {
        let mut messages = Vec::new();
        loop {
            match self.buf.find(|c: char| !c.is_whitespace()) {
                None => {
                    self.buf.clear();
                    break;
                }
                Some(0) => {}
                Some(start) => {
                    self.buf.drain(..start);
                }
            }

            match find_complete_object_end(&self.buf) {
                Some(end) => {
                    let message = self.buf[..end].to_string();
                    self.buf.drain(..end);
                    messages.push(message);
                }
                None => break,
            }
        }
        messages
    }
}

/// Scan from the start of `s` for a balanced `{...}` value, respecting
/// string/escape state so braces inside string literals don't count.
/// Returns the byte offset just past the closing brace.
fn find_complete_object_end(s: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    let mut started = false;

    for (i, ch) in s.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => {
                depth += 1;
                started = true;
            }
            '}' => {
                depth -= 1;
                if started && depth == 0 {
                    return Some(i + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_two_newline_delimited_messages() {
        let mut framer = MessageFramer::new();
        let out = framer.feed("{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n");
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn accepts_a_trailing_message_with_no_newline() {
        let mut framer = MessageFramer::new();
        let out = framer.feed("{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}");
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn incomplete_message_stays_buffered() {
        let mut framer = MessageFramer::new();
        let out = framer.feed("{\"jsonrpc\":\"2.0\",\"id\":1");
        assert!(out.is_empty());
        let out = framer.feed(",\"method\":\"ping\"}\n");
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn braces_inside_string_values_do_not_affect_depth() {
        let mut framer = MessageFramer::new();
        let out = framer.feed("{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/call\",\"params\":{\"text\":\"{}\"}}\n");
        assert_eq!(out.len(), 1);
    }
}
