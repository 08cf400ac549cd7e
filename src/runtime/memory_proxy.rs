//! The remote memory proxy (§4.6.2): on first `tools/list`, discover the
//! upstream service's tools over its own `/mcp` JSON-RPC endpoint, rename
//! them for local exposure, and forward `tools/call` for `cog_mem_*` names
//! verbatim, preserving the upstream session id across calls.

use crate::error::CogError;
use crate::runtime::tools::{rename_remote_tool, RemoteTool};
use serde_json::{json, Value};
use tokio::sync::Mutex;

pub struct MemoryProxy {
    client: reqwest::Client,
    brain_url: String,
    session_id: Mutex<Option<String>>,
    remote_tools: Mutex<Vec<RemoteTool>>,
}

impl MemoryProxy {
    pub fn new(brain_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), brain_url: brain_url.into(), session_id: Mutex::new(None), remote_tools: Mutex::new(Vec::new()) }
    }

    fn endpoint(&self) -> String {
        format!("{}/mcp", self.brain_url.trim_end_matches('/'))
    }

    /// Returns the cached remote tool list, discovering it on first call.
    pub async fn tools(&self) -> Result<Vec<RemoteTool>, CogError> {
        {
            let cached = self.remote_tools.lock().await;
            if !cached.is_empty() {
                return Ok(cached.clone());
            }
        }

        let response = self.rpc_call("tools/list", json!({})).await?;
        let tools_field = response
            .get("tools")
            .and_then(Value::as_array)
            .ok_or_else(|| CogError::RemoteTransportError { reason: "remote tools/list response missing 'tools' array".to_string() })?;

        let mut discovered = Vec::new();
        for tool in tools_field {
            let remote_name = tool.get("name").and_then(Value::as_str).unwrap_or_default().to_string();
            let description = tool.get("description").and_then(Value::as_str).unwrap_or_default().to_string();
            let input_schema = tool.get("inputSchema").cloned().unwrap_or_else(|| json!({}));
            discovered.push(rename_remote_tool(&remote_name, &description, input_schema));
        }

        let mut cached = self.remote_tools.lock().await;
        *cached = discovered.clone();
        Ok(discovered)
    }

    /// Forward a `tools/call` for `local_name` (already renamed to
    /// `cog_mem_*`) to whichever remote tool it maps to, returning the
    /// single text content extracted from the result (§4.6.2).
    pub async fn call_tool(&self, local_name: &str, arguments: Value) -> Result<String, CogError> {
        let tools = self.tools().await?;
        let remote_name = tools
            .iter()
            .find(|t| t.local_name == local_name)
            .map(|t| t.remote_name.clone())
            .ok_or_else(|| CogError::RemoteTransportError { reason: format!("no remote tool maps to '{local_name}'") })?;

        let response = self.rpc_call("tools/call", json!({"name": remote_name, "arguments": arguments})).await?;
        extract_text_content(&response)
    }

    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, CogError> {
        let session_id = { self.session_id.lock().await.clone() };

        let body = json!({"jsonrpc": "2.0", "id": 1, "method": method, "params": params});
        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(id) = &session_id {
            request = request.header("Mcp-Session-Id", id);
        }

        let http_response = request.send().await.map_err(|e| CogError::RemoteTransportError { reason: e.to_string() })?;

        if let Some(id) = http_response.headers().get("Mcp-Session-Id").and_then(|v| v.to_str().ok()) {
            *self.session_id.lock().await = Some(id.to_string());
        }

        let envelope: Value = http_response.json().await.map_err(|e| CogError::RemoteTransportError { reason: e.to_string() })?;

        if let Some(error) = envelope.get("error") {
            let message = error.get("message").and_then(Value::as_str).unwrap_or("remote memory service error");
            return Err(CogError::RemoteTransportError { reason: message.to_string() });
        }

        envelope.get("result").cloned().ok_or_else(|| CogError::RemoteTransportError { reason: "remote response missing 'result'".to_string() })
    }
}

fn extract_text_content(result: &Value) -> Result<String, CogError> {
    result
        .get("content")
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .and_then(|item| item.get("text"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| CogError::RemoteTransportError { reason: "remote tool result missing text content".to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_text_content_reads_the_first_text_block() {
        let result = json!({"content": [{"type": "text", "text": "hello"}]});
        assert_eq!(extract_text_content(&result).unwrap(), "hello");
    }

    #[test]
    fn extract_text_content_errors_on_missing_content() {
        let result = json!({});
        assert!(extract_text_content(&result).is_err());
    }

    #[test]
    fn endpoint_strips_a_trailing_slash() {
        let proxy = MemoryProxy::new("http://localhost:9000/");
        assert_eq!(proxy.endpoint(), "http://localhost:9000/mcp");
    }
}
