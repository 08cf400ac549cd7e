//! The stdio MCP server (§4.6.1, §5): a single cooperative loop over
//! stdin, the filesystem watcher's channel, and a 250ms tick, backed by a
//! [`Runtime`] that owns the lazily-loaded, cache-after-every-write Index.

use crate::config::Settings;
use crate::error::{CogError, IndexResult};
use crate::explore::{self, ExploreOutcome, ExploreQuery};
use crate::index::{decoded::CodeIndex, Index};
use crate::indexing::LanguageRegistry;
use crate::query;
use crate::runtime::memory_proxy::MemoryProxy;
use crate::runtime::mutations;
use crate::runtime::rpc::{self, MessageFramer, Request, Response, RpcError};
use crate::runtime::tools::{self, RemoteTool};
use crate::runtime::watcher;
use crate::storage;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;

struct Cache {
    index: Index,
    decoded: CodeIndex,
}

/// Everything the server loop and tool dispatch need: the project root,
/// the language registry, the lazily-loaded index cache, and an optional
/// memory proxy (§4.6.2, §4.6.3).
pub struct Runtime {
    root: PathBuf,
    registry: LanguageRegistry,
    cache: Mutex<Option<Cache>>,
    memory_proxy: Option<MemoryProxy>,
    shutdown: Arc<AtomicBool>,
}

impl Runtime {
    pub fn new(root: PathBuf, settings: &Settings) -> Self {
        let memory_proxy = settings.mcp.brain_url.clone().map(MemoryProxy::new);
        Self { root, registry: LanguageRegistry::with_defaults(), cache: Mutex::new(None), memory_proxy, shutdown: Arc::new(AtomicBool::new(false)) }
    }

    fn cog_dir(&self) -> PathBuf {
        self.root.join(crate::config::COG_DIR_NAME)
    }

    /// Load the cache on first access; a no-op afterward until explicitly
    /// refreshed (§4.6.3).
    async fn ensure_cache(&self) -> IndexResult<()> {
        let mut guard = self.cache.lock().await;
        if guard.is_none() {
            let index = storage::load(&self.cog_dir())?;
            let decoded = CodeIndex::build(&index);
            *guard = Some(Cache { index, decoded });
        }
        Ok(())
    }

    /// Reload the cache from disk — called after every write-through
    /// mutation, full rebuild since decoding is cheap relative to the I/O
    /// that triggered it (§4.6.3).
    async fn refresh_cache(&self) -> IndexResult<()> {
        let index = storage::load(&self.cog_dir())?;
        let decoded = CodeIndex::build(&index);
        *self.cache.lock().await = Some(Cache { index, decoded });
        Ok(())
    }

    pub async fn run(self: Arc<Self>) -> IndexResult<()> {
        self.ensure_cache().await?;

        let (_watcher_handle, mut watch_rx) = watcher::spawn_watcher(self.root.clone())?;
        let mut framer = MessageFramer::new();
        let mut stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut buf = [0u8; 4096];

        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            tokio::select! {
                read = stdin.read(&mut buf) => {
                    match read {
                        Ok(0) => break,
                        Ok(n) => {
                            let chunk = String::from_utf8_lossy(&buf[..n]);
                            for raw in framer.feed(&chunk) {
                                if let Some(response_text) = self.handle_raw_message(&raw).await {
                                    let _ = stdout.write_all(response_text.as_bytes()).await;
                                    let _ = stdout.write_all(b"\n").await;
                                    let _ = stdout.flush().await;
                                }
                            }
                        }
                        Err(_) => break,
                    }
                }
                changed = watch_rx.recv() => {
                    if let Some(path) = changed {
                        self.handle_watch_event(&path).await;
                    }
                }
                _ = tokio::time::sleep(Duration::from_millis(250)) => {}
            }
        }

        Ok(())
    }

    async fn handle_watch_event(&self, path: &std::path::Path) {
        let Ok(relative) = path.strip_prefix(&self.root) else { return };
        let relative = relative.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect::<Vec<_>>().join("/");
        let result = if path.exists() {
            crate::indexing::reindex_file(&self.root, &relative, &self.registry)
        } else {
            crate::indexing::remove_file(&self.root, &relative).map(|_| ())
        };
        if result.is_ok() {
            let _ = self.refresh_cache().await;
        }
    }

    async fn handle_raw_message(&self, raw: &str) -> Option<String> {
        let request: Request = match serde_json::from_str(raw) {
            Ok(r) => r,
            Err(_) => {
                let response = Response::failure(Value::Null, RpcError::new(rpc::PARSE_ERROR, "Parse error"));
                return Some(serde_json::to_string(&response).unwrap_or_default());
            }
        };

        if request.is_notification() {
            self.handle_notification(&request).await;
            return None;
        }

        let id = request.id.clone().unwrap_or(Value::Null);
        let response = match self.dispatch(&request).await {
            Ok(result) => Response::success(id, result),
            Err(error) => Response::failure(id, error),
        };
        Some(serde_json::to_string(&response).unwrap_or_default())
    }

    async fn handle_notification(&self, request: &Request) {
        match request.method.as_str() {
            "notifications/initialized" | "notifications/cancelled" => {}
            "exit" => self.shutdown.store(true, Ordering::SeqCst),
            _ => {}
        }
    }

    async fn dispatch(&self, request: &Request) -> Result<Value, RpcError> {
        match request.method.as_str() {
            "initialize" => Ok(self.handle_initialize()),
            "shutdown" => {
                self.shutdown.store(true, Ordering::SeqCst);
                Ok(Value::Null)
            }
            "ping" => Ok(json!({})),
            "tools/list" => self.handle_tools_list().await,
            "tools/call" => self.handle_tools_call(request).await,
            "resources/list" => Ok(self.handle_resources_list()),
            "resources/read" => self.handle_resources_read(request).await,
            "prompts/list" => Ok(self.handle_prompts_list()),
            "prompts/get" => Ok(self.handle_prompts_get()),
            _ => Err(RpcError::new(rpc::METHOD_NOT_FOUND, format!("method not found: {}", request.method))),
        }
    }

    fn handle_initialize(&self) -> Value {
        json!({
            "protocolVersion": "2024-11-05",
            "serverInfo": {"name": "cog", "version": env!("CARGO_PKG_VERSION")},
            "capabilities": {"tools": {}, "resources": {}, "prompts": {}},
        })
    }

    async fn remote_tools(&self) -> Vec<RemoteTool> {
        match &self.memory_proxy {
            Some(proxy) => proxy.tools().await.unwrap_or_default(),
            None => Vec::new(),
        }
    }

    async fn handle_tools_list(&self) -> Result<Value, RpcError> {
        let remote = self.remote_tools().await;
        let catalog = tools::catalog(&remote);
        let tools_json: Vec<Value> = catalog
            .into_iter()
            .map(|t| json!({"name": t.name, "description": t.description, "inputSchema": t.input_schema}))
            .collect();
        Ok(json!({"tools": tools_json}))
    }

    async fn handle_tools_call(&self, request: &Request) -> Result<Value, RpcError> {
        let params = request.params.clone().unwrap_or(Value::Null);
        let name = params.get("name").and_then(Value::as_str).ok_or_else(|| RpcError::new(rpc::INVALID_PARAMS, "missing 'name'"))?;
        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        let text = match name {
            "cog_code_query" => self.tool_code_query(&arguments).await?,
            "cog_code_status" => self.tool_code_status().await?,
            "cog_code_explore" => self.tool_code_explore(&arguments).await?,
            "cog_code_edit" | "cog_code_create" | "cog_code_delete" | "cog_code_rename" => self.tool_mutation_call(name, &arguments).await?,
            other if other.starts_with("cog_mem_") => self.tool_memory_call(other, arguments).await?,
            other if other.starts_with("cog_debug_") => json!({"ok": true, "tool": other}).to_string(),
            other => return Err(RpcError::new(rpc::METHOD_NOT_FOUND, format!("unknown tool: {other}"))),
        };

        Ok(json!({"content": [{"type": "text", "text": text}]}))
    }

    async fn tool_code_query(&self, arguments: &Value) -> Result<String, RpcError> {
        self.ensure_cache().await.map_err(to_rpc_error)?;
        let guard = self.cache.lock().await;
        let cache = guard.as_ref().expect("ensure_cache populated the cache");

        let mode = arguments.get("mode").and_then(Value::as_str).unwrap_or("find");
        let name = arguments.get("name").and_then(Value::as_str).unwrap_or_default();
        let file = arguments.get("file").and_then(Value::as_str);
        let kind = arguments.get("kind").and_then(Value::as_str);

        let result = match mode {
            "find" => {
                let matches = query::find(&cache.decoded, name, kind, file);
                json!(matches.iter().map(|m| json!({
                    "symbol": m.symbol, "path": m.path, "line": m.line,
                    "kind": format!("{:?}", m.kind), "display_name": m.display_name, "score": m.score,
                })).collect::<Vec<_>>())
            }
            "refs" => match query::refs(&cache.decoded, name, kind) {
                Some((def, entries)) => json!({
                    "symbol": def.symbol, "path": def.path, "line": def.line,
                    "references": entries.iter().map(|r| json!({"path": r.path, "line": r.line, "role": r.role_label})).collect::<Vec<_>>(),
                }),
                None => json!({"error": "Symbol not found"}),
            },
            "symbols" => {
                let file = file.unwrap_or_default();
                let entries = query::symbols(&cache.decoded, file, kind);
                json!(entries.iter().map(|e| json!({
                    "symbol": e.symbol, "kind": format!("{:?}", e.kind), "display_name": e.display_name, "line": e.line,
                })).collect::<Vec<_>>())
            }
            other => return Err(RpcError::new(rpc::INVALID_PARAMS, format!("unknown mode: {other}"))),
        };

        Ok(result.to_string())
    }

    async fn tool_code_status(&self) -> Result<String, RpcError> {
        self.ensure_cache().await.map_err(to_rpc_error)?;
        let guard = self.cache.lock().await;
        let cache = guard.as_ref().expect("ensure_cache populated the cache");
        let status = json!({
            "exists": true,
            "path": self.cog_dir().display().to_string(),
            "documents": cache.index.documents.len(),
            "symbols": cache.decoded.symbol_to_def.len(),
            "project_root": cache.index.metadata.project_root,
        });
        Ok(status.to_string())
    }

    async fn tool_code_explore(&self, arguments: &Value) -> Result<String, RpcError> {
        self.ensure_cache().await.map_err(to_rpc_error)?;
        let guard = self.cache.lock().await;
        let cache = guard.as_ref().expect("ensure_cache populated the cache");

        let context_lines = arguments.get("context_lines").and_then(Value::as_u64).map(|n| n as u32);
        let queries: Vec<ExploreQuery> = arguments
            .get("queries")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|q| ExploreQuery {
                        name: q.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                        kind: q.get("kind").and_then(Value::as_str).map(str::to_string),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let outcomes = explore::explore(&cache.index, &cache.decoded, &queries, context_lines);
        let payload: Vec<Value> = outcomes
            .into_iter()
            .map(|o| match o {
                ExploreOutcome::Found(hit) => json!({
                    "name": hit.name, "symbol": hit.symbol, "path": hit.path, "line": hit.line,
                    "display_name": hit.display_name, "body": hit.body, "truncated": hit.truncated,
                    "retried_pattern": hit.retried_pattern, "cross_references": hit.cross_references,
                    "toc": hit.toc.map(|entries| entries.iter().map(|e| json!({"name": e.name, "kind": format!("{:?}", e.kind), "line": e.line})).collect::<Vec<_>>()),
                }),
                ExploreOutcome::NotFound(err) => json!({"name": err.name, "error": err.error}),
            })
            .collect();

        Ok(json!(payload).to_string())
    }

    async fn tool_mutation_call(&self, name: &str, arguments: &Value) -> Result<String, RpcError> {
        let string_arg = |key: &str| -> Result<String, RpcError> {
            arguments
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| RpcError::new(rpc::INVALID_PARAMS, format!("missing '{key}'")))
        };

        let mutation = match name {
            "cog_code_edit" => Mutation::Edit { path: string_arg("path")?, old_text: string_arg("old_text")?, new_text: string_arg("new_text")? },
            "cog_code_create" => Mutation::Create { path: string_arg("path")?, contents: string_arg("contents")? },
            "cog_code_delete" => Mutation::Delete { path: string_arg("path")? },
            "cog_code_rename" => Mutation::Rename { from: string_arg("from")?, to: string_arg("to")? },
            other => return Err(RpcError::new(rpc::METHOD_NOT_FOUND, format!("unknown tool: {other}"))),
        };

        apply_mutation(self, mutation).await.map_err(to_rpc_error)?;
        Ok(json!({"ok": true}).to_string())
    }

    async fn tool_memory_call(&self, name: &str, arguments: Value) -> Result<String, RpcError> {
        let proxy = self.memory_proxy.as_ref().ok_or_else(|| RpcError::new(rpc::INTERNAL_ERROR, "no remote memory service configured"))?;
        proxy.call_tool(name, arguments).await.map_err(to_rpc_error)
    }

    fn handle_resources_list(&self) -> Value {
        json!({"resources": [
            {"uri": "index/status", "name": "index status"},
            {"uri": "debug/tools", "name": "debug tool list"},
            {"uri": "tools/catalog", "name": "full tool catalog"},
        ]})
    }

    async fn handle_resources_read(&self, request: &Request) -> Result<Value, RpcError> {
        let params = request.params.clone().unwrap_or(Value::Null);
        let uri = params.get("uri").and_then(Value::as_str).ok_or_else(|| RpcError::new(rpc::INVALID_PARAMS, "missing 'uri'"))?;

        let text = match uri {
            "index/status" => self.tool_code_status().await?,
            "tools/catalog" => {
                let remote = self.remote_tools().await;
                json!(tools::catalog(&remote).into_iter().map(|t| t.name).collect::<Vec<_>>()).to_string()
            }
            "debug/tools" => json!([]).to_string(),
            other => return Err(RpcError::new(rpc::INVALID_PARAMS, format!("unknown resource: {other}"))),
        };

        Ok(json!({"contents": [{"uri": uri, "mimeType": "application/json", "text": text}]}))
    }

    fn handle_prompts_list(&self) -> Value {
        json!({"prompts": [{"name": "cog_overview", "description": "Summarize this project's indexed structure"}]})
    }

    fn handle_prompts_get(&self) -> Value {
        json!({"messages": [{"role": "user", "content": {"type": "text", "text": "Summarize this project's indexed structure using cog_code_status and cog_code_explore."}}]})
    }
}

fn to_rpc_error(error: CogError) -> RpcError {
    RpcError::new(rpc::INTERNAL_ERROR, error.to_string())
}

/// Used by the write-through tool handlers (edit/create/delete/rename);
/// kept as free functions so they can also be invoked directly by future
/// CLI commands without going through JSON-RPC.
pub async fn apply_mutation(runtime: &Runtime, mutation: Mutation) -> IndexResult<()> {
    match mutation {
        Mutation::Edit { path, old_text, new_text } => mutations::edit(&runtime.root, &path, &old_text, &new_text, &runtime.registry)?,
        Mutation::Create { path, contents } => mutations::create(&runtime.root, &path, &contents, &runtime.registry)?,
        Mutation::Delete { path } => mutations::delete(&runtime.root, &path)?,
        Mutation::Rename { from, to } => mutations::rename(&runtime.root, &from, &to, &runtime.registry)?,
    }
    runtime.refresh_cache().await
}

pub enum Mutation {
    Edit { path: String, old_text: String, new_text: String },
    Create { path: String, contents: String },
    Delete { path: String },
    Rename { from: String, to: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn initialize_reports_protocol_version_and_capabilities() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = Settings::default();
        let runtime = Runtime::new(dir.path().to_path_buf(), &settings);
        let result = runtime.handle_initialize();
        assert_eq!(result["serverInfo"]["name"], "cog");
    }

    #[tokio::test]
    async fn ping_round_trips_through_dispatch() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = Settings::default();
        let runtime = Runtime::new(dir.path().to_path_buf(), &settings);
        let request = Request { jsonrpc: None, id: Some(json!(1)), method: "ping".to_string(), params: None };
        let result = runtime.dispatch(&request).await.unwrap();
        assert_eq!(result, json!({}));
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = Settings::default();
        let runtime = Runtime::new(dir.path().to_path_buf(), &settings);
        let request = Request { jsonrpc: None, id: Some(json!(1)), method: "nonexistent".to_string(), params: None };
        let err = runtime.dispatch(&request).await.unwrap_err();
        assert_eq!(err.code, rpc::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn create_tool_is_reachable_and_visible_to_the_next_query() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = Settings::default();
        let runtime = Runtime::new(dir.path().to_path_buf(), &settings);

        let create_request = Request {
            jsonrpc: None,
            id: Some(json!(1)),
            method: "tools/call".to_string(),
            params: Some(json!({"name": "cog_code_create", "arguments": {"path": "pkg/a.js", "contents": "export function integrationTestHelper(){}"}})),
        };
        runtime.dispatch(&create_request).await.unwrap();

        let query_request = Request {
            jsonrpc: None,
            id: Some(json!(2)),
            method: "tools/call".to_string(),
            params: Some(json!({"name": "cog_code_query", "arguments": {"mode": "find", "name": "integrationTestHelper"}})),
        };
        let result = runtime.dispatch(&query_request).await.unwrap();
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("integrationTestHelper"));
    }

    #[tokio::test]
    async fn catalog_advertises_the_write_through_tools() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = Settings::default();
        let runtime = Runtime::new(dir.path().to_path_buf(), &settings);
        let request = Request { jsonrpc: None, id: Some(json!(1)), method: "tools/list".to_string(), params: None };
        let result = runtime.dispatch(&request).await.unwrap();
        let names: Vec<&str> = result["tools"].as_array().unwrap().iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert!(names.contains(&"cog_code_edit"));
        assert!(names.contains(&"cog_code_create"));
        assert!(names.contains(&"cog_code_delete"));
        assert!(names.contains(&"cog_code_rename"));
    }

    #[tokio::test]
    async fn status_reports_zero_documents_for_an_empty_project() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = Settings::default();
        let runtime = Runtime::new(dir.path().to_path_buf(), &settings);
        let status: Value = serde_json::from_str(&runtime.tool_code_status().await.unwrap()).unwrap();
        assert_eq!(status["documents"], 0);
    }
}
