//! The MCP tool catalog (§4.6.1): local code tools, debug passthrough,
//! and lazily-discovered remote memory tools renamed `cog_` → `cog_mem_`.

use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// A tool discovered from the remote memory service's `tools/list`,
/// renamed for local exposure (§4.6.2).
#[derive(Debug, Clone)]
pub struct RemoteTool {
    pub remote_name: String,
    pub local_name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Rewrite a remote tool's name and description for local exposure:
/// leading `cog_` becomes `cog_mem_`, and any `cog_xxx` token mentioned in
/// the description is rewritten the same way (§4.6.1).
pub fn rename_remote_tool(remote_name: &str, description: &str, input_schema: Value) -> RemoteTool {
    let local_name = rewrite_cog_prefix(remote_name);
    let rewritten_description = rewrite_embedded_tokens(description);
    RemoteTool { remote_name: remote_name.to_string(), local_name, description: rewritten_description, input_schema }
}

fn rewrite_cog_prefix(name: &str) -> String {
    match name.strip_prefix("cog_") {
        Some(rest) => format!("cog_mem_{rest}"),
        None => name.to_string(),
    }
}

fn rewrite_embedded_tokens(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find("cog_") {
        out.push_str(&rest[..idx]);
        let token_start = idx;
        let after = &rest[idx + 4..];
        let token_len = after.find(|c: char| !(c.is_alphanumeric() || c == '_')).unwrap_or(after.len());
        let token = &rest[token_start..idx + 4 + token_len];
        if token.starts_with("cog_mem_") {
            out.push_str(token);
        } else {
            out.push_str(&rewrite_cog_prefix(token));
        }
        rest = &after[token_len..];
    }
    out.push_str(rest);
    out
}

/// The catalog's fixed local entries plus whatever remote memory tools
/// have been discovered so far.
pub fn catalog(remote_tools: &[RemoteTool]) -> Vec<ToolDefinition> {
    let mut tools = vec![
        ToolDefinition {
            name: "cog_code_query".to_string(),
            description: "Find symbols, list their references, or list a file's symbols".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "mode": {"type": "string", "enum": ["find", "refs", "symbols"]},
                    "name": {"type": "string"},
                    "file": {"type": "string"},
                    "kind": {"type": "string"},
                },
                "required": ["mode"],
            }),
        },
        ToolDefinition {
            name: "cog_code_status".to_string(),
            description: "Report whether an index exists and summary counts".to_string(),
            input_schema: json!({"type": "object", "properties": {}}),
        },
        ToolDefinition {
            name: "cog_code_explore".to_string(),
            description: "Resolve a batch of symbol queries with bodies, cross-references, and file tables of contents".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "queries": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {"name": {"type": "string"}, "kind": {"type": "string"}},
                            "required": ["name"],
                        },
                    },
                    "context_lines": {"type": "integer"},
                },
                "required": ["queries"],
            }),
        },
        ToolDefinition {
            name: "cog_code_edit".to_string(),
            description: "Replace a unique occurrence of old_text with new_text in a file, then reindex it".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string"},
                    "old_text": {"type": "string"},
                    "new_text": {"type": "string"},
                },
                "required": ["path", "old_text", "new_text"],
            }),
        },
        ToolDefinition {
            name: "cog_code_create".to_string(),
            description: "Create a new file with the given contents, then index it".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string"},
                    "contents": {"type": "string"},
                },
                "required": ["path", "contents"],
            }),
        },
        ToolDefinition {
            name: "cog_code_delete".to_string(),
            description: "Delete a file and drop its document from the index".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"path": {"type": "string"}},
                "required": ["path"],
            }),
        },
        ToolDefinition {
            name: "cog_code_rename".to_string(),
            description: "Move a file to a new path and reindex it there".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "from": {"type": "string"},
                    "to": {"type": "string"},
                },
                "required": ["from", "to"],
            }),
        },
    ];

    for remote in remote_tools {
        tools.push(ToolDefinition { name: remote.local_name.clone(), description: remote.description.clone(), input_schema: remote.input_schema.clone() });
    }

    tools
}
