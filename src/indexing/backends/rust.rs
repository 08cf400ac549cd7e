//! Tree-sitter-based extraction for Rust source. Traversal shape and doc
//! comment back-scan are ported from the teacher's `parsing/rust.rs` and
//! `parsing/parser.rs`; the canonical descriptor/occurrence/document
//! model it populates is new (§3).

use super::{build_symbol, check_recursion_depth, Extractor};
use crate::document::Document;
use crate::symbol::{Occurrence, SymbolInformation};
use crate::types::{Range, Role, SymbolKind};
use std::collections::HashMap;
use std::sync::Mutex;
use tree_sitter::{Node, Parser};

pub struct RustExtractor {
    parser: Mutex<Parser>,
}

impl RustExtractor {
    pub fn new() -> Self {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_rust::LANGUAGE.into())
            .expect("tree-sitter-rust grammar version mismatch");
        Self { parser: Mutex::new(parser) }
    }
}

impl Default for RustExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn node_range(node: Node) -> Range {
    let start = node.start_position();
    let end = node.end_position();
    Range::new(start.row as u32, start.column as u32, end.row as u32, end.column as u32)
}

fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

fn kind_for_node(kind: &str) -> Option<SymbolKind> {
    Some(match kind {
        "function_item" => SymbolKind::Function,
        "struct_item" => SymbolKind::Struct,
        "enum_item" => SymbolKind::Enum,
        "trait_item" => SymbolKind::Trait,
        "mod_item" => SymbolKind::Module,
        "const_item" => SymbolKind::Constant,
        "static_item" => SymbolKind::StaticVariable,
        "type_item" => SymbolKind::TypeAlias,
        "macro_definition" => SymbolKind::Macro,
        _ => return None,
    })
}

/// Walk backward through comment siblings attached directly above `node`,
/// collecting `///`/`//!` lines in source order.
fn leading_doc_comments(node: Node, source: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = node.prev_sibling();
    while let Some(n) = current {
        if n.kind() != "line_comment" && n.kind() != "block_comment" {
            break;
        }
        let text = node_text(n, source).trim();
        if text.starts_with("///") || text.starts_with("//!") {
            lines.push(text.trim_start_matches("///").trim_start_matches("//!").trim().to_string());
            current = n.prev_sibling();
        } else {
            break;
        }
    }
    lines.reverse();
    lines
}

struct Definition {
    name: String,
    kind: SymbolKind,
    range: Range,
    enclosing_range: Range,
    documentation: Vec<String>,
    name_byte_range: std::ops::Range<usize>,
}

fn collect_definitions(node: Node, source: &str, depth: usize, out: &mut Vec<Definition>) {
    if check_recursion_depth(depth, node.kind()).is_err() {
        return;
    }

    if let Some(kind) = kind_for_node(node.kind()) {
        if let Some(name_node) = node.child_by_field_name("name") {
            out.push(Definition {
                name: node_text(name_node, source).to_string(),
                kind,
                range: node_range(name_node),
                enclosing_range: node_range(node),
                documentation: leading_doc_comments(node, source),
                name_byte_range: name_node.byte_range(),
            });
        }
    }

    // impl blocks contribute their methods as top-level definitions too;
    // the enclosing struct/trait name is recorded via `enclosing_symbol`.
    if node.kind() == "impl_item" {
        let impl_type_name = node
            .child_by_field_name("type")
            .map(|n| node_text(n, source).to_string());
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for child in body.children(&mut cursor) {
                if child.kind() == "function_item" {
                    if let Some(name_node) = child.child_by_field_name("name") {
                        out.push(Definition {
                            name: name_node_display(name_node, source, impl_type_name.as_deref()),
                            kind: SymbolKind::Method,
                            range: node_range(name_node),
                            enclosing_range: node_range(child),
                            documentation: leading_doc_comments(child, source),
                            name_byte_range: name_node.byte_range(),
                        });
                    }
                }
            }
        }
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_definitions(child, source, depth + 1, out);
    }
}

fn name_node_display(name_node: Node, source: &str, impl_type: Option<&str>) -> String {
    let method_name = node_text(name_node, source);
    match impl_type {
        Some(ty) => format!("{ty}::{method_name}"),
        None => method_name.to_string(),
    }
}

/// Second pass: find identifier-like nodes whose text matches a locally
/// defined symbol's name and were not themselves that definition's name
/// node, recording a same-file reference occurrence (§3). Cross-file
/// resolution is the Indexer Pipeline's concern, not a single backend's.
fn collect_same_file_references(
    node: Node,
    source: &str,
    depth: usize,
    def_names: &HashMap<String, String>,
    def_spans: &std::collections::HashSet<std::ops::Range<usize>>,
    out: &mut Vec<Occurrence>,
) {
    if check_recursion_depth(depth, node.kind()).is_err() {
        return;
    }

    if node.kind() == "identifier" && !def_spans.contains(&node.byte_range()) {
        let text = node_text(node, source);
        if let Some(symbol) = def_names.get(text) {
            out.push(Occurrence {
                range: node_range(node),
                symbol: symbol.clone(),
                roles: Role::READ_ACCESS,
                syntax_kind: Some("identifier".to_string()),
                enclosing_range: None,
            });
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_same_file_references(child, source, depth + 1, def_names, def_spans, out);
    }
}

impl Extractor for RustExtractor {
    fn extract(&self, source: &str, relative_path: &str) -> Option<Document> {
        let mut parser = self.parser.lock().ok()?;
        let tree = parser.parse(source, None)?;
        drop(parser);

        let mut definitions = Vec::new();
        collect_definitions(tree.root_node(), source, 0, &mut definitions);
        if definitions.is_empty() {
            return None;
        }

        let mut doc = Document::new(relative_path, "rust");
        let mut def_names = HashMap::new();
        let mut def_spans = std::collections::HashSet::new();

        for def in &definitions {
            let symbol = build_symbol(relative_path, &def.name, def.kind);
            def_names.insert(def.name.clone(), symbol.clone());
            def_spans.insert(def.name_byte_range.clone());

            doc.occurrences.push(Occurrence {
                range: def.range,
                symbol: symbol.clone(),
                roles: Role::DEFINITION,
                syntax_kind: Some(node_kind_label(def.kind).to_string()),
                enclosing_range: Some(def.enclosing_range),
            });
            doc.symbol_information.push(
                SymbolInformation::new(symbol, def.kind)
                    .with_display_name(def.name.clone())
                    .with_documentation(def.documentation.clone()),
            );
        }

        let mut refs = Vec::new();
        collect_same_file_references(tree.root_node(), source, 0, &def_names, &def_spans, &mut refs);
        doc.occurrences.extend(refs);

        Some(doc)
    }
}

fn node_kind_label(kind: SymbolKind) -> &'static str {
    match kind {
        SymbolKind::Function => "function_item",
        SymbolKind::Method => "function_item",
        SymbolKind::Struct => "struct_item",
        SymbolKind::Enum => "enum_item",
        SymbolKind::Trait => "trait_item",
        SymbolKind::Module => "mod_item",
        SymbolKind::Constant => "const_item",
        SymbolKind::StaticVariable => "static_item",
        SymbolKind::TypeAlias => "type_item",
        SymbolKind::Macro => "macro_definition",
        _ => "item",
    }
}
