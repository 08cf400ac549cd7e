//! Tree-sitter-based extraction shared by JavaScript and TypeScript: the
//! two grammars expose the same `function_declaration`/`class_declaration`/
//! `method_definition` shape, so one extractor serves both, parameterized
//! by which grammar to load.

use super::{build_symbol, check_recursion_depth, Extractor};
use crate::document::Document;
use crate::symbol::{Occurrence, SymbolInformation};
use crate::types::{Range, Role, SymbolKind};
use std::sync::Mutex;
use tree_sitter::{Node, Parser};

pub struct JavaScriptExtractor {
    parser: Mutex<Parser>,
    language_tag: &'static str,
}

impl JavaScriptExtractor {
    pub fn new_javascript() -> Self {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_javascript::LANGUAGE.into())
            .expect("tree-sitter-javascript grammar version mismatch");
        Self { parser: Mutex::new(parser), language_tag: "javascript" }
    }

    pub fn new_typescript() -> Self {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
            .expect("tree-sitter-typescript grammar version mismatch");
        Self { parser: Mutex::new(parser), language_tag: "typescript" }
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

/// A `/** ... */` block comment immediately preceding `node`.
fn leading_jsdoc(node: Node, source: &str) -> Vec<String> {
    let Some(prev) = node.prev_sibling() else { return Vec::new() };
    if prev.kind() != "comment" {
        return Vec::new();
    }
    let text = node_text(prev, source);
    if !text.starts_with("/**") {
        return Vec::new();
    }
    text.trim_start_matches("/**")
        .trim_end_matches("*/")
        .lines()
        .map(|l| l.trim().trim_start_matches('*').trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

struct Definition {
    name: String,
    kind: SymbolKind,
    range: Range,
    enclosing_range: Range,
    documentation: Vec<String>,
    syntax_kind: &'static str,
}

fn collect(node: Node, source: &str, depth: usize, enclosing_class: Option<&str>, out: &mut Vec<Definition>) {
    if check_recursion_depth(depth, node.kind()).is_err() {
        return;
    }

    match node.kind() {
        "function_declaration" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                out.push(Definition {
                    name: node_text(name_node, source).to_string(),
                    kind: SymbolKind::Function,
                    range: node_range(name_node),
                    enclosing_range: node_range(node),
                    documentation: leading_jsdoc(node, source),
                    syntax_kind: "function_declaration",
                });
            }
            return;
        }
        "class_declaration" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                let name = node_text(name_node, source).to_string();
                out.push(Definition {
                    name: name.clone(),
                    kind: SymbolKind::Class,
                    range: node_range(name_node),
                    enclosing_range: node_range(node),
                    documentation: leading_jsdoc(node, source),
                    syntax_kind: "class_declaration",
                });
                if let Some(body) = node.child_by_field_name("body") {
                    let mut cursor = body.walk();
                    for child in body.children(&mut cursor) {
                        collect(child, source, depth + 1, Some(&name), out);
                    }
                }
            }
            return;
        }
        "method_definition" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                let method_name = node_text(name_node, source);
                let display = match enclosing_class {
                    Some(class) => format!("{class}.{method_name}"),
                    None => method_name.to_string(),
                };
                out.push(Definition {
                    name: display,
                    kind: SymbolKind::Method,
                    range: node_range(name_node),
                    enclosing_range: node_range(node),
                    documentation: leading_jsdoc(node, source),
                    syntax_kind: "method_definition",
                });
            }
            return;
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect(child, source, depth + 1, enclosing_class, out);
    }
}

impl Extractor for JavaScriptExtractor {
    fn extract(&self, source: &str, relative_path: &str) -> Option<Document> {
        let mut parser = self.parser.lock().ok()?;
        let tree = parser.parse(source, None)?;
        drop(parser);

        let mut definitions = Vec::new();
        collect(tree.root_node(), source, 0, None, &mut definitions);
        if definitions.is_empty() {
            return None;
        }

        let mut doc = Document::new(relative_path, self.language_tag);
        for def in definitions {
            let symbol = build_symbol(relative_path, &def.name, def.kind);
            doc.occurrences.push(Occurrence {
                range: def.range,
                symbol: symbol.clone(),
                roles: Role::DEFINITION,
                syntax_kind: Some(def.syntax_kind.to_string()),
                enclosing_range: Some(def.enclosing_range),
            });
            doc.symbol_information.push(
                SymbolInformation::new(symbol, def.kind)
                    .with_display_name(def.name)
                    .with_documentation(def.documentation),
            );
        }
        Some(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_javascript_function_and_class() {
        let source = r#"
/** Runs the app. */
function run() {}

class Settings {
    load() {}
}
"#;
        let extractor = JavaScriptExtractor::new_javascript();
        let doc = extractor.extract(source, "src/app.js").unwrap();

        let run_info = doc.symbol_information.iter().find(|s| s.short_name() == "run").unwrap();
        assert_eq!(run_info.documentation, vec!["Runs the app.".to_string()]);

        let method_info = doc.symbol_information.iter().find(|s| s.kind == SymbolKind::Method).unwrap();
        assert_eq!(method_info.display_name.as_deref(), Some("Settings.load"));
    }

    #[test]
    fn extracts_typescript_definitions() {
        let source = r#"
function run(): void {}
"#;
        let extractor = JavaScriptExtractor::new_typescript();
        let doc = extractor.extract(source, "src/app.ts").unwrap();
        assert_eq!(doc.language, "typescript");
        assert!(doc.symbol_information.iter().any(|s| s.short_name() == "run"));
    }
}
