//! Tree-sitter-based extraction for Python source: functions, classes,
//! and methods nested in a class body, with `"""..."""`/`'''...'''`
//! docstring attachment.

use super::{build_symbol, check_recursion_depth, Extractor};
use crate::document::Document;
use crate::symbol::{Occurrence, SymbolInformation};
use crate::types::{Range, Role, SymbolKind};
use std::sync::Mutex;
use tree_sitter::{Node, Parser};

pub struct PythonExtractor {
    parser: Mutex<Parser>,
}

impl PythonExtractor {
    pub fn new() -> Self {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .expect("tree-sitter-python grammar version mismatch");
        Self { parser: Mutex::new(parser) }
    }
}

impl Default for PythonExtractor {
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

/// A class/function body's first statement, if it's a bare string
/// expression, is its docstring.
fn docstring(body: Node, source: &str) -> Vec<String> {
    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        if child.kind() == "expression_statement" {
            if let Some(string_node) = child.named_child(0) {
                if string_node.kind() == "string" {
                    let text = node_text(string_node, source)
                        .trim_matches(['"', '\''])
                        .trim();
                    return text.lines().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect();
                }
            }
        }
        return Vec::new();
    }
    Vec::new()
}

struct Definition {
    name: String,
    kind: SymbolKind,
    range: Range,
    enclosing_range: Range,
    documentation: Vec<String>,
}

fn collect(node: Node, source: &str, depth: usize, enclosing_class: Option<&str>, out: &mut Vec<Definition>) {
    if check_recursion_depth(depth, node.kind()).is_err() {
        return;
    }

    match node.kind() {
        "function_definition" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                let name = node_text(name_node, source);
                let display = match enclosing_class {
                    Some(class) => format!("{class}.{name}"),
                    None => name.to_string(),
                };
                let body_docs = node.child_by_field_name("body").map(|b| docstring(b, source)).unwrap_or_default();
                out.push(Definition {
                    name: display,
                    kind: if enclosing_class.is_some() { SymbolKind::Method } else { SymbolKind::Function },
                    range: node_range(name_node),
                    enclosing_range: node_range(node),
                    documentation: body_docs,
                });
            }
            return;
        }
        "class_definition" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                let name = node_text(name_node, source).to_string();
                let body_docs = node.child_by_field_name("body").map(|b| docstring(b, source)).unwrap_or_default();
                out.push(Definition {
                    name: name.clone(),
                    kind: SymbolKind::Class,
                    range: node_range(name_node),
                    enclosing_range: node_range(node),
                    documentation: body_docs,
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
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect(child, source, depth + 1, enclosing_class, out);
    }
}

impl Extractor for PythonExtractor {
    fn extract(&self, source: &str, relative_path: &str) -> Option<Document> {
        let mut parser = self.parser.lock().ok()?;
        let tree = parser.parse(source, None)?;
        drop(parser);

        let mut definitions = Vec::new();
        collect(tree.root_node(), source, 0, None, &mut definitions);
        if definitions.is_empty() {
            return None;
        }

        let mut doc = Document::new(relative_path, "python");
        for def in definitions {
            let symbol = build_symbol(relative_path, &def.name, def.kind);
            doc.occurrences.push(Occurrence {
                range: def.range,
                symbol: symbol.clone(),
                roles: Role::DEFINITION,
                syntax_kind: Some(if def.kind == SymbolKind::Class { "class_definition" } else { "function_definition" }.to_string()),
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
    fn extracts_class_and_methods() {
        let source = r#"
class Settings:
    """Project settings."""

    def load(self):
        pass

def main():
    pass
"#;
        let extractor = PythonExtractor::new();
        let doc = extractor.extract(source, "settings.py").unwrap();

        let class_info = doc.symbol_information.iter().find(|s| s.kind == SymbolKind::Class).unwrap();
        assert_eq!(class_info.short_name(), "Settings");
        assert_eq!(class_info.documentation, vec!["Project settings.".to_string()]);

        let method_info = doc.symbol_information.iter().find(|s| s.kind == SymbolKind::Method).unwrap();
        assert_eq!(method_info.display_name.as_deref(), Some("Settings.load"));

        let func_info = doc.symbol_information.iter().find(|s| s.kind == SymbolKind::Function).unwrap();
        assert_eq!(func_info.short_name(), "main");
    }
}
