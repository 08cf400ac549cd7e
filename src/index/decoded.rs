//! The query-friendly decoded view derived from an [`Index`] (§3):
//! `symbol_to_def`, `symbol_to_refs`, `path_to_doc_index`. Rebuilt on load
//! and after every write-through mutation (§4.6.3) — cheap relative to the
//! I/O that triggers a rebuild, so no incremental-update path is kept.

use super::Index;
use crate::types::SymbolKind;
use std::collections::HashMap;

/// What `symbol_to_def` records about a symbol's single definition.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionInfo {
    pub path: String,
    pub line: u32,
    pub end_line: u32,
    pub kind: SymbolKind,
    pub display_name: Option<String>,
    pub documentation: Vec<String>,
}

/// One entry in a symbol's reference list.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceInfo {
    pub path: String,
    pub line: u32,
    pub role_label: &'static str,
}

/// The decoded, indexable view of an [`Index`]. Holds the same data as the
/// underlying documents but organized for O(1) symbol and path lookup.
#[derive(Debug, Clone, Default)]
pub struct CodeIndex {
    pub symbol_to_def: HashMap<String, DefinitionInfo>,
    pub symbol_to_refs: HashMap<String, Vec<ReferenceInfo>>,
    pub path_to_doc_index: HashMap<String, usize>,
}

impl CodeIndex {
    /// Rebuild the decoded view from scratch. §3's invariant that
    /// `symbol_to_def` is a function (first-wins by document order) falls
    /// out of iterating documents in order and only inserting a symbol's
    /// definition the first time it's seen.
    pub fn build(index: &Index) -> Self {
        let mut decoded = CodeIndex::default();

        for (doc_idx, doc) in index.documents.iter().enumerate() {
            decoded.path_to_doc_index.insert(doc.relative_path.clone(), doc_idx);

            for occ in &doc.occurrences {
                decoded
                    .symbol_to_refs
                    .entry(occ.symbol.clone())
                    .or_default()
                    .push(ReferenceInfo {
                        path: doc.relative_path.clone(),
                        line: occ.range.start_line,
                        role_label: occ.roles.label(),
                    });

                if occ.is_definition() && !decoded.symbol_to_def.contains_key(&occ.symbol) {
                    let info = doc.find_symbol_information(&occ.symbol);
                    decoded.symbol_to_def.insert(
                        occ.symbol.clone(),
                        DefinitionInfo {
                            path: doc.relative_path.clone(),
                            line: occ.range.start_line,
                            end_line: occ.enclosing_range.map(|r| r.end_line).unwrap_or(0),
                            kind: info.map(|i| i.kind).unwrap_or(SymbolKind::Unspecified),
                            display_name: info.and_then(|i| i.display_name.clone()),
                            documentation: info.map(|i| i.documentation.clone()).unwrap_or_default(),
                        },
                    );
                }
            }
        }

        // External symbols: inserted with path="" line=0 when not already
        // defined locally (§3).
        for info in &index.external_symbols {
            decoded.symbol_to_def.entry(info.symbol.clone()).or_insert_with(|| DefinitionInfo {
                path: String::new(),
                line: 0,
                end_line: 0,
                kind: info.kind,
                display_name: info.display_name.clone(),
                documentation: info.documentation.clone(),
            });
        }

        decoded
    }

    pub fn is_external(&self, symbol: &str) -> bool {
        self.symbol_to_def.get(symbol).map(|d| d.path.is_empty()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::symbol::{Occurrence, SymbolInformation};
    use crate::types::{Range, Role};

    fn doc_with_definition(path: &str, symbol: &str, line: u32) -> Document {
        let mut doc = Document::new(path, "rust");
        doc.occurrences.push(Occurrence {
            range: Range::single_line(line, 0, 3),
            symbol: symbol.to_string(),
            roles: Role::DEFINITION,
            syntax_kind: Some("function_item".to_string()),
            enclosing_range: Some(Range::new(line, 0, line + 5, 1)),
        });
        doc.symbol_information.push(SymbolInformation::new(symbol, SymbolKind::Function));
        doc
    }

    #[test]
    fn first_definition_wins_by_document_order() {
        let mut index = Index::new("/proj");
        index.upsert_document(doc_with_definition("src/a.rs", "pkg 1.0 a/run().", 1));
        index.upsert_document(doc_with_definition("src/b.rs", "pkg 1.0 a/run().", 9));

        let decoded = CodeIndex::build(&index);
        let def = decoded.symbol_to_def.get("pkg 1.0 a/run().").unwrap();
        assert_eq!(def.path, "src/a.rs");
        assert_eq!(def.line, 1);
    }

    #[test]
    fn external_symbols_get_empty_path_and_zero_line() {
        let mut index = Index::new("/proj");
        index
            .external_symbols
            .push(SymbolInformation::new("ext 1.0 lib/foo().", SymbolKind::Function));

        let decoded = CodeIndex::build(&index);
        let def = decoded.symbol_to_def.get("ext 1.0 lib/foo().").unwrap();
        assert_eq!(def.path, "");
        assert_eq!(def.line, 0);
        assert!(decoded.is_external("ext 1.0 lib/foo()."));
    }

    #[test]
    fn path_to_doc_index_matches_document_position() {
        let mut index = Index::new("/proj");
        index.upsert_document(Document::new("src/a.rs", "rust"));
        index.upsert_document(Document::new("src/b.rs", "rust"));

        let decoded = CodeIndex::build(&index);
        for (path, &idx) in &decoded.path_to_doc_index {
            assert_eq!(&index.documents[idx].relative_path, path);
        }
    }
}
