//! Occurrence and symbol-information records: the per-document facts a
//! backend reports, before they are merged into the Index (§3).

use crate::types::{Range, Role, SymbolKind};
use serde::{Deserialize, Serialize};

/// One textual appearance of a symbol within a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    pub range: Range,
    pub symbol: String,
    pub roles: Role,
    pub syntax_kind: Option<String>,
    /// The full body span of the defining construct, when this occurrence
    /// is a definition. `None` when the backend didn't report one (the
    /// explore engine then falls back to `def_line + context_lines`).
    pub enclosing_range: Option<Range>,
}

impl Occurrence {
    pub fn is_definition(&self) -> bool {
        self.roles.contains(Role::DEFINITION)
    }
}

/// A relationship from one symbol to another, as reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub is_reference: bool,
    pub is_implementation: bool,
    pub is_type_definition: bool,
    pub is_definition: bool,
}

/// An edge of the relationship graph: `from` relates to `to` per `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub to_symbol: String,
    pub kind: Relationship,
}

/// A block of documentation text, kept in the order a backend reported it
/// (e.g. one block per paragraph, or one per `///` run).
pub type DocBlock = String;

/// Everything the Index knows about one symbol: its kind, documentation,
/// relationships to other symbols, and where it is nested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInformation {
    pub symbol: String,
    pub kind: SymbolKind,
    pub documentation: Vec<DocBlock>,
    pub relationships: Vec<RelationshipEdge>,
    pub display_name: Option<String>,
    pub enclosing_symbol: Option<String>,
}

impl SymbolInformation {
    pub fn new(symbol: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            symbol: symbol.into(),
            kind,
            documentation: Vec::new(),
            relationships: Vec::new(),
            display_name: None,
            enclosing_symbol: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_documentation(mut self, docs: Vec<DocBlock>) -> Self {
        self.documentation = docs;
        self
    }

    pub fn with_enclosing_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.enclosing_symbol = Some(symbol.into());
        self
    }

    /// The name to show a human or agent: the recorded display name, or
    /// else the descriptor's extracted short name.
    pub fn short_name(&self) -> &str {
        match &self.display_name {
            Some(name) => name.as_str(),
            None => crate::types::extract_short_name(&self.symbol),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_falls_back_to_descriptor() {
        let info = SymbolInformation::new("pkg 1.0 commands/init().", SymbolKind::Function);
        assert_eq!(info.short_name(), "init");
    }

    #[test]
    fn short_name_prefers_display_name() {
        let info = SymbolInformation::new("pkg 1.0 commands/init().", SymbolKind::Function)
            .with_display_name("Init");
        assert_eq!(info.short_name(), "Init");
    }
}
