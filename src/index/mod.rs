//! The master Index: metadata, the list of Documents, and symbols defined
//! outside the indexed tree (§3). This module owns merge-by-path
//! semantics; the decoded, query-friendly view lives in [`decoded`].

pub mod decoded;

pub use decoded::CodeIndex;

use crate::document::Document;
use crate::symbol::SymbolInformation;
use serde::{Deserialize, Serialize};

pub const CURRENT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub version: u32,
    pub tool_info: String,
    pub project_root: String,
    pub encoding: String,
}

impl IndexMetadata {
    pub fn new(project_root: impl Into<String>) -> Self {
        Self {
            version: CURRENT_VERSION,
            tool_info: format!("cog {}", env!("CARGO_PKG_VERSION")),
            project_root: project_root.into(),
            encoding: "utf-8".to_string(),
        }
    }
}

/// The durable, on-disk symbol index for one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Index {
    pub metadata: IndexMetadata,
    pub documents: Vec<Document>,
    pub external_symbols: Vec<SymbolInformation>,
}

impl Index {
    pub fn new(project_root: impl Into<String>) -> Self {
        Self {
            metadata: IndexMetadata::new(project_root),
            documents: Vec::new(),
            external_symbols: Vec::new(),
        }
    }

    pub fn position_of(&self, relative_path: &str) -> Option<usize> {
        self.documents.iter().position(|d| d.relative_path == relative_path)
    }

    /// Merge rule (§4.2): replace any prior document for the same path in
    /// place, otherwise append.
    pub fn upsert_document(&mut self, document: Document) {
        match self.position_of(&document.relative_path) {
            Some(idx) => self.documents[idx] = document,
            None => self.documents.push(document),
        }
    }

    /// Drop the document for `relative_path`, if present. Returns whether
    /// anything was removed.
    pub fn remove_document(&mut self, relative_path: &str) -> bool {
        match self.position_of(relative_path) {
            Some(idx) => {
                self.documents.remove(idx);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_replaces_same_path_in_place() {
        let mut index = Index::new("/proj");
        index.upsert_document(Document::new("src/a.rs", "rust"));
        index.upsert_document(Document::new("src/b.rs", "rust"));
        let mut replacement = Document::new("src/a.rs", "rust");
        replacement.language = "rust".into();
        index.upsert_document(replacement);

        assert_eq!(index.documents.len(), 2);
        assert_eq!(index.documents[0].relative_path, "src/a.rs");
        assert_eq!(index.documents[1].relative_path, "src/b.rs");
    }

    #[test]
    fn remove_document_drops_by_path() {
        let mut index = Index::new("/proj");
        index.upsert_document(Document::new("src/a.rs", "rust"));
        assert!(index.remove_document("src/a.rs"));
        assert!(!index.remove_document("src/a.rs"));
        assert!(index.documents.is_empty());
    }
}
