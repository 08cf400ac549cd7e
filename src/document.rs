//! The per-file record stored in the Index: everything a backend
//! extracted from one source file (§3).

use crate::symbol::{Occurrence, SymbolInformation};
use serde::{Deserialize, Serialize};

/// One indexed source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Path relative to the project root, using `/` separators regardless
    /// of host platform.
    pub relative_path: String,
    pub language: String,
    pub occurrences: Vec<Occurrence>,
    pub symbol_information: Vec<SymbolInformation>,
}

impl Document {
    pub fn new(relative_path: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            language: language.into(),
            occurrences: Vec::new(),
            symbol_information: Vec::new(),
        }
    }

    /// A document recording that a backend couldn't parse this file —
    /// registered but with no occurrences or symbol information (§4.2).
    pub fn stub(relative_path: impl Into<String>, language: impl Into<String>) -> Self {
        Self::new(relative_path, language)
    }

    pub fn is_stub(&self) -> bool {
        self.occurrences.is_empty() && self.symbol_information.is_empty()
    }

    pub fn find_symbol_information(&self, symbol: &str) -> Option<&SymbolInformation> {
        self.symbol_information.iter().find(|info| info.symbol == symbol)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &Occurrence> {
        self.occurrences.iter().filter(|occ| occ.is_definition())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SymbolKind;

    #[test]
    fn stub_document_has_no_symbols() {
        let doc = Document::stub("src/unsupported.ext", "unknown");
        assert!(doc.is_stub());
    }

    #[test]
    fn find_symbol_information_by_descriptor() {
        let mut doc = Document::new("src/lib.rs", "rust");
        doc.symbol_information
            .push(SymbolInformation::new("pkg 1.0 lib/run().", SymbolKind::Function));
        assert!(doc.find_symbol_information("pkg 1.0 lib/run().").is_some());
        assert!(doc.find_symbol_information("pkg 1.0 lib/other().").is_none());
    }
}
