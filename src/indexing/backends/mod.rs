//! Tree-sitter-backed extraction. Each language module walks its own AST
//! shape but shares the depth guard and UTF-8-safe truncation helpers
//! ported from the teacher's `parsing/parser.rs`.

pub mod javascript;
pub mod python;
pub mod rust;

use crate::document::Document;

/// Recursion depth beyond which a traversal bails out rather than risk a
/// stack overflow on pathological or generated input.
pub const MAX_AST_DEPTH: usize = 500;

pub fn check_recursion_depth(depth: usize, node_kind: &str) -> Result<(), String> {
    if depth > MAX_AST_DEPTH {
        Err(format!("exceeded max AST depth ({MAX_AST_DEPTH}) at node kind '{node_kind}'"))
    } else {
        Ok(())
    }
}

/// Truncate `s` to at most `max_len` bytes without splitting a UTF-8
/// character boundary.
pub fn safe_truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Build a symbol descriptor in the `scheme version namespace/segments`
/// shape the rest of the system expects (§3): each path segment ends in
/// `/`, the final segment ends in the suffix matching `kind`'s descriptor
/// class.
pub fn build_symbol(relative_path: &str, name: &str, kind: crate::types::SymbolKind) -> String {
    use crate::types::SymbolKind::*;
    let path_no_ext = match relative_path.rfind('.') {
        Some(dot) => &relative_path[..dot],
        None => relative_path,
    };
    let suffix = match kind {
        Function | Method | Constructor | ClassMethod | StaticMethod | TraitMethod | TypeClassMethod => "().",
        Module | Namespace | Package | Directory => "/",
        Macro => "!",
        Constant | Variable | Field | StaticField | StaticVariable | Property | StaticProperty | Parameter => ".",
        _ => "#",
    };
    format!("cog 0.1.0 {path_no_ext}/{name}{suffix}")
}

/// Extracts a canonical [`Document`] from one file's source, or declines
/// (the pipeline then records a stub document).
pub trait Extractor: Send + Sync {
    fn extract(&self, source: &str, relative_path: &str) -> Option<Document>;
}

/// Registered for languages with no real extraction logic yet; always
/// declines so the pipeline's stub-document path takes over.
pub struct StubExtractor;

impl Extractor for StubExtractor {
    fn extract(&self, _source: &str, _relative_path: &str) -> Option<Document> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_truncate_never_splits_a_multibyte_char() {
        let s = "a😀b";
        let truncated = safe_truncate_str(s, 2);
        assert!(std::str::from_utf8(truncated.as_bytes()).is_ok());
        assert_eq!(truncated, "a");
    }

    #[test]
    fn recursion_depth_guard_trips_past_the_limit() {
        assert!(check_recursion_depth(MAX_AST_DEPTH + 1, "block").is_err());
        assert!(check_recursion_depth(MAX_AST_DEPTH, "block").is_ok());
    }
}
