//! The Query Engine (§4.3): name/glob lookup against the decoded index,
//! with a small scoring heuristic favoring exact, non-test, shallow hits.

use crate::index::decoded::{CodeIndex, ReferenceInfo};
use crate::indexing::glob::{has_glob_metachar, name_glob};
use crate::types::{extract_short_name, SymbolKind};

/// One candidate returned by [`find`], carrying enough to either display
/// it directly or feed it into the Disambiguation Engine.
#[derive(Debug, Clone, PartialEq)]
pub struct FindMatch {
    pub symbol: String,
    pub path: String,
    pub line: u32,
    pub end_line: u32,
    pub kind: SymbolKind,
    pub display_name: String,
    pub score: i32,
}

/// An entry in a `refs` result.
#[derive(Debug, Clone, PartialEq)]
pub struct RefEntry {
    pub path: String,
    pub line: u32,
    pub role_label: &'static str,
}

/// An entry in a `symbols` result: a document's SymbolInformation paired
/// with the line of its first definition occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolEntry {
    pub symbol: String,
    pub kind: SymbolKind,
    pub display_name: Option<String>,
    pub line: Option<u32>,
}

fn display_name_of(symbol: &str, explicit: &Option<String>) -> String {
    explicit.clone().unwrap_or_else(|| extract_short_name(symbol).to_string())
}

/// Suffixes treated as test files regardless of where they occur (§4.3).
const TEST_SUFFIXES: &[&str] = &[".test.js", ".test.ts", ".spec.js", ".spec.ts", "_test.go", "_test.py"];

fn is_test_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.contains("test") || lower.contains("__tests__") || lower.contains("spec") || TEST_SUFFIXES.iter().any(|s| lower.ends_with(s))
}

fn path_depth(path: &str) -> usize {
    path.matches('/').count()
}

fn path_or_suffix_match(candidate: &str, filter: &str) -> bool {
    candidate == filter || candidate.ends_with(filter) || filter.ends_with(candidate)
}

/// Case-insensitive name (or name-glob) match against the display name and
/// extracted short name of every entry in `symbol_to_def`, scored and
/// filtered by optional `kind`/`file` (§4.3).
pub fn find(index: &CodeIndex, name: &str, kind: Option<&str>, file: Option<&str>) -> Vec<FindMatch> {
    let kind_filter = kind.and_then(SymbolKind::from_name);
    let is_glob = has_glob_metachar(name);
    let lower_name = name.to_ascii_lowercase();

    let mut matches = Vec::new();
    for (symbol, def) in &index.symbol_to_def {
        if let Some(k) = kind_filter {
            if def.kind != k {
                continue;
            }
        }
        if let Some(f) = file {
            if !path_or_suffix_match(&def.path, f) {
                continue;
            }
        }

        let display = display_name_of(symbol, &def.display_name);
        let short = extract_short_name(symbol);

        let mut score = if is_glob {
            if name_glob(name, &display) || name_glob(name, short) {
                80
            } else {
                continue;
            }
        } else if display == name || short == name {
            100
        } else if display.to_ascii_lowercase() == lower_name || short.to_ascii_lowercase() == lower_name {
            80
        } else {
            continue;
        };

        if !def.path.is_empty() && !is_test_path(&def.path) {
            score += 50;
        }
        if path_depth(&def.path) <= 2 {
            score += 10;
        }

        matches.push(FindMatch {
            symbol: symbol.clone(),
            path: def.path.clone(),
            line: def.line,
            end_line: def.end_line,
            kind: def.kind,
            display_name: display,
            score,
        });
    }

    stable_sort_by_score_desc(&mut matches);
    matches
}

fn stable_sort_by_score_desc(matches: &mut [FindMatch]) {
    // Insertion sort: result lists are small (name matches), and this
    // keeps ties in first-found order without needing a secondary key.
    for i in 1..matches.len() {
        let mut j = i;
        while j > 0 && matches[j - 1].score < matches[j].score {
            matches.swap(j - 1, j);
            j -= 1;
        }
    }
}

/// Resolve `name` as [`find`] does, take the top match, and return its
/// definition plus every recorded occurrence (§4.3). The `kind` filter
/// narrows which symbol `name` resolves to but is not reapplied to the
/// references themselves (an intentional, if surprising, design note — see
/// SPEC_FULL.md's open questions).
pub fn refs(index: &CodeIndex, name: &str, kind: Option<&str>) -> Option<(FindMatch, Vec<RefEntry>)> {
    let top = find(index, name, kind, None).into_iter().next()?;
    let entries = index
        .symbol_to_refs
        .get(&top.symbol)
        .map(|refs| refs.iter().map(ref_entry).collect())
        .unwrap_or_default();
    Some((top, entries))
}

fn ref_entry(info: &ReferenceInfo) -> RefEntry {
    RefEntry { path: info.path.clone(), line: info.line, role_label: info.role_label }
}

/// List every SymbolInformation defined in `file` (exact path match, then
/// suffix match), each paired with its definition line, optionally
/// filtered by `kind` (§4.3).
pub fn symbols(index: &CodeIndex, file: &str, kind: Option<&str>) -> Vec<SymbolEntry> {
    let kind_filter = kind.and_then(SymbolKind::from_name);

    let resolved_path = index
        .path_to_doc_index
        .keys()
        .find(|p| p.as_str() == file)
        .or_else(|| index.path_to_doc_index.keys().find(|p| path_or_suffix_match(p, file)));

    let Some(path) = resolved_path else { return Vec::new() };

    index
        .symbol_to_def
        .iter()
        .filter(|(_, def)| &def.path == path)
        .filter(|(_, def)| kind_filter.is_none_or(|k| def.kind == k))
        .map(|(symbol, def)| SymbolEntry {
            symbol: symbol.clone(),
            kind: def.kind,
            display_name: def.display_name.clone(),
            line: Some(def.line),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::index::Index;
    use crate::symbol::{Occurrence, SymbolInformation};
    use crate::types::Range;

    fn index_with(defs: &[(&str, &str, &str, u32, SymbolKind)]) -> CodeIndex {
        let mut index = Index::new("/proj");
        for (path, symbol, display, line, kind) in defs {
            let mut doc = index
                .documents
                .iter()
                .position(|d| &d.relative_path == path)
                .map(|i| index.documents.remove(i))
                .unwrap_or_else(|| Document::new(*path, "rust"));
            doc.occurrences.push(Occurrence {
                range: Range::single_line(*line, 0, 3),
                symbol: symbol.to_string(),
                roles: crate::types::Role::DEFINITION,
                syntax_kind: None,
                enclosing_range: None,
            });
            doc.symbol_information.push(SymbolInformation::new(*symbol, *kind).with_display_name(*display));
            index.upsert_document(doc);
        }
        CodeIndex::build(&index)
    }

    #[test]
    fn exact_match_outscores_test_file_hit() {
        let decoded = index_with(&[
            ("src/commands/init.rs", "pkg 1.0 init/init().", "init", 5, SymbolKind::Function),
            ("src/commands/init_test.rs", "pkg 1.0 test/init().", "init", 2, SymbolKind::Function),
        ]);
        let matches = find(&decoded, "init", None, None);
        assert_eq!(matches[0].path, "src/commands/init.rs");
    }

    #[test]
    fn glob_query_matches_substring_case_insensitively() {
        let decoded = index_with(&[("src/brain.rs", "pkg 1.0 brain/initBrain().", "initBrain", 20, SymbolKind::Function)]);
        let matches = find(&decoded, "*brain*", None, None);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].display_name, "initBrain");
    }

    #[test]
    fn kind_filter_excludes_other_kinds() {
        let decoded = index_with(&[
            ("src/a.rs", "pkg 1.0 a/Settings#", "Settings", 1, SymbolKind::Struct),
            ("src/a.rs", "pkg 1.0 a/settings().", "settings", 2, SymbolKind::Function),
        ]);
        let matches = find(&decoded, "settings", Some("struct"), None);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].kind, SymbolKind::Struct);
    }

    #[test]
    fn refs_returns_definition_and_occurrences() {
        let decoded = index_with(&[("src/a.rs", "pkg 1.0 a/run().", "run", 1, SymbolKind::Function)]);
        let (def, entries) = refs(&decoded, "run", None).unwrap();
        assert_eq!(def.display_name, "run");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].role_label, "definition");
    }

    #[test]
    fn symbols_lists_everything_defined_in_a_file() {
        let decoded = index_with(&[
            ("src/a.rs", "pkg 1.0 a/run().", "run", 1, SymbolKind::Function),
            ("src/a.rs", "pkg 1.0 a/Settings#", "Settings", 5, SymbolKind::Struct),
            ("src/b.rs", "pkg 1.0 b/other().", "other", 1, SymbolKind::Function),
        ]);
        let entries = symbols(&decoded, "src/a.rs", None);
        assert_eq!(entries.len(), 2);
    }
}
