//! The Explore Engine (§4.5): resolves a batch of name queries, reads each
//! chosen definition's body with attached leading comments, collects
//! in-body cross-references, and attaches a per-file table of contents.

use crate::disambiguate::{self, Query as DisambiguateQuery};
use crate::index::decoded::CodeIndex;
use crate::index::Index;
use crate::indexing::glob::has_glob_metachar;
use crate::query::{find, FindMatch};
use crate::types::SymbolKind;
use std::collections::HashSet;

pub const MAX_QUERIES: usize = 32;
pub const DEFAULT_CONTEXT_LINES: u32 = 15;
pub const MAX_BODY_LINES: u32 = 30;
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;
/// Soft output budget; exceeding it stops attaching bodies to later
/// results rather than failing the call outright (§4.5).
pub const SOFT_RESPONSE_BUDGET_BYTES: usize = 50 * 1024;

pub struct ExploreQuery {
    pub name: String,
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TocEntry {
    pub name: String,
    pub kind: SymbolKind,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExploreHit {
    pub name: String,
    pub symbol: String,
    pub path: String,
    pub line: u32,
    pub display_name: String,
    pub body: Vec<String>,
    pub truncated: bool,
    pub retried_pattern: Option<String>,
    pub cross_references: Vec<String>,
    pub toc: Option<Vec<TocEntry>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExploreError {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExploreOutcome {
    Found(ExploreHit),
    NotFound(ExploreError),
}

/// Run a batch of name queries through find → auto-retry → disambiguate →
/// body read → cross-reference scan → TOC attach, one output element per
/// input query, in input order (§4.5).
pub fn explore(index: &Index, decoded: &CodeIndex, queries: &[ExploreQuery], context_lines: Option<u32>) -> Vec<ExploreOutcome> {
    let context_lines = context_lines.unwrap_or(DEFAULT_CONTEXT_LINES);
    let queries = &queries[..queries.len().min(MAX_QUERIES)];

    let mut retried_patterns: Vec<Option<String>> = Vec::with_capacity(queries.len());
    let mut disambiguate_queries: Vec<DisambiguateQuery> = Vec::with_capacity(queries.len());

    for q in queries {
        let mut candidates = find(decoded, &q.name, q.kind.as_deref(), None);
        let mut retried = None;
        if candidates.is_empty() && !has_glob_metachar(&q.name) {
            let pattern = format!("*{}*", q.name);
            candidates = find(decoded, &pattern, q.kind.as_deref(), None);
            retried = Some(pattern);
        }
        retried_patterns.push(retried);
        disambiguate_queries.push(DisambiguateQuery { candidates });
    }

    let selections = disambiguate::disambiguate(&disambiguate_queries, decoded);

    let mut chosen_paths: HashSet<String> = HashSet::new();
    let mut chosen_symbols: HashSet<String> = HashSet::new();
    for (dq, sel) in disambiguate_queries.iter().zip(&selections) {
        if let Some(ci) = sel {
            let candidate = &dq.candidates[*ci];
            if !candidate.path.is_empty() {
                chosen_paths.insert(candidate.path.clone());
            }
            chosen_symbols.insert(candidate.symbol.clone());
        }
    }

    let mut toc_cache: std::collections::HashMap<String, Vec<TocEntry>> = std::collections::HashMap::new();
    let mut budget_used = 0usize;
    let mut outcomes = Vec::with_capacity(queries.len());

    for (i, q) in queries.iter().enumerate() {
        let outcome = match selections[i] {
            None => ExploreOutcome::NotFound(ExploreError { name: q.name.clone(), error: "Symbol not found".to_string() }),
            Some(ci) => {
                let candidate = disambiguate_queries[i].candidates[ci].clone();
                if candidate.path.is_empty() {
                    ExploreOutcome::NotFound(ExploreError { name: q.name.clone(), error: "Symbol is external (no source file)".to_string() })
                } else {
                    let (hit, bytes_used) = build_hit(
                        &q.name,
                        &candidate,
                        index,
                        decoded,
                        &index.metadata.project_root,
                        context_lines,
                        retried_patterns[i].clone(),
                        &chosen_symbols,
                        &chosen_paths,
                        &mut toc_cache,
                        budget_used,
                    );
                    budget_used += bytes_used;
                    ExploreOutcome::Found(hit)
                }
            }
        };
        outcomes.push(outcome);
    }

    outcomes
}

#[allow(clippy::too_many_arguments)]
fn build_hit(
    query_name: &str,
    candidate: &FindMatch,
    index: &Index,
    decoded: &CodeIndex,
    project_root: &str,
    context_lines: u32,
    retried_pattern: Option<String>,
    chosen_symbols: &HashSet<String>,
    chosen_paths: &HashSet<String>,
    toc_cache: &mut std::collections::HashMap<String, Vec<TocEntry>>,
    budget_used: usize,
) -> (ExploreHit, usize) {
    let doc = index.documents.iter().find(|d| d.relative_path == candidate.path);

    let (body, truncated, start_line, end_line) = if budget_used >= SOFT_RESPONSE_BUDGET_BYTES {
        (Vec::new(), false, candidate.line, candidate.line)
    } else {
        let full_path = std::path::Path::new(project_root).join(&candidate.path);
        read_body(&full_path, candidate.line, candidate.end_line, context_lines)
    };

    let cross_references = doc
        .map(|d| cross_references_in_range(d, &candidate.symbol, start_line, end_line, decoded))
        .unwrap_or_default();

    let toc = if chosen_paths.contains(&candidate.path) && !toc_cache.contains_key(&candidate.path) {
        let entries = doc.map(|d| file_toc(d, chosen_symbols)).unwrap_or_default();
        toc_cache.insert(candidate.path.clone(), entries.clone());
        Some(entries)
    } else {
        None
    };

    let bytes_used = body.iter().map(|l| l.len() + 1).sum::<usize>() + cross_references.iter().map(|r| r.len()).sum::<usize>();

    let hit = ExploreHit {
        name: query_name.to_string(),
        symbol: candidate.symbol.clone(),
        path: candidate.path.clone(),
        line: candidate.line,
        display_name: candidate.display_name.clone(),
        body,
        truncated,
        retried_pattern,
        cross_references,
        toc,
    };
    (hit, bytes_used)
}

fn is_attached_comment_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("///")
        || trimmed.starts_with("//!")
        || trimmed.starts_with("//")
        || trimmed.starts_with("/*")
        || trimmed.starts_with("* ")
        || trimmed.starts_with("*/")
        || trimmed.starts_with('#')
        || trimmed.starts_with('@')
}

/// Read `path`'s body for a definition at `def_line` (0-based), expanding
/// backward over attached comments/attributes and forward to
/// `enclosing_range`'s end line (or `def_line + context_lines`), capped at
/// [`MAX_BODY_LINES`] (§4.5 steps 4a-4d).
fn read_body(path: &std::path::Path, def_line: u32, enclosing_end_line: u32, context_lines: u32) -> (Vec<String>, bool, u32, u32) {
    let Ok(metadata) = std::fs::metadata(path) else { return (Vec::new(), false, def_line, def_line) };
    if metadata.len() > MAX_FILE_BYTES {
        return (Vec::new(), false, def_line, def_line);
    }
    let Ok(contents) = std::fs::read_to_string(path) else { return (Vec::new(), false, def_line, def_line) };
    let lines: Vec<&str> = contents.lines().collect();
    if lines.is_empty() {
        return (Vec::new(), false, def_line, def_line);
    }

    let mut start_line = def_line;
    let mut scanned = 0;
    while scanned < 3 && start_line > 0 {
        let candidate_line = lines.get((start_line - 1) as usize).copied().unwrap_or("");
        if candidate_line.trim().is_empty() || !is_attached_comment_line(candidate_line) {
            break;
        }
        start_line -= 1;
        scanned += 1;
    }

    let natural_end = if enclosing_end_line > def_line { enclosing_end_line } else { def_line + context_lines };
    let capped_end = (start_line + MAX_BODY_LINES - 1).min(natural_end);
    let truncated = capped_end < natural_end;

    let last_index = (lines.len() as u32).saturating_sub(1);
    let end_line = capped_end.min(last_index);

    let body: Vec<String> = (start_line..=end_line).filter_map(|ln| lines.get(ln as usize)).map(|l| l.to_string()).collect();

    (body, truncated, start_line, end_line)
}

/// Occurrences in `doc` whose start line falls in `[start_line, end_line]`,
/// excluding the candidate's own symbol and externals, de-duplicated, in
/// first-seen order (§4.5 step 5).
fn cross_references_in_range(
    doc: &crate::document::Document,
    own_symbol: &str,
    start_line: u32,
    end_line: u32,
    decoded: &CodeIndex,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for occ in &doc.occurrences {
        if occ.symbol == own_symbol {
            continue;
        }
        if decoded.is_external(&occ.symbol) {
            continue;
        }
        if occ.range.start_line < start_line || occ.range.start_line > end_line {
            continue;
        }
        if !seen.insert(occ.symbol.clone()) {
            continue;
        }
        let display = doc
            .find_symbol_information(&occ.symbol)
            .map(|info| info.short_name().to_string())
            .unwrap_or_else(|| crate::types::extract_short_name(&occ.symbol).to_string());
        out.push(display);
    }
    out
}

/// Every symbol defined in `doc` whose kind belongs to the TOC kind set,
/// excluding symbols chosen elsewhere in this explore call and names
/// containing a space (test-case labels), sorted by definition line
/// (§4.5 step 6).
fn file_toc(doc: &crate::document::Document, chosen_symbols: &HashSet<String>) -> Vec<TocEntry> {
    let mut entries: Vec<TocEntry> = doc
        .symbol_information
        .iter()
        .filter(|info| info.kind.is_toc_kind())
        .filter(|info| !chosen_symbols.contains(&info.symbol))
        .filter(|info| !info.short_name().contains(' '))
        .filter_map(|info| {
            doc.definitions()
                .find(|occ| occ.symbol == info.symbol)
                .map(|occ| TocEntry { name: info.short_name().to_string(), kind: info.kind, line: occ.range.start_line })
        })
        .collect();
    entries.sort_by_key(|e| e.line);
    entries
}
