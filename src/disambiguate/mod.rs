//! The Disambiguation Engine (§4.4): given N name queries and their
//! candidate lists from the Query Engine, choose one candidate per query
//! so the chosen set clusters into the same or neighboring files.

use crate::query::FindMatch;
use std::collections::HashSet;

/// One query fed into [`disambiguate`]: a name plus its candidates, in the
/// order the Query Engine returned them.
pub struct Query {
    pub candidates: Vec<FindMatch>,
}

/// The chosen candidate index for a query, or `None` if it had zero
/// candidates — a state that later passes must never overwrite (§4.4).
pub type Selection = Option<usize>;

fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => &path[..i],
        None => "",
    }
}

/// The set of every symbol occurring in one file, used for the
/// "candidate's symbol appears in the anchor's file" bonus.
fn file_occurrence_set(path: &str, index: &crate::index::decoded::CodeIndex) -> HashSet<String> {
    index
        .symbol_to_refs
        .iter()
        .filter(|(_, refs)| refs.iter().any(|r| r.path == path))
        .map(|(symbol, _)| symbol.clone())
        .collect()
}

struct AnchorInfo {
    query_idx: usize,
    candidate_idx: usize,
    file_occurrences: HashSet<String>,
}

/// Resolve a selection per query (§4.4's four phases).
pub fn disambiguate(queries: &[Query], index: &crate::index::decoded::CodeIndex) -> Vec<Selection> {
    let mut selections: Vec<Selection> = vec![None; queries.len()];
    let mut anchors: Vec<AnchorInfo> = Vec::new();
    let mut floaters: Vec<usize> = Vec::new();

    // Phase 1: classify.
    for (qi, query) in queries.iter().enumerate() {
        match query.candidates.len() {
            0 => {} // selection stays None
            1 => {
                selections[qi] = Some(0);
                anchors.push(AnchorInfo {
                    query_idx: qi,
                    candidate_idx: 0,
                    file_occurrences: file_occurrence_set(&query.candidates[0].path, index),
                });
            }
            _ => floaters.push(qi),
        }
    }

    // Phase 2: short-circuit.
    if floaters.is_empty() {
        return selections;
    }

    // Phase 3: pair-link fallback, only with zero anchors and >=2 floaters.
    if anchors.is_empty() && floaters.len() >= 2 {
        if let Some((best_qi, best_ci, best_qj, best_cj)) = best_floater_pair(queries, &floaters, index) {
            selections[best_qi] = Some(best_ci);
            selections[best_qj] = Some(best_cj);
            anchors.push(AnchorInfo {
                query_idx: best_qi,
                candidate_idx: best_ci,
                file_occurrences: file_occurrence_set(&queries[best_qi].candidates[best_ci].path, index),
            });
            anchors.push(AnchorInfo {
                query_idx: best_qj,
                candidate_idx: best_cj,
                file_occurrences: file_occurrence_set(&queries[best_qj].candidates[best_cj].path, index),
            });
            floaters.retain(|&qi| qi != best_qi && qi != best_qj);
        }
    }

    // Phase 4: resolve remaining floaters against the anchor set.
    for qi in floaters {
        let candidates = &queries[qi].candidates;
        let mut best_idx = 0usize;
        let mut best_score = i64::MIN;
        for (ci, candidate) in candidates.iter().enumerate() {
            let mut score = candidate.score as i64;
            for anchor in &anchors {
                if anchor.query_idx == qi {
                    continue;
                }
                let anchor_candidate = &queries[anchor.query_idx].candidates[anchor.candidate_idx];
                if candidate.path == anchor_candidate.path {
                    score += 50;
                }
                if anchor.file_occurrences.contains(&candidate.symbol) {
                    score += 30;
                }
                let candidate_file_occurrences = file_occurrence_set(&candidate.path, index);
                if candidate_file_occurrences.contains(&anchor_candidate.symbol) {
                    score += 30;
                }
                if dirname(&candidate.path) == dirname(&anchor_candidate.path) {
                    score += 10;
                }
            }
            if score > best_score {
                best_score = score;
                best_idx = ci;
            }
        }
        selections[qi] = Some(best_idx);
    }

    selections
}

fn best_floater_pair(
    queries: &[Query],
    floaters: &[usize],
    index: &crate::index::decoded::CodeIndex,
) -> Option<(usize, usize, usize, usize)> {
    let mut best: Option<(i64, usize, usize, usize, usize)> = None;

    for (a, &qi) in floaters.iter().enumerate() {
        for &qj in &floaters[a + 1..] {
            for (ci, ci_cand) in queries[qi].candidates.iter().enumerate() {
                let ci_file_occurrences = file_occurrence_set(&ci_cand.path, index);
                for (cj, cj_cand) in queries[qj].candidates.iter().enumerate() {
                    let mut score = 0i64;
                    if ci_cand.path == cj_cand.path {
                        score += 50;
                    }
                    if ci_file_occurrences.contains(&cj_cand.symbol) {
                        score += 30;
                    }
                    let cj_file_occurrences = file_occurrence_set(&cj_cand.path, index);
                    if cj_file_occurrences.contains(&ci_cand.symbol) {
                        score += 30;
                    }
                    if dirname(&ci_cand.path) == dirname(&cj_cand.path) {
                        score += 10;
                    }
                    let better = match &best {
                        None => true,
                        Some((best_score, ..)) => score > *best_score,
                    };
                    if better {
                        best = Some((score, qi, ci, qj, cj));
                    }
                }
            }
        }
    }

    best.map(|(_, qi, ci, qj, cj)| (qi, ci, qj, cj))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::index::Index;
    use crate::symbol::{Occurrence, SymbolInformation};
    use crate::types::{Range, Role, SymbolKind};

    fn make_match(path: &str, symbol: &str, display: &str, score: i32) -> FindMatch {
        FindMatch {
            symbol: symbol.to_string(),
            path: path.to_string(),
            line: 1,
            end_line: 1,
            kind: SymbolKind::Function,
            display_name: display.to_string(),
            score,
        }
    }

    fn empty_index() -> crate::index::decoded::CodeIndex {
        crate::index::decoded::CodeIndex::build(&Index::new("/proj"))
    }

    #[test]
    fn anchor_selection_is_fixed_and_unique_candidates_resolve_immediately() {
        let queries = vec![Query { candidates: vec![make_match("src/settings.rs", "pkg 1.0 settings/Settings#", "Settings", 100)] }];
        let selections = disambiguate(&queries, &empty_index());
        assert_eq!(selections, vec![Some(0)]);
    }

    #[test]
    fn two_unique_queries_both_select_their_only_candidate() {
        let queries = vec![
            Query { candidates: vec![make_match("src/settings.rs", "pkg 1.0 settings/Settings#", "Settings", 100)] },
            Query { candidates: vec![make_match("src/brain.rs", "pkg 1.0 brain/initBrain().", "initBrain", 100)] },
        ];
        let selections = disambiguate(&queries, &empty_index());
        assert_eq!(selections, vec![Some(0), Some(0)]);
    }

    #[test]
    fn empty_candidate_list_selection_is_none_not_zero() {
        let queries = vec![
            Query { candidates: vec![] },
            Query { candidates: vec![make_match("src/commands/init.rs", "pkg 1.0 init/init().", "init", 100)] },
        ];
        let selections = disambiguate(&queries, &empty_index());
        assert_eq!(selections[0], None);
        assert_eq!(selections[1], Some(0));
    }

    #[test]
    fn floater_prefers_candidate_sharing_an_anchor_file() {
        let mut index = Index::new("/proj");
        let mut settings_doc = Document::new("src/commands/mod.rs", "rust");
        settings_doc.occurrences.push(Occurrence {
            range: Range::single_line(10, 0, 3),
            symbol: "pkg 1.0 settings/Settings#".to_string(),
            roles: Role::READ_ACCESS,
            syntax_kind: None,
            enclosing_range: None,
        });
        index.upsert_document(settings_doc);
        let decoded = crate::index::decoded::CodeIndex::build(&index);

        let anchor = make_match("src/commands/mod.rs", "pkg 1.0 settings/Settings#", "Settings", 100);
        let init_in_commands = make_match("src/commands/mod.rs", "pkg 1.0 commands/init().", "init", 80);
        let init_in_http = make_match("src/http/mod.rs", "pkg 1.0 http/init().", "init", 80);

        let queries = vec![
            Query { candidates: vec![init_in_commands.clone(), init_in_http] },
            Query { candidates: vec![anchor] },
        ];
        let selections = disambiguate(&queries, &decoded);
        assert_eq!(queries[0].candidates[selections[0].unwrap()].path, "src/commands/mod.rs");
    }

    #[test]
    fn all_floaters_pair_link_to_the_best_scoring_pair() {
        let a1 = make_match("src/pkg/a.rs", "pkg 1.0 pkg/a().", "a", 80);
        let a2 = make_match("src/other/a.rs", "pkg 1.0 other/a().", "a", 80);
        let b1 = make_match("src/pkg/b.rs", "pkg 1.0 pkg/b().", "b", 80);
        let b2 = make_match("src/elsewhere/b.rs", "pkg 1.0 elsewhere/b().", "b", 80);

        let queries = vec![Query { candidates: vec![a1, a2] }, Query { candidates: vec![b1, b2] }];
        let selections = disambiguate(&queries, &empty_index());
        assert!(selections[0].is_some());
        assert!(selections[1].is_some());
        // The same-directory pair (src/pkg/a.rs, src/pkg/b.rs) should win.
        assert_eq!(queries[0].candidates[selections[0].unwrap()].path, "src/pkg/a.rs");
        assert_eq!(queries[1].candidates[selections[1].unwrap()].path, "src/pkg/b.rs");
    }

    #[test]
    fn unrelated_empty_query_never_changes_other_selections() {
        let anchor = make_match("src/settings.rs", "pkg 1.0 settings/Settings#", "Settings", 100);
        let queries_without = vec![Query { candidates: vec![anchor.clone()] }];
        let queries_with = vec![Query { candidates: vec![anchor] }, Query { candidates: vec![] }];

        let without = disambiguate(&queries_without, &empty_index());
        let with = disambiguate(&queries_with, &empty_index());
        assert_eq!(without[0], with[0]);
    }
}
