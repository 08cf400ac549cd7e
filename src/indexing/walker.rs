//! Bounded recursive directory walk rooted at a glob pattern's literal
//! prefix (§4.2), skipping hidden directories and a fixed build-output
//! skip list. Grounded on the teacher's `indexing/walker.rs` traversal
//! shape; matching itself is delegated to [`super::glob`].

use super::glob::glob_match;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directory names never descended into, matching the watcher's ignore
/// list (§6).
pub const SKIP_DIRS: &[&str] = &["node_modules", "vendor", "target", "dist", "build"];

fn is_skipped_dir(name: &str) -> bool {
    name.starts_with('.') || SKIP_DIRS.contains(&name)
}

/// Expand one glob pattern into the matching, relative (to `root`) file
/// paths beneath it.
pub fn expand_pattern(root: &Path, pattern: &str) -> Vec<String> {
    let prefix = super::glob::glob_prefix(pattern);
    let walk_root = if prefix == "." { root.to_path_buf() } else { root.join(prefix) };
    if !walk_root.exists() {
        return Vec::new();
    }

    let mut matches = Vec::new();
    for entry in WalkDir::new(&walk_root)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || e.file_name()
                    .to_str()
                    .map(|name| e.file_type().is_file() || !is_skipped_dir(name))
                    .unwrap_or(false)
        })
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else { continue };
        let rel_str = normalize(rel);
        if glob_match(pattern, &rel_str) {
            matches.push(rel_str);
        }
    }
    matches.sort();
    matches
}

fn normalize(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

pub fn expand_patterns(root: &Path, patterns: &[String]) -> Vec<PathBuf> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for pattern in patterns {
        for rel in expand_pattern(root, pattern) {
            if seen.insert(rel.clone()) {
                out.push(root.join(&rel));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn expand_pattern_skips_hidden_and_build_dirs() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("src/lib.rs"), "").unwrap();
        fs::write(dir.path().join("node_modules/pkg/index.rs"), "").unwrap();
        fs::write(dir.path().join(".git/HEAD.rs"), "").unwrap();

        let matches = expand_pattern(dir.path(), "**/*.rs");
        assert_eq!(matches, vec!["src/lib.rs".to_string()]);
    }

    #[test]
    fn expand_pattern_bounds_walk_by_glob_prefix() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join("other")).unwrap();
        fs::write(dir.path().join("src/lib.rs"), "").unwrap();
        fs::write(dir.path().join("other/lib.rs"), "").unwrap();

        let matches = expand_pattern(dir.path(), "src/*.rs");
        assert_eq!(matches, vec!["src/lib.rs".to_string()]);
    }
}
