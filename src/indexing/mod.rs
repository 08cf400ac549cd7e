//! The Indexer Pipeline (§4.2): expands glob patterns into a file list,
//! dispatches each file to its registered backend, merges the results into
//! the Index by path, and persists the result under an exclusive lock.

pub mod backend;
pub mod backends;
pub mod glob;
pub mod walker;

pub use backend::LanguageRegistry;

use crate::error::IndexResult;
use crate::index::Index;
use crate::storage;
use std::path::Path;

/// Index every file matched by `patterns` under `root`, merging into
/// whatever index already exists in `root/.cog` and writing the result
/// back out. Returns the number of files processed.
pub fn index(root: &Path, patterns: &[String], registry: &LanguageRegistry) -> IndexResult<usize> {
    let cog_dir = root.join(crate::config::COG_DIR_NAME);
    let files = walker::expand_patterns(root, patterns);
    tracing::info!("indexing {} files matched by {} pattern(s)", files.len(), patterns.len());

    storage::with_exclusive_lock(&cog_dir, || {
        let mut current = storage::load(&cog_dir)?;
        current.metadata.project_root = root.display().to_string();

        for path in &files {
            index_one_file(&mut current, root, path, registry)?;
        }

        storage::save(&cog_dir, &current)?;
        Ok(files.len())
    })
}

/// Re-index a single file already known to be under `root`, used by the
/// filesystem watcher's change handler. Reads the existing index, replaces
/// (or inserts) this file's document, and persists the update.
pub fn reindex_file(root: &Path, relative_path: &str, registry: &LanguageRegistry) -> IndexResult<()> {
    let cog_dir = root.join(crate::config::COG_DIR_NAME);
    storage::with_exclusive_lock(&cog_dir, || {
        let mut current = storage::load(&cog_dir)?;
        index_one_file(&mut current, root, &root.join(relative_path), registry)?;
        storage::save(&cog_dir, &current)
    })
}

/// Drop a file's document from the index, used when the watcher observes a
/// delete. Returns whether a document was actually removed.
pub fn remove_file(root: &Path, relative_path: &str) -> IndexResult<bool> {
    let cog_dir = root.join(crate::config::COG_DIR_NAME);
    storage::with_exclusive_lock(&cog_dir, || {
        let mut current = storage::load(&cog_dir)?;
        let removed = current.remove_document(relative_path);
        if removed {
            storage::save(&cog_dir, &current)?;
        }
        Ok(removed)
    })
}

fn index_one_file(index: &mut Index, root: &Path, path: &Path, registry: &LanguageRegistry) -> IndexResult<()> {
    let relative_path = match path.strip_prefix(root) {
        Ok(rel) => normalize_path(rel),
        Err(_) => normalize_path(path),
    };

    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(source) => {
            tracing::warn!("recording a stub for unreadable file '{}': {}", relative_path, source);
            index.upsert_document(crate::document::Document::stub(relative_path, "unknown"));
            return Ok(());
        }
    };

    let document = match registry.for_path(path) {
        Some(backend) => backend.run(&source, &relative_path).unwrap_or_else(|| {
            tracing::debug!("backend declined to parse '{}', recording a stub", relative_path);
            crate::document::Document::stub(relative_path.clone(), backend.language())
        }),
        None => crate::document::Document::stub(relative_path.clone(), "unknown"),
    };

    index.upsert_document(document);
    Ok(())
}

fn normalize_path(path: &Path) -> String {
    path.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect::<Vec<_>>().join("/")
}
