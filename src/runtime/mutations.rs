//! Write-through mutations (§4.6.3): each edits the filesystem then
//! reindexes so the next query reflects the change. All four run under
//! `storage::with_exclusive_lock` transitively via [`crate::indexing`]'s
//! pipeline entry points.

use crate::error::{CogError, IndexResult};
use crate::indexing::LanguageRegistry;
use std::fs;
use std::path::Path;

/// Exact-substring replace of `old_text` with `new_text`; fails if
/// `old_text` is absent or appears more than once (§4.6.3).
pub fn edit(root: &Path, relative_path: &str, old_text: &str, new_text: &str, registry: &LanguageRegistry) -> IndexResult<()> {
    let full = root.join(relative_path);
    let contents = fs::read_to_string(&full).map_err(|source| CogError::FileRead { path: full.clone(), source })?;

    let count = contents.matches(old_text).count();
    if count == 0 {
        return Err(CogError::ExactNotFound { path: full, old_text: old_text.to_string() });
    }
    if count > 1 {
        return Err(CogError::AmbiguousEdit { path: full, old_text: old_text.to_string(), count });
    }

    let updated = contents.replacen(old_text, new_text, 1);
    fs::write(&full, updated).map_err(|source| CogError::FileWrite { path: full, source })?;
    crate::indexing::reindex_file(root, relative_path, registry)
}

/// Refuse if the target already exists; otherwise create parent
/// directories and write the new file (§4.6.3).
pub fn create(root: &Path, relative_path: &str, contents: &str, registry: &LanguageRegistry) -> IndexResult<()> {
    let full = root.join(relative_path);
    if full.exists() {
        return Err(CogError::AlreadyExists { path: full });
    }
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).map_err(|source| CogError::FileWrite { path: parent.to_path_buf(), source })?;
    }
    fs::write(&full, contents).map_err(|source| CogError::FileWrite { path: full, source })?;
    crate::indexing::reindex_file(root, relative_path, registry)
}

/// Remove the file and its document from the index (§4.6.3).
pub fn delete(root: &Path, relative_path: &str) -> IndexResult<()> {
    let full = root.join(relative_path);
    fs::remove_file(&full).map_err(|source| CogError::FileWrite { path: full, source })?;
    crate::indexing::remove_file(root, relative_path)?;
    Ok(())
}

/// Move the file, drop the old document, and reindex at the new path
/// (§4.6.3).
pub fn rename(root: &Path, from_relative_path: &str, to_relative_path: &str, registry: &LanguageRegistry) -> IndexResult<()> {
    let full_from = root.join(from_relative_path);
    let full_to = root.join(to_relative_path);
    if full_to.exists() {
        return Err(CogError::AlreadyExists { path: full_to });
    }
    if let Some(parent) = full_to.parent() {
        fs::create_dir_all(parent).map_err(|source| CogError::FileWrite { path: parent.to_path_buf(), source })?;
    }
    fs::rename(&full_from, &full_to).map_err(|source| CogError::FileWrite { path: full_from, source })?;
    crate::indexing::remove_file(root, from_relative_path)?;
    crate::indexing::reindex_file(root, to_relative_path, registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn edit_replaces_a_unique_match_and_reindexes() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.rs"), "fn foo() {}\n").unwrap();
        let registry = LanguageRegistry::with_defaults();
        edit(dir.path(), "a.rs", "foo", "bar", &registry).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("a.rs")).unwrap(), "fn bar() {}\n");
    }

    #[test]
    fn edit_refuses_an_ambiguous_match() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.rs"), "foo foo\n").unwrap();
        let registry = LanguageRegistry::with_defaults();
        let err = edit(dir.path(), "a.rs", "foo", "bar", &registry).unwrap_err();
        assert!(matches!(err, CogError::AmbiguousEdit { count: 2, .. }));
        assert_eq!(fs::read_to_string(dir.path().join("a.rs")).unwrap(), "foo foo\n");
    }

    #[test]
    fn create_refuses_when_target_exists() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.rs"), "").unwrap();
        let registry = LanguageRegistry::with_defaults();
        let err = create(dir.path(), "a.rs", "fn x() {}", &registry).unwrap_err();
        assert!(matches!(err, CogError::AlreadyExists { .. }));
    }

    #[test]
    fn delete_removes_the_file_from_disk() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.rs"), "fn foo() {}\n").unwrap();
        delete(dir.path(), "a.rs").unwrap();
        assert!(!dir.path().join("a.rs").exists());
    }

    #[test]
    fn rename_moves_the_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.rs"), "fn foo() {}\n").unwrap();
        let registry = LanguageRegistry::with_defaults();
        rename(dir.path(), "a.rs", "b.rs", &registry).unwrap();
        assert!(!dir.path().join("a.rs").exists());
        assert!(dir.path().join("b.rs").exists());
    }

    #[test]
    fn create_then_delete_is_visible_to_find_immediately() {
        use crate::index::decoded::CodeIndex;

        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(crate::config::COG_DIR_NAME)).unwrap();
        let registry = LanguageRegistry::with_defaults();

        create(dir.path(), "pkg/a.js", "export function integrationTestHelper(){}", &registry).unwrap();
        let cog_dir = dir.path().join(crate::config::COG_DIR_NAME);
        let index = crate::storage::load(&cog_dir).unwrap();
        let decoded = CodeIndex::build(&index);
        let found = crate::query::find(&decoded, "integrationTestHelper", None, None);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, "pkg/a.js");

        delete(dir.path(), "pkg/a.js").unwrap();
        let index = crate::storage::load(&cog_dir).unwrap();
        let decoded = CodeIndex::build(&index);
        let found = crate::query::find(&decoded, "integrationTestHelper", None, None);
        assert!(found.is_empty());
    }
}
