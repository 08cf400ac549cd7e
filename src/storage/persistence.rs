//! Durable storage of the Index: load, atomic save, and advisory exclusive
//! locking (§4.1). Grounded on the teacher's write-temp-then-rename shape
//! (`persistence.rs`), extended with fsync, a monotonic-nanos temp suffix,
//! and `fs2`-based cross-process locking, none of which the teacher
//! needed since it never had concurrent writers.

use crate::error::{CogError, IndexResult};
use crate::index::Index;
use crate::storage::codec;
use fs2::FileExt;
use memmap2::Mmap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const INDEX_FILE_NAME: &str = "index.scip";
pub const LOCK_FILE_NAME: &str = "index.lock";

/// A decoded Index together with the memory-mapped file it borrows from.
/// `view` is declared before `_buffer` so it is dropped first: Rust drops
/// struct fields in declaration order, and the borrowed strings in `view`
/// must not outlive the mapping.
pub struct LoadedIndex {
    view: codec::DecodedView<'static>,
    _buffer: Mmap,
}

impl LoadedIndex {
    pub fn view(&self) -> &codec::DecodedView<'_> {
        &self.view
    }

    pub fn materialize(&self) -> Index {
        self.view.materialize()
    }
}

fn index_path(cog_dir: &Path) -> PathBuf {
    cog_dir.join(INDEX_FILE_NAME)
}

fn lock_path(cog_dir: &Path) -> PathBuf {
    cog_dir.join(LOCK_FILE_NAME)
}

/// Load the index at `<cog_dir>/index.scip`. Absent file or parse failure
/// both soft-fail to an empty index, per §4.1 and §7.
pub fn load(cog_dir: &Path) -> IndexResult<Index> {
    let path = index_path(cog_dir);
    if !path.exists() {
        return Ok(Index::new(cog_dir.parent().map(|p| p.display().to_string()).unwrap_or_default()));
    }

    let file = match File::open(&path) {
        Ok(f) => f,
        Err(_) => return Ok(Index::new("")),
    };
    if file.metadata().map(|m| m.len()).unwrap_or(0) == 0 {
        return Ok(Index::new(""));
    }
    let mmap = match unsafe { Mmap::map(&file) } {
        Ok(m) => m,
        Err(_) => return Ok(Index::new("")),
    };

    // The borrow from `mmap` only needs to live for this call: `materialize`
    // copies every field out before `mmap` drops at the end of the scope.
    match codec::decode(&mmap).map(|view| view.materialize()) {
        Ok(index) => Ok(index),
        Err(_) => Ok(Index::new("")),
    }
}

/// Load the index, retaining the backing buffer so borrowed string views
/// remain valid — the path the zero-copy invariant is tested against.
pub fn load_borrowed(cog_dir: &Path) -> IndexResult<Option<LoadedIndex>> {
    let path = index_path(cog_dir);
    if !path.exists() {
        return Ok(None);
    }
    let file = File::open(&path).map_err(|e| CogError::FileRead { path: path.clone(), source: e })?;
    if file.metadata().map(|m| m.len()).unwrap_or(0) == 0 {
        return Ok(None);
    }
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| CogError::FileRead { path: path.clone(), source: e })?;
    let view = codec::decode(&mmap).map_err(|e| CogError::ParseError { path: path.clone(), reason: e.to_string() })?;
    let view: codec::DecodedView<'static> = unsafe { std::mem::transmute(view) };
    Ok(Some(LoadedIndex { view, _buffer: mmap }))
}

/// Serialize and atomically write `index` to `<cog_dir>/index.scip`.
pub fn save(cog_dir: &Path, index: &Index) -> IndexResult<()> {
    fs::create_dir_all(cog_dir).map_err(|e| CogError::FileWrite { path: cog_dir.to_path_buf(), source: e })?;

    let path = index_path(cog_dir);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = cog_dir.join(format!("{INDEX_FILE_NAME}.tmp-{nanos}"));

    let bytes = codec::encode(index);
    let write_result = (|| -> std::io::Result<()> {
        let mut file = OpenOptions::new().write(true).create(true).truncate(true).open(&temp_path)?;
        use std::io::Write;
        file.write_all(&bytes)?;
        file.sync_all()?;
        Ok(())
    })();

    match write_result {
        Ok(()) => fs::rename(&temp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            CogError::FileWrite { path: path.clone(), source: e }
        }),
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            Err(CogError::FileWrite { path: temp_path, source: e })
        }
    }
}

/// Run `f` while holding an advisory exclusive lock on
/// `<cog_dir>/index.lock`. The lock file is created if absent and never
/// unlinked; release happens on every exit path including panics that
/// unwind through `f`, because the OS releases the lock when `lock_file`
/// is dropped.
pub fn with_exclusive_lock<T>(cog_dir: &Path, f: impl FnOnce() -> IndexResult<T>) -> IndexResult<T> {
    fs::create_dir_all(cog_dir).map_err(|e| CogError::FileWrite { path: cog_dir.to_path_buf(), source: e })?;
    let path = lock_path(cog_dir);
    let lock_file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .mode_0644(&path)
        .map_err(|e| CogError::LockAcquireFailure { path: path.clone(), source: e })?;
    lock_file
        .lock_exclusive()
        .map_err(|e| CogError::LockAcquireFailure { path: path.clone(), source: e })?;
    let result = f();
    let _ = fs2::FileExt::unlock(&lock_file);
    result
}

trait OpenExt {
    fn mode_0644(&self, path: &Path) -> std::io::Result<File>;
}

impl OpenExt for OpenOptions {
    #[cfg(unix)]
    fn mode_0644(&self, path: &Path) -> std::io::Result<File> {
        use std::os::unix::fs::OpenOptionsExt;
        self.clone().mode(0o644).open(path)
    }

    #[cfg(not(unix))]
    fn mode_0644(&self, path: &Path) -> std::io::Result<File> {
        self.open(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use tempfile::TempDir;

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let cog_dir = dir.path().join(".cog");
        let mut index = Index::new(dir.path().display().to_string());
        index.upsert_document(Document::new("src/lib.rs", "rust"));

        save(&cog_dir, &index).unwrap();
        let loaded = load(&cog_dir).unwrap();
        assert_eq!(loaded.documents.len(), 1);
        assert_eq!(loaded.documents[0].relative_path, "src/lib.rs");
    }

    #[test]
    fn load_missing_file_is_empty_not_error() {
        let dir = TempDir::new().unwrap();
        let cog_dir = dir.path().join(".cog");
        let loaded = load(&cog_dir).unwrap();
        assert!(loaded.documents.is_empty());
    }

    #[test]
    fn no_tmp_files_remain_after_a_clean_save() {
        let dir = TempDir::new().unwrap();
        let cog_dir = dir.path().join(".cog");
        let index = Index::new(dir.path().display().to_string());
        save(&cog_dir, &index).unwrap();

        let leftovers: Vec<_> = fs::read_dir(&cog_dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn an_interrupted_save_leaves_the_previous_index_intact() {
        let dir = TempDir::new().unwrap();
        let cog_dir = dir.path().join(".cog");
        let mut original = Index::new(dir.path().display().to_string());
        original.upsert_document(Document::new("src/lib.rs", "rust"));
        save(&cog_dir, &original).unwrap();

        // Simulate a crash between the temp-write and the rename: a stray
        // tmp file exists but never replaced index.scip.
        fs::write(cog_dir.join(format!("{INDEX_FILE_NAME}.tmp-12345")), b"partial garbage").unwrap();

        let loaded = load(&cog_dir).unwrap();
        assert_eq!(loaded.documents.len(), 1);
        assert_eq!(loaded.documents[0].relative_path, "src/lib.rs");

        let stray: Vec<_> = fs::read_dir(&cog_dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name != INDEX_FILE_NAME)
            .collect();
        assert_eq!(stray, vec![format!("{INDEX_FILE_NAME}.tmp-12345")]);
    }

    #[test]
    fn exclusive_lock_runs_closure_and_releases() {
        let dir = TempDir::new().unwrap();
        let cog_dir = dir.path().join(".cog");
        let result = with_exclusive_lock(&cog_dir, || Ok(42)).unwrap();
        assert_eq!(result, 42);
        // A second acquisition must succeed now that the first released.
        with_exclusive_lock(&cog_dir, || Ok(())).unwrap();
    }
}
