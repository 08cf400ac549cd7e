//! Filesystem watcher integration (§4.6.3, §5): one background thread
//! watches the project root recursively; the main loop polls its channel
//! alongside stdin and drains it between JSON-RPC messages.

use crate::error::CogError;
use crate::indexing::walker::SKIP_DIRS;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Spawn the watcher and return its handle (kept alive for as long as the
/// watch should run) plus the channel of changed-path events.
pub fn spawn_watcher(root: PathBuf) -> Result<(RecommendedWatcher, mpsc::UnboundedReceiver<PathBuf>), CogError> {
    let (tx, rx) = mpsc::unbounded_channel();
    let watch_root = root.clone();

    let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
        let Ok(event) = result else { return };
        if !is_relevant(&event.kind) {
            return;
        }
        for path in event.paths {
            if should_forward(&watch_root, &path) {
                let _ = tx.send(path);
            }
        }
    })
    .map_err(|e| CogError::General(format!("failed to start filesystem watcher: {e}")))?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|e| CogError::General(format!("failed to watch '{}': {e}", root.display())))?;

    Ok((watcher, rx))
}

fn is_relevant(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_))
}

fn should_forward(root: &Path, path: &Path) -> bool {
    let Ok(relative) = path.strip_prefix(root) else { return false };
    relative.components().all(|c| match c.as_os_str().to_str() {
        Some(name) => !name.starts_with('.') && !SKIP_DIRS.contains(&name),
        None => true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwards_paths_outside_skip_dirs() {
        let root = Path::new("/proj");
        assert!(should_forward(root, Path::new("/proj/src/lib.rs")));
        assert!(!should_forward(root, Path::new("/proj/target/debug/build")));
        assert!(!should_forward(root, Path::new("/proj/.git/HEAD")));
    }
}
