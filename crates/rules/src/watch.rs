//! Regenerate-on-change: watch the profile and template directories.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::load::{is_dotfile, is_yaml};

/// Quiet period after the last relevant event before regenerating.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("filesystem watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// The watcher dropped its sender; nothing more will arrive.
    #[error("filesystem watcher stopped")]
    Disconnected,
}

/// Whether an event touches a YAML input file or a category directory.
///
/// Dotfiles are ignored so editor swap files and our own `.tmp` writes do
/// not trigger a rebuild. A directory appearing or disappearing counts, since
/// a category moved in or out of the tree changes the fragment set without
/// any per-file event. Backends that cannot tell files from directories
/// (`Any`, renames) match extensionless paths as possible directories.
pub fn is_relevant(event: &Event) -> bool {
    let input = |p: &PathBuf| is_yaml(p) && !is_dotfile(p);
    let input_or_dir = |p: &PathBuf| (is_yaml(p) || p.extension().is_none()) && !is_dotfile(p);
    match event.kind {
        EventKind::Create(CreateKind::File)
        | EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any)
        | EventKind::Remove(RemoveKind::File) => event.paths.iter().any(input),
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => {
            event.paths.iter().any(|p| !is_dotfile(p))
        }
        EventKind::Create(CreateKind::Any)
        | EventKind::Modify(ModifyKind::Name(_))
        | EventKind::Remove(RemoveKind::Any) => event.paths.iter().any(input_or_dir),
        _ => false,
    }
}

/// Block forever, calling `on_change` once per burst of relevant events.
///
/// `on_change` is responsible for its own error handling; a failed rebuild
/// should leave the previous output untouched and keep watching.
pub fn watch<F>(dirs: &[PathBuf], debounce: Duration, mut on_change: F) -> Result<(), WatchError>
where
    F: FnMut(),
{
    let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
    let mut watcher = notify::recommended_watcher(tx)?;
    for dir in dirs {
        watcher.watch(dir, RecursiveMode::Recursive)?;
        info!(path = %dir.display(), "watching for changes");
    }

    loop {
        let first = rx.recv().map_err(|_| WatchError::Disconnected)?;
        if !accept(first) {
            continue;
        }

        // Swallow the rest of the burst.
        loop {
            match rx.recv_timeout(debounce) {
                Ok(event) => {
                    accept(event);
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return Err(WatchError::Disconnected),
            }
        }

        info!("inputs changed, regenerating");
        on_change();
    }
}

fn accept(event: notify::Result<Event>) -> bool {
    match event {
        Ok(event) if is_relevant(&event) => {
            debug!(paths = ?event.paths, kind = ?event.kind, "input change");
            true
        }
        Ok(_) => false,
        Err(e) => {
            warn!(error = %e, "filesystem watcher error");
            false
        }
    }
}

/// Directories a run reads from, deduplicated.
pub fn input_dirs(profiles_dir: &Path, templates_dir: &Path) -> Vec<PathBuf> {
    let mut dirs = vec![profiles_dir.to_path_buf()];
    if !templates_dir.starts_with(profiles_dir) {
        dirs.push(templates_dir.to_path_buf());
    }
    dirs
}
