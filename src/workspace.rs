//! Ephemeral on-disk workspaces holding one repository checkout each.
//!
//! A [`Workspace`] is a guard: its directory is removed when it is
//! released explicitly or when it is dropped (early return, error
//! propagation, or a cancelled future). Cleanup failures are logged and
//! never surface as errors.
//!
//! Directory names end in the run's ULID, so leftovers of a process that
//! died before cleaning up can be recognised by age and swept with
//! [`WorkspaceManager::sweep_stale`].

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use ulid::Ulid;

use crate::models::RepositoryReference;

/// Allocates workspaces under a shared scratch root.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the workspace for `reference` in run `run_id`.
    pub fn path_for(&self, reference: &RepositoryReference, run_id: &str) -> PathBuf {
        self.root
            .join(format!("{}-{}", reference.dir_name(), run_id))
    }

    /// Acquires a workspace for a fresh run of `reference`.
    pub async fn acquire(&self, reference: &RepositoryReference) -> Workspace {
        let run_id = Ulid::new().to_string().to_lowercase();
        self.acquire_for_run(reference, &run_id).await
    }

    /// Acquires the workspace for `reference` in run `run_id`.
    ///
    /// Any leftover directory at that path is removed first. The workspace
    /// directory itself is not created; the fetch step does that.
    pub async fn acquire_for_run(&self, reference: &RepositoryReference, run_id: &str) -> Workspace {
        let path = self.path_for(reference, run_id);

        if let Err(e) = tokio::fs::create_dir_all(&self.root).await {
            tracing::warn!(root = %self.root.display(), error = %e, "Failed to create scratch root");
        }

        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Removed stale workspace");
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to pre-clean workspace");
            }
        }

        tracing::debug!(repository = %reference, path = %path.display(), "Acquired workspace");
        Workspace { path, armed: true }
    }

    /// Removes workspaces under the root whose run id is older than `max_age`.
    ///
    /// Entries not named `<reference>-<ulid>` are left alone. Returns the
    /// number of directories removed.
    pub fn sweep_stale(&self, max_age: Duration) -> usize {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return 0,
            Err(e) => {
                tracing::warn!(root = %self.root.display(), error = %e, "Failed to scan scratch root");
                return 0;
            }
        };

        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        let max_age_ms = max_age.as_millis() as u64;

        let mut removed = 0;
        for entry in entries.flatten() {
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            let Some(created_ms) = entry.file_name().to_str().and_then(run_timestamp_ms) else {
                continue;
            };
            if !is_dir || now_ms.saturating_sub(created_ms) <= max_age_ms {
                continue;
            }

            let path = entry.path();
            match std::fs::remove_dir_all(&path) {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "Removed stale workspace");
                    removed += 1;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove stale workspace")
                }
            }
        }
        removed
    }
}

/// Creation time encoded in a `<reference>-<ulid>` directory name.
fn run_timestamp_ms(name: &str) -> Option<u64> {
    let (_, run_id) = name.rsplit_once('-')?;
    Ulid::from_string(&run_id.to_ascii_uppercase())
        .ok()
        .map(|id| id.timestamp_ms())
}

fn remove_workspace_dir(path: &Path) {
    match std::fs::remove_dir_all(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed workspace on drop"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove workspace on drop")
        }
    }
}

/// Exclusive handle on one workspace directory.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    armed: bool,
}

impl Workspace {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the workspace directory.
    pub async fn release(mut self) {
        self.armed = false;
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Released workspace"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove workspace")
            }
        }
    }
}

impl Drop for Workspace {
    /// Removal runs on the blocking pool when a runtime is available, so a
    /// large checkout never stalls an async worker.
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let path = std::mem::take(&mut self.path);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || remove_workspace_dir(&path));
            }
            Err(_) => remove_workspace_dir(&path),
        }
    }
}
