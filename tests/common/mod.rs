//! Shared fixtures for the pipeline and HTTP tests.
//!
//! [`ScriptedFetcher`] "checks out" a repository by writing its scripted
//! detector output into the workspace, and [`FileEngine`] reads that file
//! back, so every test run goes through a real workspace directory.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use stackscan::config::Config;
use stackscan::context::Context;
use stackscan::engine::DetectionEngine;
use stackscan::error::AppError;
use stackscan::fetcher::RepositoryFetcher;
use stackscan::models::{RepositoryReference, Stack, TechnologyReport, Tool, ToolStatus};
use stackscan::store::MemoryStore;

pub const API_KEY: &str = "test-key";
pub const REPORT_FILE: &str = "stack.json";

/// What the fetcher does for one repository.
#[derive(Debug, Clone)]
pub enum Checkout {
    /// Clone succeeds; the checkout holds this detector output.
    Report(String),
    /// Clone fails with the given stderr.
    Unreachable(String),
}

#[derive(Default)]
pub struct ScriptedFetcher {
    repositories: HashMap<String, Checkout>,
    delay: Option<Duration>,
    destinations: Mutex<Vec<PathBuf>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, repository: &str, checkout: Checkout) -> Self {
        self.repositories.insert(repository.to_string(), checkout);
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Workspace paths handed to the fetcher so far.
    pub fn destinations(&self) -> Vec<PathBuf> {
        self.destinations.lock().unwrap().clone()
    }
}

#[async_trait]
impl RepositoryFetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        reference: &RepositoryReference,
        destination: &Path,
    ) -> Result<(), AppError> {
        self.destinations
            .lock()
            .unwrap()
            .push(destination.to_path_buf());

        tokio::fs::create_dir_all(destination).await.unwrap();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.repositories.get(&reference.to_string()) {
            Some(Checkout::Report(json)) => {
                tokio::fs::write(destination.join(REPORT_FILE), json)
                    .await
                    .unwrap();
                Ok(())
            }
            Some(Checkout::Unreachable(stderr)) => Err(AppError::Fetch {
                repository: reference.to_string(),
                cause: stderr.clone(),
            }),
            None => Err(AppError::Fetch {
                repository: reference.to_string(),
                cause: "fatal: repository not found".into(),
            }),
        }
    }
}

/// Decodes the report file left in the checkout by [`ScriptedFetcher`].
pub struct FileEngine;

#[async_trait]
impl DetectionEngine for FileEngine {
    async fn analyze(&self, root: &Path) -> Result<TechnologyReport, AppError> {
        let raw = tokio::fs::read_to_string(root.join(REPORT_FILE))
            .await
            .map_err(|e| AppError::Analysis {
                cause: e.to_string(),
            })?;
        serde_json::from_str(&raw).map_err(|e| AppError::Analysis {
            cause: e.to_string(),
        })
    }
}

pub fn tool(id: &str, name: &str, url: &str, status: ToolStatus) -> Tool {
    Tool {
        id: id.into(),
        name: name.into(),
        repository_url: url.into(),
        status,
    }
}

/// Store seeded with a small stack catalog.
pub async fn catalog() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for (id, slug) in [
        ("s-react", "react"),
        ("s-postgresql", "postgresql"),
        ("s-mongodb", "mongodb"),
        ("s-nodejs", "nodejs"),
        ("s-typescript", "typescript"),
        ("s-github", "github"),
    ] {
        store.add_stack(Stack::new(id, slug)).await;
    }
    store
}

/// Context over in-process collaborators with workspaces under `scratch`.
pub fn context(store: Arc<MemoryStore>, fetcher: Arc<ScriptedFetcher>, scratch: &Path) -> Context {
    let mut config = Config::new(API_KEY, "", "postgresql://unused@localhost/unused");
    config.workspace.root = Some(scratch.to_path_buf());
    Context::new(config, store, Arc::new(FileEngine), fetcher)
}

/// Number of entries left under the workspace root.
pub fn leftover_workspaces(scratch: &Path) -> usize {
    match std::fs::read_dir(scratch) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

/// Waits for workspaces removed on drop, which happens on the blocking pool.
/// Returns whatever is still left after a few seconds.
pub async fn settled_workspaces(scratch: &Path) -> usize {
    for _ in 0..100 {
        if leftover_workspaces(scratch) == 0 {
            return 0;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    leftover_workspaces(scratch)
}
