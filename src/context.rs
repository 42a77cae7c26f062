//! Application context providing the dependency injection root.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::engine::{CommandEngine, DetectionEngine};
use crate::error::AppError;
use crate::fetcher::{self, RepositoryFetcher};
use crate::store::{CatalogStore, PostgresStore};
use crate::workspace::WorkspaceManager;

/// Shared catalog store.
pub type AppStore = Arc<dyn CatalogStore>;
/// Shared detection engine.
pub type AppEngine = Arc<dyn DetectionEngine>;
/// Shared repository fetcher.
pub type AppFetcher = Arc<dyn RepositoryFetcher>;

/// Root application context.
///
/// Holds every shared collaborator; services resolve their fields from it
/// via [`FromRef`](crate::di::FromRef). Cloning is cheap.
#[derive(Clone)]
pub struct Context {
    /// Application configuration.
    pub config: Arc<Config>,
    /// Tool catalog.
    pub store: AppStore,
    pub engine: AppEngine,
    pub fetcher: AppFetcher,
    pub workspaces: WorkspaceManager,
}

crate::provide!(Context {
    config: Arc<Config>,
    store: AppStore,
    engine: AppEngine,
    fetcher: AppFetcher,
    workspaces: WorkspaceManager,
});

impl Context {
    /// Creates a context from explicit collaborators.
    pub fn new(config: Config, store: AppStore, engine: AppEngine, fetcher: AppFetcher) -> Self {
        let workspaces = WorkspaceManager::new(config.workspace.effective_root());
        Self {
            config: Arc::new(config),
            store,
            engine,
            fetcher,
            workspaces,
        }
    }

    /// Wires the production collaborators described by `config` and sweeps
    /// workspaces left behind by earlier processes.
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let store = Arc::new(PostgresStore::connect(&config.database_url)?);
        let engine = Arc::new(CommandEngine::from_config(&config.engine));
        let fetcher = fetcher::from_config(&config.fetch, &config.github_token);
        let ctx = Self::new(config, store, engine, fetcher);

        let stale_after = Duration::from_secs(ctx.config.workspace.stale_after_secs);
        let swept = ctx.workspaces.sweep_stale(stale_after);
        if swept > 0 {
            tracing::info!(swept, root = %ctx.workspaces.root().display(), "Swept stale workspaces");
        }
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_sweeps_stale_workspaces() {
        let scratch = tempfile::tempdir().unwrap();
        let stale = scratch
            .path()
            .join("acme__widgets-01arz3ndektsv4rrffq69g5fav");
        std::fs::create_dir_all(stale.join(".git")).unwrap();

        let mut config = Config::new("key", "", "postgresql://postgres@127.0.0.1:1/catalog");
        config.workspace.root = Some(scratch.path().to_path_buf());
        let ctx = Context::from_config(config).unwrap();

        assert_eq!(ctx.workspaces.root(), scratch.path());
        assert!(!stale.exists());
    }
}
