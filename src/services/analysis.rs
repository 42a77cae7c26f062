//! Single-repository analysis: workspace → fetch → extract → release.

use crate::context::{AppFetcher, Context};
use crate::di::FromRef;
use crate::error::AppError;
use crate::extractor::TechnologyExtractor;
use crate::models::{RepositoryReference, TechnologySet};
use crate::workspace::WorkspaceManager;

/// Service producing the technology set of one repository.
#[derive(Clone)]
pub struct AnalysisService {
    workspaces: WorkspaceManager,
    fetcher: AppFetcher,
    extractor: TechnologyExtractor,
}

impl FromRef<Context> for AnalysisService {
    fn from_ref(ctx: &Context) -> Self {
        Self {
            workspaces: WorkspaceManager::from_ref(ctx),
            fetcher: AppFetcher::from_ref(ctx),
            extractor: TechnologyExtractor::from_ref(ctx),
        }
    }
}

impl AnalysisService {
    pub fn new(
        workspaces: WorkspaceManager,
        fetcher: AppFetcher,
        extractor: TechnologyExtractor,
    ) -> Self {
        Self {
            workspaces,
            fetcher,
            extractor,
        }
    }

    /// Parses `url` and analyzes the repository it names.
    pub async fn analyze_url(&self, url: &str) -> Result<TechnologySet, AppError> {
        let reference = RepositoryReference::parse(url)?;
        self.analyze(&reference).await
    }

    /// Checks out `reference` into a fresh workspace and extracts its technologies.
    ///
    /// The workspace is removed on every exit path: explicitly once the
    /// pipeline has finished, or by the guard if this future is dropped.
    pub async fn analyze(&self, reference: &RepositoryReference) -> Result<TechnologySet, AppError> {
        let workspace = self.workspaces.acquire(reference).await;

        let result = async {
            self.fetcher.fetch(reference, workspace.path()).await?;
            tracing::info!(repository = %reference, "Analyzing stack");
            self.extractor.extract(workspace.path()).await
        }
        .await;

        workspace.release().await;

        match &result {
            Ok(techs) => {
                tracing::info!(repository = %reference, techs = techs.len(), "Analysis complete")
            }
            Err(e) => tracing::error!(repository = %reference, error = %e, "Error analyzing stack"),
        }
        result
    }
}
