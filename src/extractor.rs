//! Technology extraction: runs the detection engine over a workspace and
//! reduces its nested report to a flat [`TechnologySet`].

use std::path::Path;

use crate::context::{AppEngine, Context};
use crate::di::FromRef;
use crate::error::AppError;
use crate::models::TechnologySet;

#[derive(Clone)]
pub struct TechnologyExtractor {
    engine: AppEngine,
}

impl FromRef<Context> for TechnologyExtractor {
    fn from_ref(ctx: &Context) -> Self {
        Self::new(AppEngine::from_ref(ctx))
    }
}

impl TechnologyExtractor {
    pub fn new(engine: AppEngine) -> Self {
        Self { engine }
    }

    /// Detects the technologies used by the tree rooted at `root`.
    pub async fn extract(&self, root: &Path) -> Result<TechnologySet, AppError> {
        let report = self.engine.analyze(root).await.map_err(|e| match e {
            AppError::Analysis { .. } => e,
            other => AppError::Analysis {
                cause: other.to_string(),
            },
        })?;

        let techs = report.flatten();
        tracing::debug!(
            root = %root.display(),
            children = report.childs.len(),
            techs = techs.len(),
            "Flattened detection report"
        );
        Ok(techs)
    }
}
