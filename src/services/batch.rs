//! Batch analysis over the tool catalog.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};

use crate::config::{BatchConfig, Config};
use crate::context::{AppStore, Context};
use crate::di::FromRef;
use crate::error::AppError;
use crate::models::{BatchItem, BatchOutcome, BatchReport, RepositoryReference, Tool};
use crate::services::{AnalysisService, ReconcileService};

/// Runs the full pipeline for every eligible tool with bounded concurrency.
///
/// A failure in one tool's pipeline becomes that tool's error record; it
/// never aborts the other tools or the run. The same holds for a tool that
/// exceeds the per-item timeout.
#[derive(Clone)]
pub struct BatchService {
    store: AppStore,
    analysis: AnalysisService,
    reconcile: ReconcileService,
    settings: BatchConfig,
    item_timeout: Option<Duration>,
}

impl FromRef<Context> for BatchService {
    fn from_ref(ctx: &Context) -> Self {
        let config = Arc::<Config>::from_ref(ctx);
        let mut service = Self::new(
            AppStore::from_ref(ctx),
            AnalysisService::from_ref(ctx),
            ReconcileService::from_ref(ctx),
            config.batch.clone(),
        );
        if let Some(secs) = config
            .batch
            .item_timeout_secs
            .or(config.server.request_timeout_secs)
        {
            service = service.with_item_timeout(Duration::from_secs(secs));
        }
        service
    }
}

impl BatchService {
    pub fn new(
        store: AppStore,
        analysis: AnalysisService,
        reconcile: ReconcileService,
        settings: BatchConfig,
    ) -> Self {
        Self {
            store,
            analysis,
            reconcile,
            settings,
            item_timeout: None,
        }
    }

    /// Bounds each tool's pipeline by `timeout`.
    pub fn with_item_timeout(mut self, timeout: Duration) -> Self {
        self.item_timeout = Some(timeout);
        self
    }

    /// Selects eligible tools and processes them.
    ///
    /// Only the selection query can fail the whole run.
    pub async fn run(&self) -> Result<BatchReport, AppError> {
        let started_at = Utc::now();
        let tools = self
            .store
            .find_tools(&self.settings.statuses, self.settings.limit)
            .await?;
        let total = tools.len();
        let concurrency = self.settings.concurrency.max(1);

        tracing::info!(total, concurrency, "Starting batch analysis");

        let mut indexed: Vec<(usize, BatchItem)> = stream::iter(tools.into_iter().enumerate())
            .map(|(idx, tool)| async move { (idx, self.process(tool).await) })
            .buffer_unordered(concurrency)
            .collect()
            .await;
        indexed.sort_by_key(|(idx, _)| *idx);
        let results: Vec<BatchItem> = indexed.into_iter().map(|(_, item)| item).collect();

        let report = BatchReport {
            total,
            processed: results.len(),
            started_at,
            finished_at: Utc::now(),
            results,
        };

        tracing::info!(
            total = report.total,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Batch analysis finished"
        );
        Ok(report)
    }

    /// Runs one tool through the pipeline and records its outcome.
    ///
    /// A timed-out pipeline is dropped; an unfinished association
    /// replacement rolls back with it.
    async fn process(&self, tool: Tool) -> BatchItem {
        let result = match self.item_timeout {
            Some(limit) => tokio::time::timeout(limit, self.analyze_tool(&tool))
                .await
                .unwrap_or_else(|_| Err(AppError::Timeout(limit))),
            None => self.analyze_tool(&tool).await,
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(tool_id = %tool.id, name = %tool.name, error = %e, "Tool analysis failed");
                BatchOutcome::Error {
                    message: e.detailed_message(),
                }
            }
        };

        BatchItem {
            tool_id: tool.id,
            name: tool.name,
            outcome,
        }
    }

    async fn analyze_tool(&self, tool: &Tool) -> Result<BatchOutcome, AppError> {
        let reference = RepositoryReference::parse(&tool.repository_url)?;
        let techs = self.analysis.analyze(&reference).await?;
        let matched = self.reconcile.reconcile(&tool.id, &techs).await?;

        Ok(BatchOutcome::Success {
            matched_slugs: matched.into_iter().map(|s| s.slug).collect(),
            extracted_techs: techs.to_vec(),
        })
    }
}
