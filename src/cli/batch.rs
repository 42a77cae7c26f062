//! Batch analysis command handler.

use color_eyre::Result;

use crate::di::FromRef;
use crate::services::BatchService;

use super::{print_json, App};

impl App {
    /// Run one batch over the catalog and print the report as JSON.
    pub async fn run_batch(&self) -> Result<()> {
        let ctx = self.context()?;
        let report = BatchService::from_ref(&ctx).run().await?;
        print_json(&report)?;

        if report.failed() > 0 {
            tracing::warn!(failed = report.failed(), "Some tools could not be analyzed");
        }
        Ok(())
    }
}
