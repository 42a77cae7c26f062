//! Single-repository analysis command handler.

use color_eyre::Result;

use crate::di::FromRef;
use crate::services::AnalysisService;

use super::{print_json, App};

impl App {
    /// Analyze `url` and print the detected technologies as JSON.
    pub async fn run_analyze(&self, url: &str) -> Result<()> {
        let ctx = self.context()?;
        let techs = AnalysisService::from_ref(&ctx).analyze_url(url).await?;
        print_json(&techs)
    }
}
