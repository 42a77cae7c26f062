//! Batch run reporting.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of one batch run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// Number of tools selected for the run.
    pub total: usize,
    /// Number of tools that went through the pipeline, successfully or not.
    pub processed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One record per selected tool, in selection order.
    pub results: Vec<BatchItem>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results
            .iter()
            .filter(|item| matches!(item.outcome, BatchOutcome::Success { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn item(&self, tool_id: &str) -> Option<&BatchItem> {
        self.results.iter().find(|item| item.tool_id == tool_id)
    }
}

/// Per-tool record in a [`BatchReport`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub tool_id: String,
    pub name: String,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum BatchOutcome {
    #[serde(rename_all = "camelCase")]
    Success {
        matched_slugs: Vec<String>,
        extracted_techs: Vec<String>,
    },
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_serialization_shape() {
        let success = BatchItem {
            tool_id: "t1".into(),
            name: "Plausible".into(),
            outcome: BatchOutcome::Success {
                matched_slugs: vec!["elixir".into()],
                extracted_techs: vec!["elixir".into(), "postgresql".into()],
            },
        };
        assert_eq!(
            serde_json::to_value(&success).unwrap(),
            json!({
                "toolId": "t1",
                "name": "Plausible",
                "status": "success",
                "matchedSlugs": ["elixir"],
                "extractedTechs": ["elixir", "postgresql"],
            })
        );

        let failure = BatchItem {
            tool_id: "t2".into(),
            name: "Broken".into(),
            outcome: BatchOutcome::Error {
                message: "Error cloning acme/broken".into(),
            },
        };
        assert_eq!(
            serde_json::to_value(&failure).unwrap(),
            json!({
                "toolId": "t2",
                "name": "Broken",
                "status": "error",
                "message": "Error cloning acme/broken",
            })
        );
    }
}
