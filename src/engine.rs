//! Boundary to the external technology detection engine.
//!
//! The engine is a black box mapping a directory to a nested
//! [`TechnologyReport`]. [`CommandEngine`] drives an external detector
//! process; tests substitute their own [`DetectionEngine`].

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;

use crate::config::EngineConfig;
use crate::error::AppError;
use crate::models::TechnologyReport;

const ROOT_PLACEHOLDER: &str = "{root}";
const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Scans a file tree and reports the technologies it uses.
#[async_trait]
pub trait DetectionEngine: Send + Sync {
    async fn analyze(&self, root: &Path) -> Result<TechnologyReport, AppError>;
}

/// Runs an external detector and decodes its JSON report.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }

    fn writes_output_file(&self) -> bool {
        self.args.iter().any(|a| a.contains(OUTPUT_PLACEHOLDER))
    }

    fn render_args(&self, root: &Path, output: Option<&Path>) -> Vec<String> {
        let root = root.to_string_lossy();
        let output = output.map(|p| p.to_string_lossy().into_owned()).unwrap_or_default();
        self.args
            .iter()
            .map(|a| {
                a.replace(ROOT_PLACEHOLDER, &root)
                    .replace(OUTPUT_PLACEHOLDER, &output)
            })
            .collect()
    }
}

fn analysis_error(cause: impl Into<String>) -> AppError {
    AppError::Analysis {
        cause: cause.into(),
    }
}

#[async_trait]
impl DetectionEngine for CommandEngine {
    async fn analyze(&self, root: &Path) -> Result<TechnologyReport, AppError> {
        // Kept alive until the report has been read back.
        let output_dir = if self.writes_output_file() {
            Some(tempfile::tempdir().map_err(|e| analysis_error(e.to_string()))?)
        } else {
            None
        };
        let output_file = output_dir.as_ref().map(|d| d.path().join("report.json"));

        let args = self.render_args(root, output_file.as_deref());
        tracing::debug!(program = %self.program, ?args, "Running detection engine");

        let output = tokio::process::Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| analysis_error(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(analysis_error(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let raw = match &output_file {
            Some(path) => tokio::fs::read(path)
                .await
                .map_err(|e| analysis_error(format!("failed to read report: {}", e)))?,
            None => output.stdout,
        };

        serde_json::from_slice(&raw)
            .map_err(|e| analysis_error(format!("invalid report: {}", e)))
    }
}
