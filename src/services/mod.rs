//! Pipeline services.
//!
//! Services orchestrate the workspace, fetch, extraction and catalog
//! components, and are resolved from the [`Context`](crate::context::Context)
//! via [`FromRef`](crate::di::FromRef).

mod analysis;
mod batch;
mod reconcile;

pub use analysis::AnalysisService;
pub use batch::BatchService;
pub use reconcile::ReconcileService;
