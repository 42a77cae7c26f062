//! Domain models for repository analysis.

mod reference;
mod report;
mod technology;
mod tool;

pub use reference::RepositoryReference;
pub use report::{BatchItem, BatchOutcome, BatchReport};
pub use technology::{TechnologyReport, TechnologySet};
pub use tool::{Stack, Tool, ToolStatus};
