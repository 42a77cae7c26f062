//! Catalog store contract.
//!
//! The pipeline reads tools and catalog stacks from the store and writes
//! exactly one thing back: a tool's set of stack associations, replaced
//! atomically through [`CatalogStore::replace_tool_stacks`].
//!
//! Backends:
//! - [`PostgresStore`]: the catalog database (deadpool-postgres)
//! - [`MemoryStore`]: in-process store for tests and dry runs

mod memory;
mod postgres;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{Stack, Tool, ToolStatus};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Read/write access to the tool catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Tools in one of `statuses` that have a repository URL, at most `limit`.
    async fn find_tools(&self, statuses: &[ToolStatus], limit: u32)
        -> Result<Vec<Tool>, AppError>;

    /// Catalog stacks whose slug is exactly one of `slugs`.
    async fn find_stacks_by_slugs(&self, slugs: &[String]) -> Result<Vec<Stack>, AppError>;

    /// Replaces every association of `tool_id` with `stack_ids`.
    ///
    /// Either the whole replacement becomes visible or none of it does.
    async fn replace_tool_stacks(&self, tool_id: &str, stack_ids: &[String])
        -> Result<(), AppError>;

    /// Slugs currently associated with `tool_id`, sorted.
    async fn tool_stack_slugs(&self, tool_id: &str) -> Result<Vec<String>, AppError>;
}
