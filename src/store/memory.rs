//! In-process catalog backend.

use std::collections::{BTreeSet, HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::CatalogStore;
use crate::error::AppError;
use crate::models::{Stack, Tool, ToolStatus};

#[derive(Debug, Default, Clone)]
struct State {
    tools: Vec<Tool>,
    stacks: Vec<Stack>,
    /// Tool id -> associated stack ids.
    associations: HashMap<String, BTreeSet<String>>,
}

/// Catalog held in memory.
///
/// Association replacement stages the change on a copy of the state and
/// publishes it with a single swap, so readers observe either the old or
/// the new set. [`MemoryStore::fail_replace_for`] injects a failure after
/// the staged delete, emulating a crash mid-replacement.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    failing_replacements: RwLock<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_tool(&self, tool: Tool) {
        self.state.write().await.tools.push(tool);
    }

    pub async fn add_stack(&self, stack: Stack) {
        self.state.write().await.stacks.push(stack);
    }

    /// Associates `tool_id` with the stacks identified by `slugs`.
    pub async fn associate(&self, tool_id: &str, slugs: &[&str]) {
        let mut state = self.state.write().await;
        let ids: Vec<String> = state
            .stacks
            .iter()
            .filter(|s| slugs.contains(&s.slug.as_str()))
            .map(|s| s.id.clone())
            .collect();
        state
            .associations
            .entry(tool_id.to_string())
            .or_default()
            .extend(ids);
    }

    /// Makes replacements for `tool_id` fail part-way through.
    pub async fn fail_replace_for(&self, tool_id: &str) {
        self.failing_replacements
            .write()
            .await
            .insert(tool_id.to_string());
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn find_tools(
        &self,
        statuses: &[ToolStatus],
        limit: u32,
    ) -> Result<Vec<Tool>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .tools
            .iter()
            .filter(|t| statuses.contains(&t.status) && !t.repository_url.is_empty())
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn find_stacks_by_slugs(&self, slugs: &[String]) -> Result<Vec<Stack>, AppError> {
        let state = self.state.read().await;
        let mut stacks: Vec<Stack> = state
            .stacks
            .iter()
            .filter(|s| slugs.contains(&s.slug))
            .cloned()
            .collect();
        stacks.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(stacks)
    }

    async fn replace_tool_stacks(
        &self,
        tool_id: &str,
        stack_ids: &[String],
    ) -> Result<(), AppError> {
        let fail = self.failing_replacements.read().await.contains(tool_id);

        let mut state = self.state.write().await;
        let mut staged = state.associations.clone();
        staged.remove(tool_id);

        if fail {
            return Err(AppError::Store {
                message: format!("replacement for {} aborted", tool_id),
            });
        }

        staged.insert(tool_id.to_string(), stack_ids.iter().cloned().collect());
        state.associations = staged;
        Ok(())
    }

    async fn tool_stack_slugs(&self, tool_id: &str) -> Result<Vec<String>, AppError> {
        let state = self.state.read().await;
        let Some(ids) = state.associations.get(tool_id) else {
            return Ok(Vec::new());
        };
        let mut slugs: Vec<String> = state
            .stacks
            .iter()
            .filter(|s| ids.contains(&s.id))
            .map(|s| s.slug.clone())
            .collect();
        slugs.sort();
        Ok(slugs)
    }
}
