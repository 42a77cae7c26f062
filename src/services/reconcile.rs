//! Catalog reconciliation of detected technologies.

use std::sync::Arc;

use crate::config::Config;
use crate::context::{AppStore, Context};
use crate::di::FromRef;
use crate::error::AppError;
use crate::models::{Stack, TechnologySet};

/// Maps detected technologies onto catalog stacks and stores the result as
/// a tool's associations.
#[derive(Clone)]
pub struct ReconcileService {
    store: AppStore,
    ignored: Arc<[String]>,
}

impl FromRef<Context> for ReconcileService {
    fn from_ref(ctx: &Context) -> Self {
        let config = Arc::<Config>::from_ref(ctx);
        Self::new(AppStore::from_ref(ctx), config.engine.ignored.clone())
    }
}

impl ReconcileService {
    /// `ignored` lists identifiers that are never matched against the catalog.
    pub fn new(store: AppStore, ignored: Vec<String>) -> Self {
        Self {
            store,
            ignored: ignored.into(),
        }
    }

    /// Replaces the associations of `tool_id` with the catalog stacks
    /// matching `techs`, returning the matched stacks.
    ///
    /// When nothing matches, the existing associations are left untouched.
    pub async fn reconcile(
        &self,
        tool_id: &str,
        techs: &TechnologySet,
    ) -> Result<Vec<Stack>, AppError> {
        let candidates = techs.without(self.ignored.iter().map(String::as_str));
        if candidates.is_empty() {
            tracing::debug!(tool_id, "No technologies to reconcile");
            return Ok(Vec::new());
        }

        let stacks = self
            .store
            .find_stacks_by_slugs(&candidates.to_vec())
            .await?;

        if stacks.is_empty() {
            tracing::info!(tool_id, "No catalog stacks matched, keeping existing associations");
            return Ok(stacks);
        }

        let stack_ids: Vec<String> = stacks.iter().map(|s| s.id.clone()).collect();
        self.store.replace_tool_stacks(tool_id, &stack_ids).await?;

        tracing::info!(tool_id, matched = stacks.len(), "Updated tool stacks");
        Ok(stacks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Stack;
    use crate::store::{CatalogStore, MemoryStore};

    async fn store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for (id, slug) in [
            ("s1", "react"),
            ("s2", "postgresql"),
            ("s3", "mongodb"),
            ("s4", "github"),
        ] {
            store.add_stack(Stack::new(id, slug)).await;
        }
        store
    }

    fn techs(items: &[&str]) -> TechnologySet {
        items.iter().copied().collect()
    }

    #[tokio::test]
    async fn test_reconcile_replaces_stale_associations() {
        let store = store().await;
        store.associate("t1", &["mongodb"]).await;
        let service = ReconcileService::new(store.clone(), vec!["github".into()]);

        let matched = service
            .reconcile("t1", &techs(&["react", "postgresql", "nodejs"]))
            .await
            .unwrap();

        let slugs: Vec<_> = matched.iter().map(|s| s.slug.as_str()).collect();
        assert_eq!(slugs, vec!["postgresql", "react"]);
        assert_eq!(
            store.tool_stack_slugs("t1").await.unwrap(),
            vec!["postgresql", "react"]
        );
    }

    #[tokio::test]
    async fn test_reconcile_excludes_ignored_identifiers() {
        let store = store().await;
        let service = ReconcileService::new(store.clone(), vec!["github".into()]);

        let matched = service
            .reconcile("t1", &techs(&["github", "react"]))
            .await
            .unwrap();

        assert_eq!(matched, vec![Stack::new("s1", "react")]);
        assert_eq!(store.tool_stack_slugs("t1").await.unwrap(), vec!["react"]);
    }

    #[tokio::test]
    async fn test_reconcile_without_matches_keeps_associations() {
        let store = store().await;
        store.associate("t1", &["mongodb"]).await;
        let service = ReconcileService::new(store.clone(), vec!["github".into()]);

        let matched = service
            .reconcile("t1", &techs(&["github", "cobol"]))
            .await
            .unwrap();

        assert!(matched.is_empty());
        assert_eq!(store.tool_stack_slugs("t1").await.unwrap(), vec!["mongodb"]);
    }

    #[tokio::test]
    async fn test_reconcile_failure_keeps_old_associations() {
        let store = store().await;
        store.associate("t1", &["mongodb"]).await;
        store.fail_replace_for("t1").await;
        let service = ReconcileService::new(store.clone(), vec![]);

        let err = service.reconcile("t1", &techs(&["react"])).await.unwrap_err();

        assert!(matches!(err, AppError::Store { .. }));
        assert_eq!(store.tool_stack_slugs("t1").await.unwrap(), vec!["mongodb"]);
    }

    #[tokio::test]
    async fn test_concurrent_reconciliations_do_not_interfere() {
        let store = store().await;
        store.associate("a", &["mongodb"]).await;
        store.associate("b", &["mongodb"]).await;
        let service = ReconcileService::new(store.clone(), vec![]);

        let a_techs = techs(&["react"]);
        let b_techs = techs(&["postgresql"]);
        let (a, b) = tokio::join!(
            service.reconcile("a", &a_techs),
            service.reconcile("b", &b_techs)
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(store.tool_stack_slugs("a").await.unwrap(), vec!["react"]);
        assert_eq!(store.tool_stack_slugs("b").await.unwrap(), vec!["postgresql"]);
    }
}
