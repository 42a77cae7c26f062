//! PostgreSQL catalog backend.
//!
//! Works against the directory's existing schema: `"Tool"`, `"Stack"` and
//! the implicit many-to-many table `"_StackToTool"` whose column `"A"`
//! references the stack and `"B"` the tool.
//!
//! # Example
//!
//! ```ignore
//! use stackscan::store::{CatalogStore, PostgresStore};
//!
//! let store = PostgresStore::connect("postgresql://localhost/catalog")?;
//! let stacks = store.find_stacks_by_slugs(&["react".into()]).await?;
//! ```

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

use super::CatalogStore;
use crate::error::AppError;
use crate::models::{Stack, Tool, ToolStatus};

const FIND_TOOLS: &str = r#"
    SELECT id, name, "repositoryUrl", status::text AS status
    FROM "Tool"
    WHERE status::text = ANY($1) AND "repositoryUrl" IS NOT NULL
    ORDER BY id
    LIMIT $2
"#;

const FIND_STACKS: &str = r#"SELECT id, slug FROM "Stack" WHERE slug = ANY($1) ORDER BY slug"#;

const DELETE_ASSOCIATIONS: &str = r#"DELETE FROM "_StackToTool" WHERE "B" = $1"#;

const INSERT_ASSOCIATIONS: &str = r#"
    INSERT INTO "_StackToTool" ("A", "B")
    SELECT stack_id, $2 FROM unnest($1::text[]) AS stack_id
"#;

const TOOL_STACK_SLUGS: &str = r#"
    SELECT s.slug
    FROM "Stack" s
    JOIN "_StackToTool" j ON j."A" = s.id
    WHERE j."B" = $1
    ORDER BY s.slug
"#;

/// Catalog store backed by a pooled PostgreSQL connection.
///
/// This type is cheap to clone - the underlying connection pool is `Arc`-based.
#[derive(Clone)]
pub struct PostgresStore {
    pool: Pool,
}

impl PostgresStore {
    /// Creates a connection pool for `connection_string`.
    ///
    /// Connections are opened lazily, so this only fails on a malformed
    /// connection string.
    pub fn connect(connection_string: &str) -> Result<Self, AppError> {
        let pg_config: tokio_postgres::Config =
            connection_string.parse().map_err(|e| AppError::Store {
                message: format!("Invalid PostgreSQL connection string: {}", e),
            })?;

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(pg_config, NoTls, mgr_config);
        let pool = Pool::builder(mgr)
            .max_size(16)
            .build()
            .map_err(|e| AppError::Store {
                message: format!("Failed to create connection pool: {}", e),
            })?;

        Ok(Self { pool })
    }

    async fn get_connection(&self) -> Result<Object, AppError> {
        self.pool.get().await.map_err(|e| AppError::Store {
            message: format!("Failed to get connection from pool: {}", e),
        })
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn find_tools(
        &self,
        statuses: &[ToolStatus],
        limit: u32,
    ) -> Result<Vec<Tool>, AppError> {
        let conn = self.get_connection().await?;
        let statuses: Vec<&str> = statuses.iter().map(ToolStatus::as_db_str).collect();
        let rows = conn
            .query(FIND_TOOLS, &[&statuses, &i64::from(limit)])
            .await?;

        rows.iter()
            .map(|row| -> Result<Tool, AppError> {
                let status: String = row.try_get("status")?;
                Ok(Tool {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    repository_url: row.try_get("repositoryUrl")?,
                    status: ToolStatus::from_db_str(&status).ok_or_else(|| AppError::Store {
                        message: format!("Unknown tool status: {}", status),
                    })?,
                })
            })
            .collect()
    }

    async fn find_stacks_by_slugs(&self, slugs: &[String]) -> Result<Vec<Stack>, AppError> {
        if slugs.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.get_connection().await?;
        let rows = conn.query(FIND_STACKS, &[&slugs]).await?;

        rows.iter()
            .map(|row| -> Result<Stack, AppError> {
                Ok(Stack {
                    id: row.try_get("id")?,
                    slug: row.try_get("slug")?,
                })
            })
            .collect()
    }

    async fn replace_tool_stacks(
        &self,
        tool_id: &str,
        stack_ids: &[String],
    ) -> Result<(), AppError> {
        let mut conn = self.get_connection().await?;
        // Dropping the transaction before commit rolls it back.
        let txn = conn.transaction().await?;

        let removed = txn.execute(DELETE_ASSOCIATIONS, &[&tool_id]).await?;
        let inserted = txn
            .execute(INSERT_ASSOCIATIONS, &[&stack_ids, &tool_id])
            .await?;
        txn.commit().await?;

        tracing::debug!(tool_id, removed, inserted, "Replaced tool stacks");
        Ok(())
    }

    async fn tool_stack_slugs(&self, tool_id: &str) -> Result<Vec<String>, AppError> {
        let conn = self.get_connection().await?;
        let rows = conn.query(TOOL_STACK_SLUGS, &[&tool_id]).await?;
        rows.iter()
            .map(|row| row.try_get::<_, String>("slug").map_err(AppError::from))
            .collect()
    }
}
