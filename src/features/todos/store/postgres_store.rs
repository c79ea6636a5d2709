use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::{attachment_url, item_not_found, TodoStore};
use crate::core::error::Result;
use crate::features::todos::models::{TodoChanges, TodoItem};

const TODO_COLUMNS: &str =
    "owner_id, item_id, name, done, created_at, due_date, attachment_url";

/// `todos` table keyed by `(owner_id, item_id)`
pub struct PgTodoStore {
    pool: PgPool,
    attachment_base_url: String,
}

impl PgTodoStore {
    pub fn new(pool: PgPool, attachment_base_url: String) -> Self {
        Self {
            pool,
            attachment_base_url,
        }
    }
}

#[async_trait]
impl TodoStore for PgTodoStore {
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<TodoItem>> {
        let query = format!(
            "SELECT {} FROM todos WHERE owner_id = $1 ORDER BY created_at",
            TODO_COLUMNS
        );
        let items = sqlx::query_as::<_, TodoItem>(&query)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    async fn get_one(&self, owner_id: &str, item_id: &str) -> Result<Option<TodoItem>> {
        let query = format!(
            "SELECT {} FROM todos WHERE owner_id = $1 AND item_id = $2",
            TODO_COLUMNS
        );
        let item = sqlx::query_as::<_, TodoItem>(&query)
            .bind(owner_id)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    async fn create(&self, item: TodoItem) -> Result<TodoItem> {
        sqlx::query(
            r#"
            INSERT INTO todos (owner_id, item_id, name, done, created_at, due_date, attachment_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (owner_id, item_id) DO UPDATE
            SET name = EXCLUDED.name,
                done = EXCLUDED.done,
                created_at = EXCLUDED.created_at,
                due_date = EXCLUDED.due_date,
                attachment_url = EXCLUDED.attachment_url
            "#,
        )
        .bind(&item.owner_id)
        .bind(&item.item_id)
        .bind(&item.name)
        .bind(item.done)
        .bind(item.created_at)
        .bind(&item.due_date)
        .bind(&item.attachment_url)
        .execute(&self.pool)
        .await?;

        debug!("Stored todo {} for owner {}", item.item_id, item.owner_id);
        Ok(item)
    }

    async fn update(&self, owner_id: &str, item_id: &str, changes: TodoChanges) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE todos
            SET name = $3, done = $4, due_date = $5
            WHERE owner_id = $1 AND item_id = $2
            "#,
        )
        .bind(owner_id)
        .bind(item_id)
        .bind(&changes.name)
        .bind(changes.done)
        .bind(&changes.due_date)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(item_not_found(item_id));
        }
        Ok(())
    }

    async fn delete(&self, owner_id: &str, item_id: &str) -> Result<Option<TodoItem>> {
        let query = format!(
            "DELETE FROM todos WHERE owner_id = $1 AND item_id = $2 RETURNING {}",
            TODO_COLUMNS
        );
        let removed = sqlx::query_as::<_, TodoItem>(&query)
            .bind(owner_id)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(removed)
    }

    async fn set_attachment(&self, owner_id: &str, item_id: &str) -> Result<String> {
        let url = attachment_url(&self.attachment_base_url, item_id);

        let result = sqlx::query(
            "UPDATE todos SET attachment_url = $3 WHERE owner_id = $1 AND item_id = $2",
        )
        .bind(owner_id)
        .bind(item_id)
        .bind(&url)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(item_not_found(item_id));
        }
        Ok(url)
    }

    async fn clear_attachment(&self, owner_id: &str, item_id: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE todos SET attachment_url = NULL WHERE owner_id = $1 AND item_id = $2",
        )
        .bind(owner_id)
        .bind(item_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(item_not_found(item_id));
        }
        Ok(())
    }
}
