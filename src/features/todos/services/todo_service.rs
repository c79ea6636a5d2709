use chrono::{SubsecRound, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::todos::dtos::{CreateTodoDto, UpdateTodoDto};
use crate::features::todos::models::TodoItem;
use crate::features::todos::store::TodoStore;

/// Domain operations on to-do items.
///
/// Assigns identity and creation time to new items; every other operation
/// forwards to the store unchanged.
pub struct TodoService {
    store: Arc<dyn TodoStore>,
}

impl TodoService {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }

    pub async fn create_todo(&self, dto: CreateTodoDto, owner_id: &str) -> Result<TodoItem> {
        let item = TodoItem {
            owner_id: owner_id.to_string(),
            item_id: Uuid::new_v4().to_string(),
            name: dto.name,
            done: false,
            // Millisecond precision survives every backing store unchanged
            created_at: Utc::now().trunc_subsecs(3),
            due_date: dto.due_date,
            attachment_url: None,
        };

        let item = self.store.create(item).await?;
        info!("Created todo {} for owner {}", item.item_id, owner_id);
        Ok(item)
    }

    pub async fn list_todos(&self, owner_id: &str) -> Result<Vec<TodoItem>> {
        self.store.list_by_owner(owner_id).await
    }

    pub async fn get_todo(&self, owner_id: &str, item_id: &str) -> Result<Option<TodoItem>> {
        self.store.get_one(owner_id, item_id).await
    }

    pub async fn update_todo(
        &self,
        owner_id: &str,
        item_id: &str,
        dto: UpdateTodoDto,
    ) -> Result<()> {
        self.store.update(owner_id, item_id, dto.into()).await
    }

    pub async fn delete_todo(&self, owner_id: &str, item_id: &str) -> Result<Option<TodoItem>> {
        self.store.delete(owner_id, item_id).await
    }

    pub async fn set_attachment(&self, owner_id: &str, item_id: &str) -> Result<String> {
        self.store.set_attachment(owner_id, item_id).await
    }

    pub async fn clear_attachment(&self, owner_id: &str, item_id: &str) -> Result<()> {
        self.store.clear_attachment(owner_id, item_id).await
    }
}
