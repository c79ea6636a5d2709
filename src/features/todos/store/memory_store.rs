use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{attachment_url, item_not_found, TodoStore};
use crate::core::error::Result;
use crate::features::todos::models::{TodoChanges, TodoItem};

type ItemKey = (String, String);

/// Process-local table, for running without a database
pub struct MemoryTodoStore {
    items: RwLock<HashMap<ItemKey, TodoItem>>,
    attachment_base_url: String,
}

impl MemoryTodoStore {
    pub fn new(attachment_base_url: String) -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            attachment_base_url,
        }
    }
}

fn key(owner_id: &str, item_id: &str) -> ItemKey {
    (owner_id.to_string(), item_id.to_string())
}

#[async_trait]
impl TodoStore for MemoryTodoStore {
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<TodoItem>> {
        let items = self.items.read().await;
        let mut owned: Vec<TodoItem> = items
            .values()
            .filter(|item| item.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by_key(|item| item.created_at);
        Ok(owned)
    }

    async fn get_one(&self, owner_id: &str, item_id: &str) -> Result<Option<TodoItem>> {
        Ok(self.items.read().await.get(&key(owner_id, item_id)).cloned())
    }

    async fn create(&self, item: TodoItem) -> Result<TodoItem> {
        self.items
            .write()
            .await
            .insert(key(&item.owner_id, &item.item_id), item.clone());
        Ok(item)
    }

    async fn update(&self, owner_id: &str, item_id: &str, changes: TodoChanges) -> Result<()> {
        let mut items = self.items.write().await;
        let item = items
            .get_mut(&key(owner_id, item_id))
            .ok_or_else(|| item_not_found(item_id))?;
        item.apply(changes);
        Ok(())
    }

    async fn delete(&self, owner_id: &str, item_id: &str) -> Result<Option<TodoItem>> {
        Ok(self.items.write().await.remove(&key(owner_id, item_id)))
    }

    async fn set_attachment(&self, owner_id: &str, item_id: &str) -> Result<String> {
        let mut items = self.items.write().await;
        let item = items
            .get_mut(&key(owner_id, item_id))
            .ok_or_else(|| item_not_found(item_id))?;
        let url = attachment_url(&self.attachment_base_url, item_id);
        item.attachment_url = Some(url.clone());
        Ok(url)
    }

    async fn clear_attachment(&self, owner_id: &str, item_id: &str) -> Result<()> {
        let mut items = self.items.write().await;
        let item = items
            .get_mut(&key(owner_id, item_id))
            .ok_or_else(|| item_not_found(item_id))?;
        item.attachment_url = None;
        Ok(())
    }
}
