//! Item store gateway
//!
//! The only code that knows how items are keyed. Every operation touches a
//! single `(owner_id, item_id)` record; nothing is batched, transactional
//! or retried.

use async_trait::async_trait;

use crate::core::error::{AppError, Result};
use crate::features::todos::models::{TodoChanges, TodoItem};

mod memory_store;
mod postgres_store;

pub use memory_store::MemoryTodoStore;
pub use postgres_store::PgTodoStore;

#[async_trait]
pub trait TodoStore: Send + Sync {
    /// All items owned by `owner_id`, in no guaranteed order
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<TodoItem>>;

    /// Point lookup; a miss is `None`, not an error
    async fn get_one(&self, owner_id: &str, item_id: &str) -> Result<Option<TodoItem>>;

    /// Unconditional write; an existing record with the same key is replaced
    async fn create(&self, item: TodoItem) -> Result<TodoItem>;

    /// Rewrite name, done and due date. `NotFound` if the key is absent.
    async fn update(&self, owner_id: &str, item_id: &str, changes: TodoChanges) -> Result<()>;

    /// Remove the record, returning it if it existed. Missing keys are a no-op.
    async fn delete(&self, owner_id: &str, item_id: &str) -> Result<Option<TodoItem>>;

    /// Point `attachment_url` at the item's attachment location and return it.
    /// `NotFound` if the key is absent.
    async fn set_attachment(&self, owner_id: &str, item_id: &str) -> Result<String>;

    /// Drop `attachment_url` from the record. `NotFound` if the key is absent.
    async fn clear_attachment(&self, owner_id: &str, item_id: &str) -> Result<()>;
}

/// Attachment reference for an item: a fixed storage location plus the item id
pub fn attachment_url(base_url: &str, item_id: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), item_id)
}

fn item_not_found(item_id: &str) -> AppError {
    AppError::NotFound(format!("Todo item {} not found", item_id))
}
