//! Storage module for to-do attachments
//!
//! The service never handles file bytes itself: it hands clients a
//! presigned upload URL and removes objects when items or attachments
//! are deleted.

use async_trait::async_trait;

use crate::core::error::Result;

mod minio_client;

pub use minio_client::MinIOClient;

/// Object storage that holds one attachment per to-do item
#[async_trait]
pub trait AttachmentStorage: Send + Sync {
    /// Short-lived URL the client uploads the attachment to
    async fn upload_url(&self, item_id: &str) -> Result<String>;

    /// Delete the attachment object; deleting a missing object succeeds
    async fn remove(&self, item_id: &str) -> Result<()>;
}
