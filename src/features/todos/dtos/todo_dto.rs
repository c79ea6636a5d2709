use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::todos::models::{TodoChanges, TodoItem};

/// Request DTO for creating a to-do item
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoDto {
    #[validate(length(min = 1, message = "name is required"))]
    #[schema(example = "Buy milk")]
    pub name: String,
    #[validate(length(min = 1, message = "dueDate is required"))]
    #[schema(example = "2024-01-08")]
    pub due_date: String,
}

/// Request DTO for updating a to-do item; all three fields are rewritten
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoDto {
    #[validate(length(min = 1, message = "name is required"))]
    #[schema(example = "Buy milk")]
    pub name: String,
    pub done: bool,
    #[validate(length(min = 1, message = "dueDate is required"))]
    #[schema(example = "2024-01-08")]
    pub due_date: String,
}

impl From<UpdateTodoDto> for TodoChanges {
    fn from(dto: UpdateTodoDto) -> Self {
        Self {
            name: dto.name,
            done: dto.done,
            due_date: dto.due_date,
        }
    }
}

/// A to-do item as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodoItemDto {
    pub item_id: String,
    pub owner_id: String,
    pub name: String,
    pub done: bool,
    /// ISO-8601 with millisecond precision, e.g. `2024-01-08T10:00:00.000Z`
    pub created_at: String,
    pub due_date: String,
    /// Present only once an attachment upload URL has been issued
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub attachment_url: Option<String>,
}

/// ISO-8601 timestamp with millisecond precision and `Z` suffix
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl From<TodoItem> for TodoItemDto {
    fn from(item: TodoItem) -> Self {
        Self {
            created_at: format_timestamp(&item.created_at),
            item_id: item.item_id,
            owner_id: item.owner_id,
            name: item.name,
            done: item.done,
            due_date: item.due_date,
            attachment_url: item.attachment_url,
        }
    }
}

/// `{ "item": ... }`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TodoResponseDto {
    pub item: TodoItemDto,
}

/// `{ "items": [...] }`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TodoListResponseDto {
    pub items: Vec<TodoItemDto>,
}

/// `{ "uploadUrl": ... }`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponseDto {
    /// Presigned URL the client PUTs the file to
    pub upload_url: String,
}
