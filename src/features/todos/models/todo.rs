use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// One to-do record, keyed by `(owner_id, item_id)`
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TodoItem {
    pub owner_id: String,
    pub item_id: String,
    pub name: String,
    pub done: bool,
    pub created_at: DateTime<Utc>,
    pub due_date: String,
    pub attachment_url: Option<String>,
}

/// The mutable fields rewritten by an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoChanges {
    pub name: String,
    pub done: bool,
    pub due_date: String,
}

impl TodoItem {
    pub fn apply(&mut self, changes: TodoChanges) {
        self.name = changes.name;
        self.done = changes.done;
        self.due_date = changes.due_date;
    }
}
