use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;

use crate::core::error::{AppError, Result};
use crate::core::middleware::auth_middleware;
use crate::features::auth::{AuthenticatedUser, TokenVerifier};
use crate::features::todos::models::{TodoChanges, TodoItem};
use crate::features::todos::store::{MemoryTodoStore, TodoStore};
use crate::features::todos::{routes, TodoService, TodoState};
use crate::modules::storage::AttachmentStorage;

pub const TEST_ATTACHMENT_BASE_URL: &str = "http://localhost:9000/todo-attachments/attachments";

/// Accepts a fixed set of tokens, each mapped to a subject
pub struct StaticTokenVerifier {
    tokens: HashMap<String, String>,
}

impl StaticTokenVerifier {
    pub fn new<'a>(tokens: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            tokens: tokens
                .into_iter()
                .map(|(token, sub)| (token.to_string(), sub.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> std::result::Result<AuthenticatedUser, AppError> {
        self.tokens
            .get(token)
            .map(AuthenticatedUser::new)
            .ok_or_else(|| AppError::Unauthorized("Unknown token".to_string()))
    }
}

/// In-process object storage double that records removals
#[derive(Default)]
pub struct FakeAttachmentStorage {
    removed: Mutex<Vec<String>>,
    fail_remove: bool,
    fail_upload: bool,
}

impl FakeAttachmentStorage {
    /// Storage whose removals always fail
    pub fn failing() -> Self {
        Self {
            fail_remove: true,
            ..Self::default()
        }
    }

    /// Storage that cannot issue upload URLs
    pub fn unable_to_presign() -> Self {
        Self {
            fail_upload: true,
            ..Self::default()
        }
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl AttachmentStorage for FakeAttachmentStorage {
    async fn upload_url(&self, item_id: &str) -> Result<String> {
        if self.fail_upload {
            return Err(AppError::ExternalService(
                "presign failed: SignatureDoesNotMatch".to_string(),
            ));
        }
        Ok(format!(
            "http://localhost:9000/todo-attachments/attachments/{}?X-Amz-Signature=test",
            item_id
        ))
    }

    async fn remove(&self, item_id: &str) -> Result<()> {
        self.removed.lock().unwrap().push(item_id.to_string());
        if self.fail_remove {
            return Err(AppError::ExternalService(
                "object storage unreachable".to_string(),
            ));
        }
        Ok(())
    }
}

/// Store whose backend is gone: listing times out on the pool, everything else
/// fails with a driver error
pub struct BrokenTodoStore;

/// Driver detail carried by `BrokenTodoStore` errors; must never reach a response
pub const BROKEN_STORE_DETAIL: &str = "connection reset by peer at 10.0.0.7:5432";

impl BrokenTodoStore {
    fn driver_error() -> AppError {
        AppError::from(sqlx::Error::Protocol(BROKEN_STORE_DETAIL.to_string()))
    }
}

#[async_trait]
impl TodoStore for BrokenTodoStore {
    async fn list_by_owner(&self, _owner_id: &str) -> Result<Vec<TodoItem>> {
        Err(AppError::from(sqlx::Error::PoolTimedOut))
    }

    async fn get_one(&self, _owner_id: &str, _item_id: &str) -> Result<Option<TodoItem>> {
        Err(Self::driver_error())
    }

    async fn create(&self, _item: TodoItem) -> Result<TodoItem> {
        Err(Self::driver_error())
    }

    async fn update(&self, _owner_id: &str, _item_id: &str, _changes: TodoChanges) -> Result<()> {
        Err(Self::driver_error())
    }

    async fn delete(&self, _owner_id: &str, _item_id: &str) -> Result<Option<TodoItem>> {
        Err(Self::driver_error())
    }

    async fn set_attachment(&self, _owner_id: &str, _item_id: &str) -> Result<String> {
        Err(Self::driver_error())
    }

    async fn clear_attachment(&self, _owner_id: &str, _item_id: &str) -> Result<()> {
        Err(Self::driver_error())
    }
}

/// In-memory store wired with the test attachment location
pub fn memory_store() -> Arc<dyn TodoStore> {
    Arc::new(MemoryTodoStore::new(TEST_ATTACHMENT_BASE_URL.to_string()))
}

/// To-do routes behind bearer auth. Tokens `token-u1` and `token-u2`
/// authenticate as `u1` and `u2`.
pub fn todo_app(store: Arc<dyn TodoStore>, storage: Arc<FakeAttachmentStorage>) -> Router {
    let verifier: Arc<dyn TokenVerifier> = Arc::new(StaticTokenVerifier::new([
        ("token-u1", "u1"),
        ("token-u2", "u2"),
    ]));

    let state = TodoState {
        todo_service: Arc::new(TodoService::new(store)),
        attachment_storage: storage,
    };

    routes(state).route_layer(axum::middleware::from_fn_with_state(
        verifier,
        auth_middleware,
    ))
}
