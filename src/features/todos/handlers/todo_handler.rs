use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::warn;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::AuthenticatedUser;
use crate::features::todos::dtos::{
    CreateTodoDto, TodoItemDto, TodoListResponseDto, TodoResponseDto, UpdateTodoDto,
    UploadUrlResponseDto,
};
use crate::features::todos::services::TodoService;
use crate::modules::storage::AttachmentStorage;
use crate::shared::types::{EmptyResponse, ErrorResponse};

/// State for to-do handlers
#[derive(Clone)]
pub struct TodoState {
    pub todo_service: Arc<TodoService>,
    pub attachment_storage: Arc<dyn AttachmentStorage>,
}

impl TodoState {
    /// Best-effort object removal; the record change has already happened
    async fn remove_attachment_object(&self, item_id: &str) {
        if let Err(e) = self.attachment_storage.remove(item_id).await {
            warn!("Failed to remove attachment for todo {}: {}", item_id, e);
        }
    }
}

/// List the caller's to-do items
#[utoipa::path(
    get,
    path = "/todos",
    tag = "todos",
    responses(
        (status = 200, description = "Caller's to-do items", body = TodoListResponseDto),
        (status = 401, description = "Authentication required", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_todos(
    user: AuthenticatedUser,
    State(state): State<TodoState>,
) -> Result<Json<TodoListResponseDto>> {
    let items = state.todo_service.list_todos(user.owner_id()).await?;

    Ok(Json(TodoListResponseDto {
        items: items.into_iter().map(TodoItemDto::from).collect(),
    }))
}

/// Get one to-do item
#[utoipa::path(
    get,
    path = "/todos/{item_id}",
    tag = "todos",
    params(
        ("item_id" = String, Path, description = "To-do item ID")
    ),
    responses(
        (status = 200, description = "To-do item", body = TodoResponseDto),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 404, description = "To-do item not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_todo(
    user: AuthenticatedUser,
    Path(item_id): Path<String>,
    State(state): State<TodoState>,
) -> Result<Json<TodoResponseDto>> {
    let item = state
        .todo_service
        .get_todo(user.owner_id(), &item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Todo item {} not found", item_id)))?;

    Ok(Json(TodoResponseDto { item: item.into() }))
}

/// Create a to-do item
#[utoipa::path(
    post,
    path = "/todos",
    tag = "todos",
    request_body = CreateTodoDto,
    responses(
        (status = 201, description = "To-do item created", body = TodoResponseDto),
        (status = 400, description = "Malformed or invalid body", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_todo(
    user: AuthenticatedUser,
    State(state): State<TodoState>,
    AppJson(dto): AppJson<CreateTodoDto>,
) -> Result<(StatusCode, Json<TodoResponseDto>)> {
    dto.validate()?;

    let item = state.todo_service.create_todo(dto, user.owner_id()).await?;

    Ok((
        StatusCode::CREATED,
        Json(TodoResponseDto { item: item.into() }),
    ))
}

/// Update name, completion flag and due date of a to-do item
#[utoipa::path(
    patch,
    path = "/todos/{item_id}",
    tag = "todos",
    params(
        ("item_id" = String, Path, description = "To-do item ID")
    ),
    request_body = UpdateTodoDto,
    responses(
        (status = 200, description = "To-do item updated", body = EmptyResponse),
        (status = 400, description = "Malformed or invalid body", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 404, description = "To-do item not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_todo(
    user: AuthenticatedUser,
    Path(item_id): Path<String>,
    State(state): State<TodoState>,
    AppJson(dto): AppJson<UpdateTodoDto>,
) -> Result<Json<EmptyResponse>> {
    dto.validate()?;

    state
        .todo_service
        .update_todo(user.owner_id(), &item_id, dto)
        .await?;

    Ok(Json(EmptyResponse::default()))
}

/// Delete a to-do item and its attachment.
///
/// Deleting an item that does not exist succeeds.
#[utoipa::path(
    delete,
    path = "/todos/{item_id}",
    tag = "todos",
    params(
        ("item_id" = String, Path, description = "To-do item ID")
    ),
    responses(
        (status = 200, description = "To-do item deleted", body = EmptyResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_todo(
    user: AuthenticatedUser,
    Path(item_id): Path<String>,
    State(state): State<TodoState>,
) -> Result<Json<EmptyResponse>> {
    let removed = state
        .todo_service
        .delete_todo(user.owner_id(), &item_id)
        .await?;

    if removed.is_some_and(|item| item.attachment_url.is_some()) {
        state.remove_attachment_object(&item_id).await;
    }

    Ok(Json(EmptyResponse::default()))
}

/// Issue an upload URL for the item's attachment and record its location
#[utoipa::path(
    post,
    path = "/todos/{item_id}/attachment",
    tag = "todos",
    params(
        ("item_id" = String, Path, description = "To-do item ID")
    ),
    responses(
        (status = 201, description = "Upload URL issued", body = UploadUrlResponseDto),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 404, description = "To-do item not found", body = ErrorResponse),
        (status = 502, description = "Object storage unavailable", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_attachment(
    user: AuthenticatedUser,
    Path(item_id): Path<String>,
    State(state): State<TodoState>,
) -> Result<(StatusCode, Json<UploadUrlResponseDto>)> {
    // Presign first so a storage failure leaves the record untouched
    let upload_url = state.attachment_storage.upload_url(&item_id).await?;

    state
        .todo_service
        .set_attachment(user.owner_id(), &item_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadUrlResponseDto { upload_url }),
    ))
}

/// Detach the item's attachment and delete the stored file
#[utoipa::path(
    delete,
    path = "/todos/{item_id}/attachment",
    tag = "todos",
    params(
        ("item_id" = String, Path, description = "To-do item ID")
    ),
    responses(
        (status = 200, description = "Attachment removed", body = EmptyResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 404, description = "To-do item not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn remove_attachment(
    user: AuthenticatedUser,
    Path(item_id): Path<String>,
    State(state): State<TodoState>,
) -> Result<Json<EmptyResponse>> {
    state
        .todo_service
        .clear_attachment(user.owner_id(), &item_id)
        .await?;

    state.remove_attachment_object(&item_id).await;

    Ok(Json(EmptyResponse::default()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use axum_test::TestServer;
    use fake::{faker::lorem::en::Sentence, Fake};
    use serde_json::{json, Value};

    use crate::features::todos::store::TodoStore;
    use crate::shared::test_helpers::{
        memory_store, todo_app, BrokenTodoStore, FakeAttachmentStorage, BROKEN_STORE_DETAIL,
        TEST_ATTACHMENT_BASE_URL,
    };

    struct Harness {
        server: TestServer,
        store: Arc<dyn TodoStore>,
        storage: Arc<FakeAttachmentStorage>,
    }

    fn harness_with(storage: FakeAttachmentStorage) -> Harness {
        let store = memory_store();
        let storage = Arc::new(storage);
        let server = TestServer::new(todo_app(Arc::clone(&store), Arc::clone(&storage))).unwrap();
        Harness {
            server,
            store,
            storage,
        }
    }

    fn harness() -> Harness {
        harness_with(FakeAttachmentStorage::default())
    }

    async fn create(server: &TestServer, token: &str, name: &str) -> Value {
        let response = server
            .post("/todos")
            .authorization_bearer(token)
            .json(&json!({ "name": name, "dueDate": "2024-01-08" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()["item"].clone()
    }

    #[tokio::test]
    async fn test_buy_milk_lifecycle() {
        let h = harness();

        let item = create(&h.server, "token-u1", "Buy milk").await;
        let item_id = item["itemId"].as_str().unwrap().to_string();
        assert_eq!(item["name"], "Buy milk");
        assert_eq!(item["dueDate"], "2024-01-08");
        assert_eq!(item["done"], false);
        assert_eq!(item["ownerId"], "u1");
        assert!(item.get("attachmentUrl").is_none());
        assert!(item["createdAt"].as_str().unwrap().ends_with('Z'));

        let list = h.server.get("/todos").authorization_bearer("token-u1").await;
        list.assert_status_ok();
        list.assert_json(&json!({ "items": [item.clone()] }));

        let patched = h
            .server
            .patch(&format!("/todos/{}", item_id))
            .authorization_bearer("token-u1")
            .json(&json!({ "name": "Buy milk", "done": true, "dueDate": "2024-01-09" }))
            .await;
        patched.assert_status_ok();
        patched.assert_json(&json!({}));

        let fetched = h
            .server
            .get(&format!("/todos/{}", item_id))
            .authorization_bearer("token-u1")
            .await;
        fetched.assert_status_ok();
        let fetched_item = fetched.json::<Value>()["item"].clone();
        assert_eq!(fetched_item["done"], true);
        assert_eq!(fetched_item["dueDate"], "2024-01-09");
        assert_eq!(fetched_item["createdAt"], item["createdAt"]);

        let deleted = h
            .server
            .delete(&format!("/todos/{}", item_id))
            .authorization_bearer("token-u1")
            .await;
        deleted.assert_status_ok();
        deleted.assert_json(&json!({}));

        let list = h.server.get("/todos").authorization_bearer("token-u1").await;
        list.assert_json(&json!({ "items": [] }));
        assert!(h.storage.removed().is_empty());
    }

    #[tokio::test]
    async fn test_requests_without_token_are_rejected_before_any_write() {
        let h = harness();

        h.server
            .post("/todos")
            .json(&json!({ "name": "Buy milk", "dueDate": "2024-01-08" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        h.server
            .get("/todos")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        h.server
            .post("/todos/abc/attachment")
            .authorization_bearer("not-a-token")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        assert!(h.store.list_by_owner("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_malformed_or_incomplete_body() {
        let h = harness();

        let missing_due_date = h
            .server
            .post("/todos")
            .authorization_bearer("token-u1")
            .json(&json!({ "name": "Buy milk" }))
            .await;
        missing_due_date.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(missing_due_date.json::<Value>()["success"], false);

        h.server
            .post("/todos")
            .authorization_bearer("token-u1")
            .json(&json!({ "name": "", "dueDate": "2024-01-08" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        h.server
            .post("/todos")
            .authorization_bearer("token-u1")
            .text("{not json")
            .content_type("application/json")
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        assert!(h.store.list_by_owner("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_requires_all_fields() {
        let h = harness();
        let item = create(&h.server, "token-u1", "Buy milk").await;
        let path = format!("/todos/{}", item["itemId"].as_str().unwrap());

        h.server
            .patch(&path)
            .authorization_bearer("token-u1")
            .json(&json!({ "name": "Buy milk", "dueDate": "2024-01-09" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_items_are_not_found() {
        let h = harness();
        let body = json!({ "name": "Buy milk", "done": true, "dueDate": "2024-01-09" });

        h.server
            .get("/todos/does-not-exist")
            .authorization_bearer("token-u1")
            .await
            .assert_status(StatusCode::NOT_FOUND);
        h.server
            .patch("/todos/does-not-exist")
            .authorization_bearer("token-u1")
            .json(&body)
            .await
            .assert_status(StatusCode::NOT_FOUND);
        h.server
            .post("/todos/does-not-exist/attachment")
            .authorization_bearer("token-u1")
            .await
            .assert_status(StatusCode::NOT_FOUND);
        h.server
            .delete("/todos/does-not-exist/attachment")
            .authorization_bearer("token-u1")
            .await
            .assert_status(StatusCode::NOT_FOUND);

        // Update never creates the record
        assert!(h.store.list_by_owner("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_item_succeeds() {
        let h = harness();

        h.server
            .delete("/todos/does-not-exist")
            .authorization_bearer("token-u1")
            .await
            .assert_status_ok();
        assert!(h.storage.removed().is_empty());
    }

    #[tokio::test]
    async fn test_items_are_isolated_per_owner() {
        let h = harness();
        let name: String = Sentence(2..5).fake();
        let item = create(&h.server, "token-u1", &name).await;
        let path = format!("/todos/{}", item["itemId"].as_str().unwrap());

        h.server
            .get("/todos")
            .authorization_bearer("token-u2")
            .await
            .assert_json(&json!({ "items": [] }));
        h.server
            .get(&path)
            .authorization_bearer("token-u2")
            .await
            .assert_status(StatusCode::NOT_FOUND);

        // Another owner's delete is a no-op for u1's item
        h.server
            .delete(&path)
            .authorization_bearer("token-u2")
            .await
            .assert_status_ok();
        h.server
            .get(&path)
            .authorization_bearer("token-u1")
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_attachment_lifecycle() {
        let h = harness();
        let item = create(&h.server, "token-u1", "Buy milk").await;
        let item_id = item["itemId"].as_str().unwrap().to_string();
        let path = format!("/todos/{}", item_id);
        let attachment_path = format!("{}/attachment", path);

        let issued = h
            .server
            .post(&attachment_path)
            .authorization_bearer("token-u1")
            .await;
        issued.assert_status(StatusCode::CREATED);
        let upload_url = issued.json::<Value>()["uploadUrl"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(upload_url.contains(&item_id));

        let expected_url = format!("{}/{}", TEST_ATTACHMENT_BASE_URL, item_id);
        let fetched = h.server.get(&path).authorization_bearer("token-u1").await;
        assert_eq!(fetched.json::<Value>()["item"]["attachmentUrl"], expected_url);

        let removed = h
            .server
            .delete(&attachment_path)
            .authorization_bearer("token-u1")
            .await;
        removed.assert_status_ok();
        removed.assert_json(&json!({}));
        assert_eq!(h.storage.removed(), vec![item_id.clone()]);

        let fetched = h.server.get(&path).authorization_bearer("token-u1").await;
        assert!(fetched.json::<Value>()["item"].get("attachmentUrl").is_none());
    }

    #[tokio::test]
    async fn test_delete_removes_attachment_object() {
        let h = harness();
        let item = create(&h.server, "token-u1", "Buy milk").await;
        let item_id = item["itemId"].as_str().unwrap().to_string();

        h.server
            .post(&format!("/todos/{}/attachment", item_id))
            .authorization_bearer("token-u1")
            .await
            .assert_status(StatusCode::CREATED);
        h.server
            .delete(&format!("/todos/{}", item_id))
            .authorization_bearer("token-u1")
            .await
            .assert_status_ok();

        assert_eq!(h.storage.removed(), vec![item_id]);
    }

    #[tokio::test]
    async fn test_delete_succeeds_when_object_removal_fails() {
        let h = harness_with(FakeAttachmentStorage::failing());
        let item = create(&h.server, "token-u1", "Buy milk").await;
        let item_id = item["itemId"].as_str().unwrap().to_string();

        h.server
            .post(&format!("/todos/{}/attachment", item_id))
            .authorization_bearer("token-u1")
            .await
            .assert_status(StatusCode::CREATED);
        h.server
            .delete(&format!("/todos/{}", item_id))
            .authorization_bearer("token-u1")
            .await
            .assert_status_ok();

        assert!(h.store.get_one("u1", &item_id).await.unwrap().is_none());
        assert_eq!(h.storage.removed(), vec![item_id]);
    }

    #[tokio::test]
    async fn test_presign_failure_leaves_record_untouched() {
        let h = harness_with(FakeAttachmentStorage::unable_to_presign());
        let item = create(&h.server, "token-u1", "Buy milk").await;
        let item_id = item["itemId"].as_str().unwrap().to_string();

        let response = h
            .server
            .post(&format!("/todos/{}/attachment", item_id))
            .authorization_bearer("token-u1")
            .await;
        response.assert_status(StatusCode::BAD_GATEWAY);
        response.assert_json(&json!({
            "success": false,
            "message": "Upstream service error"
        }));

        let stored = h.store.get_one("u1", &item_id).await.unwrap().unwrap();
        assert!(stored.attachment_url.is_none());
        let fetched = h
            .server
            .get(&format!("/todos/{}", item_id))
            .authorization_bearer("token-u1")
            .await;
        assert!(fetched.json::<Value>()["item"].get("attachmentUrl").is_none());
    }

    #[tokio::test]
    async fn test_store_failures_surface_as_generic_server_errors() {
        let server = TestServer::new(todo_app(
            Arc::new(BrokenTodoStore),
            Arc::new(FakeAttachmentStorage::default()),
        ))
        .unwrap();

        let list = server.get("/todos").authorization_bearer("token-u1").await;
        list.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        list.assert_json(&json!({
            "success": false,
            "message": "Service temporarily unavailable"
        }));

        let get = server
            .get("/todos/some-item")
            .authorization_bearer("token-u1")
            .await;
        get.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        get.assert_json(&json!({
            "success": false,
            "message": "Internal server error"
        }));

        let create = server
            .post("/todos")
            .authorization_bearer("token-u1")
            .json(&json!({ "name": "Buy milk", "dueDate": "2024-01-08" }))
            .await;
        create.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

        for body in [list.text(), get.text(), create.text()] {
            assert!(!body.contains(BROKEN_STORE_DETAIL));
            assert!(!body.contains("PoolTimedOut"));
            assert!(!body.contains("pool timed out"));
        }
    }
}
