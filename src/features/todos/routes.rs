use axum::{
    routing::{get, post},
    Router,
};

use crate::features::todos::handlers::{
    create_attachment, create_todo, delete_todo, get_todo, list_todos, remove_attachment,
    update_todo, TodoState,
};

/// Create routes for the to-do feature
pub fn routes(state: TodoState) -> Router {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/{item_id}",
            get(get_todo).patch(update_todo).delete(delete_todo),
        )
        .route(
            "/todos/{item_id}/attachment",
            post(create_attachment).delete(remove_attachment),
        )
        .with_state(state)
}
