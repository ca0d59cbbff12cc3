use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
        HeaderValue, Method, Uri,
    },
    routing::{get, patch},
    Json, Router,
};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::error::ApiError;
use crate::extract::{JsonBody, TodoId};
use crate::store::Store;
use crate::todo::{NewTodo, Todo, TodoPatch};

pub type SharedStore = Arc<Store>;

const ALLOWED_METHODS: &str = "GET, POST, PATCH, DELETE, OPTIONS";

pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route(
            "/todos",
            get(list_todos)
                .head(method_not_allowed)
                .post(create_todo)
                .patch(missing_id)
                .delete(missing_id),
        )
        .route("/todos/{*rest}", patch(update_todo).delete(delete_todo))
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(unmatched)
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        ))
        .with_state(store)
}

async fn list_todos(State(store): State<SharedStore>) -> Json<Vec<Todo>> {
    Json(store.list().await)
}

async fn create_todo(
    State(store): State<SharedStore>,
    JsonBody(input): JsonBody<NewTodo>,
) -> Result<Json<Todo>, ApiError> {
    let todo = store.create(input).await?;
    tracing::debug!(id = %todo.id, "created todo");
    Ok(Json(todo))
}

async fn update_todo(
    State(store): State<SharedStore>,
    TodoId(id): TodoId,
    JsonBody(patch): JsonBody<TodoPatch>,
) -> Result<Json<Todo>, ApiError> {
    let todo = store.update(&id, patch).await?;
    tracing::debug!(%id, "updated todo");
    Ok(Json(todo))
}

async fn delete_todo(
    State(store): State<SharedStore>,
    TodoId(id): TodoId,
) -> Result<Json<Todo>, ApiError> {
    let todo = store.delete(&id).await?;
    tracing::debug!(%id, "deleted todo");
    Ok(Json(todo))
}

async fn missing_id() -> ApiError {
    ApiError::NotFound
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Paths outside the routes above. PATCH and DELETE under `/todos/` lack a
/// usable id segment; everything else is refused outright.
async fn unmatched(method: Method, uri: Uri) -> ApiError {
    let targets_item = uri.path().starts_with("/todos/");
    if targets_item && (method == Method::PATCH || method == Method::DELETE) {
        ApiError::NotFound
    } else {
        ApiError::MethodNotAllowed
    }
}
