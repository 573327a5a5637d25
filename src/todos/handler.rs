use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
};
use serde::Deserialize;

use super::{CreateTodo, MAX_CONTENT_LEN, Todos, UpdateTodo};
use crate::api::{
    bad_request, created, forbidden, internal_error, no_content, not_found, success,
};
use crate::auth::require_user;
use crate::handler::AppState;

#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

fn validate_content(content: &str) -> Option<Response> {
    if content.is_empty() {
        return Some(bad_request("content must not be empty"));
    }
    if content.chars().count() > MAX_CONTENT_LEN {
        return Some(bad_request("content must be at most 1000 characters"));
    }
    None
}

pub async fn list_todos(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<PaginationParams>,
) -> Response {
    let user = match require_user(&state, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let todos = Todos::new(state.db.connection());
    // LIMIT -1 is sqlite for "no limit"; the default listing returns everything.
    let limit = params.limit.unwrap_or(-1);
    let offset = params.offset.unwrap_or(0);

    match todos.list_for_owner(user.id, limit, offset).await {
        Ok(items) => success(items),
        Err(e) => {
            tracing::error!("Failed to list todos for user {}: {}", user.id, e);
            internal_error("Failed to list todos")
        }
    }
}

pub async fn create_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateTodo>,
) -> Response {
    let user = match require_user(&state, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    if let Some(response) = validate_content(&payload.content) {
        return response;
    }

    let todos = Todos::new(state.db.connection());

    // The caller is always the owner; the payload carries no owner field.
    match todos.create_todo(user.id, &payload).await {
        Ok(todo) => created(todo),
        Err(e) => {
            tracing::error!("Failed to create todo for user {}: {}", user.id, e);
            internal_error("Failed to create todo")
        }
    }
}

pub async fn get_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Response {
    let user = match require_user(&state, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let todos = Todos::new(state.db.connection());

    match todos.get_todo(id).await {
        Ok(Some(owned)) if owned.owner_id == user.id => success(owned.todo),
        Ok(Some(_)) => forbidden("you do not have permission to access this todo"),
        Ok(None) => not_found("Todo not found"),
        Err(e) => {
            tracing::error!("Failed to get todo {}: {}", id, e);
            internal_error("Failed to get todo")
        }
    }
}

/// PUT replaces the todo; `content` is required.
pub async fn replace_todo(
    state: State<AppState>,
    headers: HeaderMap,
    path: Path<i32>,
    Json(payload): Json<UpdateTodo>,
) -> Response {
    if payload.content.is_none() {
        return bad_request("content is required");
    }
    apply_update(state, headers, path, payload).await
}

/// PATCH updates whichever fields are present.
pub async fn patch_todo(
    state: State<AppState>,
    headers: HeaderMap,
    path: Path<i32>,
    Json(payload): Json<UpdateTodo>,
) -> Response {
    apply_update(state, headers, path, payload).await
}

async fn apply_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i32>,
    payload: UpdateTodo,
) -> Response {
    let user = match require_user(&state, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    if let Some(content) = &payload.content {
        if let Some(response) = validate_content(content) {
            return response;
        }
    }

    let todos = Todos::new(state.db.connection());

    match todos.get_todo(id).await {
        Ok(Some(owned)) if owned.owner_id == user.id => {}
        Ok(Some(_)) => return forbidden("you do not have permission to access this todo"),
        Ok(None) => return not_found("Todo not found"),
        Err(e) => {
            tracing::error!("Failed to get todo {}: {}", id, e);
            return internal_error("Failed to update todo");
        }
    }

    match todos.update_todo(id, &payload).await {
        Ok(Some(todo)) => success(todo),
        Ok(None) => not_found("Todo not found"),
        Err(e) => {
            tracing::error!("Failed to update todo {}: {}", id, e);
            internal_error("Failed to update todo")
        }
    }
}

pub async fn delete_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Response {
    let user = match require_user(&state, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let todos = Todos::new(state.db.connection());

    match todos.get_todo(id).await {
        Ok(Some(owned)) if owned.owner_id == user.id => {}
        Ok(Some(_)) => return forbidden("you do not have permission to access this todo"),
        Ok(None) => return not_found("Todo not found"),
        Err(e) => {
            tracing::error!("Failed to get todo {}: {}", id, e);
            return internal_error("Failed to delete todo");
        }
    }

    match todos.delete_todo(id).await {
        Ok(true) => no_content(),
        Ok(false) => not_found("Todo not found"),
        Err(e) => {
            tracing::error!("Failed to delete todo {}: {}", id, e);
            internal_error("Failed to delete todo")
        }
    }
}
