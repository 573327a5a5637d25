use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use super::handler;
use crate::handler::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/todos", get(handler::list_todos))
        .route("/todos", post(handler::create_todo))
        .route("/todos/:id", get(handler::get_todo))
        .route("/todos/:id", put(handler::replace_todo))
        .route("/todos/:id", patch(handler::patch_todo))
        .route("/todos/:id", delete(handler::delete_todo))
}
