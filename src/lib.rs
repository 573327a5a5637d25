use axum::{Router, routing::get};

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod todos;

use handler::AppState;

pub fn router(state: AppState) -> Router {
    let api = Router::new().merge(auth::routes()).merge(todos::routes());

    Router::new()
        .route("/", get(handler::healthcheck))
        .nest("/api", api)
        .with_state(state)
}
