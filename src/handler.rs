use std::sync::Arc;

use axum::{Json, response::IntoResponse};
use tracing::info;

use crate::db::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(serde_json::json!({ "status": "ok" }))
}
