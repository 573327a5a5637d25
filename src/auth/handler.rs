use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::Response,
};
use serde::{Deserialize, Serialize};

use super::{Auth, CreateUser, User, authenticate};
use crate::api::{bad_request, created, internal_error, success, unauthorized};
use crate::error::AuthError;
use crate::handler::AppState;

const MAX_USERNAME_LEN: usize = 150;
const MAX_PASSWORD_LEN: usize = 128;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    token: String,
}

/// Resolve the caller from the `Authorization` header, or produce the
/// response that ends the request.
pub async fn require_user(state: &AppState, headers: &HeaderMap) -> Result<User, Response> {
    match authenticate(state.db.connection(), headers).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(unauthorized("authentication credentials were not provided")),
        Err(e) => {
            tracing::error!("Failed to resolve auth token: {}", e);
            Err(internal_error("Failed to authenticate request"))
        }
    }
}

pub async fn register(State(state): State<AppState>, Json(payload): Json<CreateUser>) -> Response {
    if payload.username.is_empty() || payload.username.chars().count() > MAX_USERNAME_LEN {
        return bad_request("username must be between 1 and 150 characters");
    }
    if payload.password.is_empty() || payload.password.chars().count() > MAX_PASSWORD_LEN {
        return bad_request("password must be between 1 and 128 characters");
    }

    let auth = Auth::new(state.db.connection());

    match auth.create_user(&payload).await {
        Ok(user) => {
            tracing::info!("registered user {}", user.username);
            created(user)
        }
        Err(AuthError::UsernameTaken) => bad_request("a user with that username already exists"),
        Err(e) => {
            tracing::error!("Failed to create user: {}", e);
            internal_error("Failed to create user")
        }
    }
}

pub async fn login(State(state): State<AppState>, Json(payload): Json<LoginRequest>) -> Response {
    let auth = Auth::new(state.db.connection());

    let user = match auth
        .verify_credentials(&payload.username, &payload.password)
        .await
    {
        Ok(Some(user)) => user,
        Ok(None) => return unauthorized("invalid username or password"),
        Err(e) => {
            tracing::error!("Failed to verify credentials: {}", e);
            return internal_error("Failed to log in");
        }
    };

    match auth.issue_token(user.id).await {
        Ok(token) => success(LoginResponse { token }),
        Err(e) => {
            tracing::error!("Failed to issue token for user {}: {}", user.id, e);
            internal_error("Failed to log in")
        }
    }
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = match require_user(&state, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let auth = Auth::new(state.db.connection());

    // Revoking is idempotent; a token that is already gone is still a logout.
    match auth.revoke_token(user.id).await {
        Ok(_) => success(serde_json::json!({ "status": "logged out" })),
        Err(e) => {
            tracing::error!("Failed to revoke token for user {}: {}", user.id, e);
            internal_error("Failed to log out")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_request_requires_both_fields() {
        let result: Result<LoginRequest, _> = serde_json::from_str(r#"{"username":"ada"}"#);
        assert!(result.is_err());

        let request: LoginRequest =
            serde_json::from_str(r#"{"username":"ada","password":"hunter2"}"#).unwrap();
        assert_eq!(request.username, "ada");
        assert_eq!(request.password, "hunter2");
    }

    #[test]
    fn user_serializes_without_password() {
        let user = User {
            id: 1,
            username: "ada".to_string(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["username"], "ada");
        assert!(json.get("password").is_none());
    }
}
