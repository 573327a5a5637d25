use anyhow::{Context, Result};
use axum::http::{HeaderMap, header::AUTHORIZATION};
use libsql::Connection;
use rand::{RngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::AuthError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub password: String,
}

const TOKEN_BYTES: usize = 20;
const SALT_BYTES: usize = 16;

/// Create a new login token.
/// The raw value is only returned to the client; the database stores a digest.
pub fn generate_token() -> Result<String> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate token")?;
    Ok(hex::encode(bytes))
}

/// Digest a token so raw values never touch the database.
/// The digest is what lookups compare against.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash a password for storage as `sha256$<salt>$<digest>`.
pub fn hash_password(password: &str) -> Result<String> {
    let mut bytes = [0u8; SALT_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate salt")?;
    let salt = hex::encode(bytes);
    let digest = password_digest(&salt, password);
    Ok(format!("sha256${}${}", salt, digest))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(algorithm), Some(salt), Some(digest)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if algorithm != "sha256" {
        return false;
    }
    password_digest(salt, password) == digest
}

fn password_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Pull the token out of the `Authorization` header.
/// Accepts both `Bearer <token>` and `Token <token>` schemes.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("Token "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Resolve the `Authorization` header into a user, if the token is known.
pub async fn authenticate(conn: &Connection, headers: &HeaderMap) -> Result<Option<User>> {
    let Some(token) = extract_token(headers) else {
        return Ok(None);
    };
    Auth::new(conn).user_for_token(&token).await
}

pub struct Auth<'a> {
    conn: &'a Connection,
}

impl<'a> Auth<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub async fn create_user(&self, input: &CreateUser) -> Result<User, AuthError> {
        let stored = hash_password(&input.password)?;

        let query = r#"
            INSERT INTO users (username, password)
            VALUES (?, ?)
            RETURNING id, username
        "#;

        let mut rows = self
            .conn
            .query(query, libsql::params![input.username.as_str(), stored])
            .await
            .map_err(AuthError::from_db)?;

        if let Some(row) = rows.next().await.map_err(AuthError::from_db)? {
            Ok(User {
                id: row.get(0).map_err(anyhow::Error::from)?,
                username: row.get(1).map_err(anyhow::Error::from)?,
            })
        } else {
            Err(anyhow::anyhow!("failed to create user").into())
        }
    }

    pub async fn verify_credentials(&self, username: &str, password: &str) -> Result<Option<User>> {
        let query = r#"
            SELECT id, username, password
            FROM users WHERE username = ?
        "#;

        let mut rows = self.conn.query(query, libsql::params![username]).await?;

        if let Some(row) = rows.next().await? {
            let stored: String = row.get(2)?;
            if verify_password(password, &stored) {
                Ok(Some(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                }))
            } else {
                Ok(None)
            }
        } else {
            Ok(None)
        }
    }

    /// Issue a fresh token for the user, replacing any previous one.
    /// A user holds at most one active token at a time.
    pub async fn issue_token(&self, user_id: i32) -> Result<String> {
        let token = generate_token()?;
        let token_hash = hash_token(&token);

        let query = "INSERT OR REPLACE INTO auth_tokens (user_id, token_hash) VALUES (?, ?)";
        self.conn
            .execute(query, libsql::params![user_id, token_hash])
            .await?;

        Ok(token)
    }

    pub async fn user_for_token(&self, token: &str) -> Result<Option<User>> {
        let token_hash = hash_token(token);

        let query = r#"
            SELECT users.id, users.username
            FROM auth_tokens
            JOIN users ON users.id = auth_tokens.user_id
            WHERE auth_tokens.token_hash = ?
        "#;

        let mut rows = self.conn.query(query, libsql::params![token_hash]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(User {
                id: row.get(0)?,
                username: row.get(1)?,
            }))
        } else {
            Ok(None)
        }
    }

    pub async fn revoke_token(&self, user_id: i32) -> Result<bool> {
        let result = self
            .conn
            .execute(
                "DELETE FROM auth_tokens WHERE user_id = ?",
                libsql::params![user_id],
            )
            .await?;
        Ok(result > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn generated_tokens_are_hex_and_unique() {
        let first = generate_token().unwrap();
        let second = generate_token().unwrap();
        assert_eq!(first.len(), TOKEN_BYTES * 2);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }

    #[test]
    fn hash_token_stable() {
        let first = hash_token("token");
        let second = hash_token("token");
        let different = hash_token("other");
        assert_eq!(first, second);
        assert_ne!(first, different);
    }

    #[test]
    fn password_round_trip() {
        let stored = hash_password("hunter2").unwrap();
        assert!(stored.starts_with("sha256$"));
        assert!(verify_password("hunter2", &stored));
        assert!(!verify_password("hunter3", &stored));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let first = hash_password("hunter2").unwrap();
        let second = hash_password("hunter2").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("hunter2", &first));
        assert!(verify_password("hunter2", &second));
    }

    #[test]
    fn verify_password_rejects_malformed_stored_value() {
        assert!(!verify_password("hunter2", "not-a-stored-hash"));
        assert!(!verify_password("hunter2", "md5$aa$bb"));
    }

    #[test]
    fn extract_token_accepts_both_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(extract_token(&headers), Some("abc123".to_string()));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Token abc123"));
        assert_eq!(extract_token(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn extract_token_rejects_missing_or_empty() {
        let headers = HeaderMap::new();
        assert_eq!(extract_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("abc123"));
        assert_eq!(extract_token(&headers), None);
    }
}
