use thiserror::Error;

/// Auth store failures that handlers branch on.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("a user with that username already exists")]
    UsernameTaken,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AuthError {
    pub fn from_db(e: libsql::Error) -> Self {
        if e.to_string().contains("UNIQUE constraint failed") {
            AuthError::UsernameTaken
        } else {
            AuthError::Other(e.into())
        }
    }
}
