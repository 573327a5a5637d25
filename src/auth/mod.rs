//! Auth Module
//!
//! Credential records and opaque login tokens. Registration creates a user
//! with a salted password digest; login verifies credentials and issues a
//! token; logout deletes it. Only digests of tokens and passwords are
//! stored, never the raw values.

mod handler;
mod lib;
mod routes;

pub use handler::require_user;
pub use lib::*;
pub use routes::routes;

pub fn migrations() -> &'static [(&'static str, &'static str)] {
    &[(
        "auth_001_schema.sql",
        include_str!("migrations/001_schema.sql"),
    )]
}
