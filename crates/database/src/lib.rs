//! PostgreSQL connectivity for warden.
//!
//! ## Connectivity
//!
//! - [`db()`] — Establishes a shared database connection
//!
//! ## Schema Traits
//!
//! - [`Schema`] — Table metadata and DDL generation
//! - [`Derive`] — INSERT statement generation for enumerable types
//!
//! ## Errors
//!
//! - [`violated()`] — Names the unique index a failed write collided with
//!
//! ## Table Names
//!
//! Constants for all persistent entities: accounts and their roles.
mod traits;

pub use traits::*;

use std::sync::Arc;
use tokio_postgres::Client;
use tokio_postgres::error::SqlState;

/// Establishes a database connection.
///
/// Returns an `Arc<Client>` suitable for sharing across async tasks.
/// The client pipelines concurrent queries over one connection, so the
/// same handle serves every request worker.
pub async fn db(url: &str) -> Result<Arc<Client>, PgErr> {
    log::info!("connecting to database");
    let tls = tokio_postgres::tls::NoTls;
    let (client, connection) = tokio_postgres::connect(url, tls).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            log::error!("database connection closed: {}", e);
        }
    });
    client
        .execute("SET client_min_messages TO WARNING", &[])
        .await?;
    Ok(Arc::new(client))
}

/// Returns the constraint (or unique index) name when `err` is a unique
/// violation, `None` for every other failure.
pub fn violated(err: &PgErr) -> Option<&str> {
    err.as_db_error()
        .filter(|db| *db.code() == SqlState::UNIQUE_VIOLATION)
        .and_then(|db| db.constraint())
}

/// PostgreSQL error type alias.
pub type PgErr = tokio_postgres::Error;

/// Table for role reference data.
#[rustfmt::skip]
pub const ROLES:       &str = "roles";
/// Table for registered user accounts.
#[rustfmt::skip]
pub const USERS:       &str = "users";
/// Unique index over `LOWER(username)`.
#[rustfmt::skip]
pub const USERS_USERNAME_KEY: &str = "users_username_key";
/// Unique index over `LOWER(email)`.
#[rustfmt::skip]
pub const USERS_EMAIL_KEY:    &str = "users_email_key";
