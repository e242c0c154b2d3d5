//! Identity lifecycle, sessions, and credentials.
//!
//! JWT-based sessions with Argon2 password hashing. Accounts are registered,
//! authenticated and updated through [`Identity`], which only talks to the
//! outside world through a [`UserStore`] and a [`Hasher`].
//!
//! ## Identity Types
//!
//! - [`Account`] — Registered user with credentials
//! - [`Role`] — Fixed role reference data
//! - [`UserResponse`] — Public snapshot of an account
//!
//! ## Security
//!
//! - [`Crypto`] — Session token signing and verification
//! - [`Claims`] — Session token payload
//! - [`Argon`] — Argon2id hashing and verification
//!
//! ## Persistence
//!
//! - [`UserStore`] — Repository contract
//! - [`MemoryStore`] — Process-local store
//! - `Arc<tokio_postgres::Client>` — PostgreSQL store (`database` feature)
//!
//! ## Serving
//!
//! - [`Auth`] — Session gate extractor (`server` feature)
//! - [`routes`] — `/auth` endpoints (`server` feature)
mod account;
mod claims;
mod crypto;
mod dto;
mod error;
mod memory;
mod password;
mod role;
mod scope;
mod service;
mod store;

pub use account::*;
pub use claims::*;
pub use crypto::*;
pub use dto::*;
pub use error::*;
pub use memory::*;
pub use password::*;
pub use role::*;
pub use scope::*;
pub use service::*;
pub use store::*;

#[cfg(feature = "database")]
mod repository;
#[cfg(feature = "database")]
pub use repository::*;

#[cfg(feature = "server")]
mod handlers;
#[cfg(feature = "server")]
mod middleware;
#[cfg(feature = "server")]
pub use handlers::*;
#[cfg(feature = "server")]
pub use middleware::*;
