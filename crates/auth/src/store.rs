use super::*;
use warden_core::ID;

/// Which uniqueness constraint a write collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Email,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A concurrent writer got there first. Raised by the store's own
    /// uniqueness guarantee, independent of any pre-check.
    #[error("duplicate {0:?}")]
    Duplicate(Field),
    #[error("{0}")]
    Backend(String),
}

/// Durable record of accounts.
///
/// Lookups return `Ok(None)` when nothing matches; `Err` is reserved for
/// genuine storage failure. Username and email lookups ignore case.
#[allow(async_fn_in_trait)]
pub trait UserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;
    async fn find_by_uuid(&self, id: ID<Account>) -> Result<Option<Account>, StoreError>;
    /// Inserts and returns the record as re-read from the store.
    async fn create(&self, account: &Account) -> Result<Account, StoreError>;
    /// Writes `changes` and returns the updated record, `None` if it vanished.
    async fn update_fields(
        &self,
        id: ID<Account>,
        changes: &Changes,
    ) -> Result<Option<Account>, StoreError>;
}
