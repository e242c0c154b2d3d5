use super::*;
use std::sync::Mutex;
use warden_core::ID;
use warden_core::Unique;

/// Process-local [`UserStore`] with the same case-insensitive uniqueness
/// as the PostgreSQL indexes. Locks are never held across an await.
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: Mutex<Vec<Account>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn len(&self) -> usize {
        self.lock().map(|a| a.len()).unwrap_or_default()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Account>>, StoreError> {
        self.accounts
            .lock()
            .map_err(|_| StoreError::Backend("memory store poisoned".into()))
    }
    fn find(&self, matches: impl Fn(&Account) -> bool) -> Result<Option<Account>, StoreError> {
        Ok(self.lock()?.iter().find(|a| matches(a)).cloned())
    }
    fn collides(accounts: &[Account], candidate: &Account) -> Option<Field> {
        accounts
            .iter()
            .filter(|a| a.id() != candidate.id())
            .find_map(|a| {
                if same(a.username(), candidate.username()) {
                    Some(Field::Username)
                } else if same(a.email(), candidate.email()) {
                    Some(Field::Email)
                } else {
                    None
                }
            })
    }
}

/// Unicode case folding, as `LOWER(...)` does in the unique indexes.
fn same(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

impl UserStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        self.find(|a| same(a.username(), username))
    }
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        self.find(|a| same(a.email(), email))
    }
    async fn find_by_uuid(&self, id: ID<Account>) -> Result<Option<Account>, StoreError> {
        self.find(|a| a.id() == id)
    }
    async fn create(&self, account: &Account) -> Result<Account, StoreError> {
        let mut accounts = self.lock()?;
        if let Some(field) = Self::collides(&accounts, account) {
            return Err(StoreError::Duplicate(field));
        }
        accounts.push(account.clone());
        Ok(account.clone())
    }
    async fn update_fields(
        &self,
        id: ID<Account>,
        changes: &Changes,
    ) -> Result<Option<Account>, StoreError> {
        let mut accounts = self.lock()?;
        let Some(index) = accounts.iter().position(|a| a.id() == id) else {
            return Ok(None);
        };
        let mut updated = accounts[index].clone();
        updated.apply(changes);
        if let Some(field) = Self::collides(&accounts, &updated) {
            return Err(StoreError::Duplicate(field));
        }
        accounts[index] = updated.clone();
        Ok(Some(updated))
    }
}
