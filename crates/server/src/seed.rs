use warden_auth::Account;
use warden_auth::Error;
use warden_auth::Field;
use warden_auth::Hasher;
use warden_auth::Role;
use warden_auth::StoreError;
use warden_auth::UserStore;
use warden_core::ID;
use warden_core::Unique;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_EMAIL: &str = "admin@warden.local";
pub const ADMIN_PHONE: &str = "0000000000";

/// Ensures an `admin` account exists. Returns whether one was created.
///
/// Runs once at startup, before the server accepts traffic, so the hash is
/// computed inline.
pub async fn admin<S, H>(store: &S, hasher: &H, password: &str) -> Result<bool, Error>
where
    S: UserStore,
    H: Hasher,
{
    if let Some(existing) = store.find_by_username(ADMIN_USERNAME).await? {
        log::info!("admin account present ({})", existing.id());
        return Ok(false);
    }
    let account = Account::new(
        ID::default(),
        String::from("Administrator"),
        String::from(ADMIN_USERNAME),
        String::from(ADMIN_EMAIL),
        String::from(ADMIN_PHONE),
        hasher.hash(password)?,
        Role::Admin,
    );
    match store.create(&account).await {
        Ok(account) => {
            log::info!("seeded admin account {}", account.id());
            Ok(true)
        }
        // another instance won the race
        Err(StoreError::Duplicate(Field::Username)) => {
            log::info!("admin account already seeded");
            Ok(false)
        }
        Err(StoreError::Duplicate(Field::Email)) => {
            log::warn!("no admin seeded: {} belongs to another account", ADMIN_EMAIL);
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}
