use super::*;
use std::sync::Arc;
use tokio_postgres::Client;
use tokio_postgres::Row;
use warden_core::ID;
use warden_core::Unique;
use warden_database::*;

const SELECT: &str = const_format::concatcp!(
    "SELECT u.id, u.name, u.username, u.email, u.phone, u.hashword, u.role_id FROM ",
    USERS,
    " u JOIN ",
    ROLES,
    " r ON r.id = u.role_id"
);

impl From<PgErr> for StoreError {
    fn from(e: PgErr) -> Self {
        match violated(&e) {
            Some(USERS_USERNAME_KEY) => Self::Duplicate(Field::Username),
            Some(USERS_EMAIL_KEY) => Self::Duplicate(Field::Email),
            _ => Self::Backend(e.to_string()),
        }
    }
}

fn account(row: Row) -> Result<Account, StoreError> {
    let role = Role::try_from(row.get::<_, i16>(6))
        .map_err(|id| StoreError::Backend(format!("unknown role id {}", id)))?;
    Ok(Account::new(
        ID::from(row.get::<_, uuid::Uuid>(0)),
        row.get::<_, String>(1),
        row.get::<_, String>(2),
        row.get::<_, String>(3),
        row.get::<_, String>(4),
        row.get::<_, String>(5),
        role,
    ))
}

/// Creates the role and user tables, their indexes, and the role rows.
pub async fn prepare(client: &Client) -> Result<(), PgErr> {
    Role::prepare(client).await?;
    Role::derive(client).await?;
    Account::prepare(client).await?;
    Ok(())
}

impl UserStore for Arc<Client> {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        self.query_opt(
            const_format::concatcp!(SELECT, " WHERE LOWER(u.username) = LOWER($1)"),
            &[&username],
        )
        .await?
        .map(account)
        .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        self.query_opt(
            const_format::concatcp!(SELECT, " WHERE LOWER(u.email) = LOWER($1)"),
            &[&email],
        )
        .await?
        .map(account)
        .transpose()
    }

    async fn find_by_uuid(&self, id: ID<Account>) -> Result<Option<Account>, StoreError> {
        self.query_opt(
            const_format::concatcp!(SELECT, " WHERE u.id = $1"),
            &[&id.inner()],
        )
        .await?
        .map(account)
        .transpose()
    }

    async fn create(&self, account: &Account) -> Result<Account, StoreError> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                USERS,
                " (id, name, username, email, phone, hashword, role_id) VALUES ($1, $2, $3, $4, $5, $6, $7)"
            ),
            &[
                &account.id().inner(),
                &account.name(),
                &account.username(),
                &account.email(),
                &account.phone(),
                &account.hashword(),
                &account.role().id(),
            ],
        )
        .await?;
        self.find_by_uuid(account.id())
            .await?
            .ok_or_else(|| StoreError::Backend(format!("account {} missing after insert", account.id())))
    }

    async fn update_fields(
        &self,
        id: ID<Account>,
        changes: &Changes,
    ) -> Result<Option<Account>, StoreError> {
        let updated = self
            .execute(
                const_format::concatcp!(
                    "UPDATE ",
                    USERS,
                    " SET name = $2, username = $3, email = $4, phone = $5, hashword = COALESCE($6, hashword), updated_at = NOW() WHERE id = $1"
                ),
                &[
                    &id.inner(),
                    &changes.name,
                    &changes.username,
                    &changes.email,
                    &changes.phone,
                    &changes.hashword,
                ],
            )
            .await?;
        match updated {
            0 => Ok(None),
            _ => self.find_by_uuid(id).await,
        }
    }
}
