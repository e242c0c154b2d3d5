use super::*;
use warden_core::ID;
use warden_core::Unique;

/// Durable identity record.
///
/// The password hash lives here so stores can hand it to the verifier, but
/// it never leaves the crate through a public snapshot ([`UserResponse`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: ID<Self>,
    name: String,
    username: String,
    email: String,
    phone: String,
    hashword: String,
    role: Role,
}

impl Account {
    pub fn new(
        id: ID<Self>,
        name: String,
        username: String,
        email: String,
        phone: String,
        hashword: String,
        role: Role,
    ) -> Self {
        Self {
            id,
            name,
            username,
            email,
            phone,
            hashword,
            role,
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn username(&self) -> &str {
        &self.username
    }
    pub fn email(&self) -> &str {
        &self.email
    }
    pub fn phone(&self) -> &str {
        &self.phone
    }
    pub fn hashword(&self) -> &str {
        &self.hashword
    }
    pub fn role(&self) -> Role {
        self.role
    }
    /// Applies a profile update. The id and role are left untouched.
    pub fn apply(&mut self, changes: &Changes) {
        self.name = changes.name.clone();
        self.username = changes.username.clone();
        self.email = changes.email.clone();
        self.phone = changes.phone.clone();
        if let Some(ref hashword) = changes.hashword {
            self.hashword = hashword.clone();
        }
    }
}

impl Unique for Account {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

/// Fields a profile update writes. `hashword: None` keeps the stored hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changes {
    pub name: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub hashword: Option<String>,
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use warden_database::*;

    /// Schema implementation for Account (users table).
    /// Uniqueness is enforced by case-insensitive unique indexes, which is
    /// what concurrent registrations ultimately collide on.
    impl Schema for Account {
        fn name() -> &'static str {
            USERS
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                USERS,
                " (
                    id          UUID PRIMARY KEY,
                    name        VARCHAR(255) NOT NULL,
                    username    VARCHAR(64) NOT NULL,
                    email       VARCHAR(255) NOT NULL,
                    phone       VARCHAR(32) NOT NULL,
                    hashword    TEXT NOT NULL CHECK (hashword <> ''),
                    role_id     SMALLINT NOT NULL REFERENCES ",
                ROLES,
                "(id),
                    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE UNIQUE INDEX IF NOT EXISTS ",
                USERS_USERNAME_KEY,
                " ON ",
                USERS,
                " (LOWER(username));
                 CREATE UNIQUE INDEX IF NOT EXISTS ",
                USERS_EMAIL_KEY,
                " ON ",
                USERS,
                " (LOWER(email));"
            )
        }
    }
}
