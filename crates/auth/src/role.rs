/// Fixed set of roles an account can hold. Reference data, never mutated
/// by the identity core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Customer,
}

impl Role {
    pub const fn id(&self) -> i16 {
        match self {
            Self::Admin => 1,
            Self::Customer => 2,
        }
    }
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Customer => "CUSTOMER",
        }
    }
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Admin => "Administrator",
            Self::Customer => "Customer",
        }
    }
    /// Lower-cased code, as carried in public snapshots and claims.
    pub fn label(&self) -> String {
        self.code().to_lowercase()
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Customer
    }
}

impl TryFrom<i16> for Role {
    type Error = i16;
    fn try_from(id: i16) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(Self::Admin),
            2 => Ok(Self::Customer),
            x => Err(x),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use warden_database::*;

    impl Schema for Role {
        fn name() -> &'static str {
            ROLES
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                ROLES,
                " (
                    id          SMALLINT PRIMARY KEY,
                    code        VARCHAR(16) UNIQUE NOT NULL,
                    name        VARCHAR(64) NOT NULL
                );"
            )
        }
        fn indices() -> &'static str {
            ""
        }
    }

    impl Derive for Role {
        fn exhaust() -> Vec<Self> {
            vec![Self::Admin, Self::Customer]
        }
        fn inserts(&self) -> String {
            format!(
                "INSERT INTO {} (id, code, name) VALUES ({}, '{}', '{}') ON CONFLICT (id) DO NOTHING",
                ROLES,
                self.id(),
                self.code(),
                self.name()
            )
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn ids_round_trip() {
        for role in [Role::Admin, Role::Customer] {
            assert_eq!(Role::try_from(role.id()), Ok(role));
        }
        assert_eq!(Role::try_from(7), Err(7));
    }
    #[test]
    fn label_is_lowercase_code() {
        assert_eq!(Role::Admin.label(), "admin");
        assert_eq!(Role::Customer.label(), "customer");
        assert_eq!(serde_json::to_string(&Role::Customer).unwrap(), "\"customer\"");
    }
}
