use super::*;

/// Session token payload: a point-in-time snapshot of the account.
///
/// Profile updates after login are not reflected until the client logs in
/// again; the snapshot simply ages out with the token.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub user: UserResponse,
    pub role: Role,
    pub iat: u64,
    pub exp: u64,
}

impl Claims {
    pub fn new(user: UserResponse, role: Role, ttl: std::time::Duration) -> Self {
        let now = jsonwebtoken::get_current_timestamp();
        Self {
            user,
            role,
            iat: now,
            exp: now.saturating_add(ttl.as_secs()),
        }
    }
    pub fn expired(&self) -> bool {
        self.exp < jsonwebtoken::get_current_timestamp()
    }
    pub fn user(&self) -> &UserResponse {
        &self.user
    }
    pub fn role(&self) -> Role {
        self.role
    }
}
