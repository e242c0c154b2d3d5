/// Coarse classification of [`Error`], used by the boundary to pick a
/// response and by callers to decide whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Malformed or missing input. The caller fixes the request.
    Validation,
    /// Username or email already taken.
    Conflict,
    /// Caller must (re-)authenticate.
    Auth,
    /// Target account does not exist.
    NotFound,
    /// Backend failure. Retryable.
    Storage,
    /// Hashing, signing or runtime failure. Not retried.
    Internal,
    /// Caller cancelled or the deadline passed.
    Cancelled,
}

/// Every failure the identity core can report.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),
    /// One entry per offending field, in request order.
    #[error("{}", summary(.0))]
    Fields(Vec<crate::Violation>),
    #[error("password does not match")]
    PasswordMismatch,
    #[error("username already exists")]
    UsernameExists,
    #[error("email already exists")]
    EmailExists,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    TokenExpired,
    #[error("user not found")]
    UserNotFound,
    /// Detail is kept for logs and never rendered to clients.
    #[error("database server failed to execute query")]
    Storage(String),
    #[error("internal server error")]
    Internal(String),
    #[error("request cancelled")]
    Cancelled,
}

impl Error {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Validation(_) | Self::Fields(_) | Self::PasswordMismatch => Kind::Validation,
            Self::UsernameExists | Self::EmailExists => Kind::Conflict,
            Self::InvalidCredentials | Self::InvalidToken | Self::TokenExpired => Kind::Auth,
            Self::UserNotFound => Kind::NotFound,
            Self::Storage(_) => Kind::Storage,
            Self::Internal(_) => Kind::Internal,
            Self::Cancelled => Kind::Cancelled,
        }
    }
    /// Backend detail behind opaque variants, for logging only.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Storage(detail) | Self::Internal(detail) => Some(detail),
            _ => None,
        }
    }
    /// Field failures behind a [`Error::Fields`], rendered as response data.
    pub fn violations(&self) -> Option<&[crate::Violation]> {
        match self {
            Self::Fields(violations) => Some(violations),
            _ => None,
        }
    }
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

fn summary(violations: &[crate::Violation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<crate::HashError> for Error {
    fn from(e: crate::HashError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<crate::StoreError> for Error {
    fn from(e: crate::StoreError) -> Self {
        match e {
            crate::StoreError::Duplicate(crate::Field::Username) => Self::UsernameExists,
            crate::StoreError::Duplicate(crate::Field::Email) => Self::EmailExists,
            crate::StoreError::Backend(detail) => Self::Storage(detail),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match e.kind() {
            ErrorKind::ExpiredSignature => Self::TokenExpired,
            ErrorKind::InvalidToken
            | ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::MissingRequiredClaim(_)
            | ErrorKind::ImmatureSignature
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => Self::InvalidToken,
            _ => Self::Internal(e.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Internal(e.to_string())
    }
}

#[cfg(feature = "server")]
mod response {
    use super::*;
    use actix_web::HttpResponse;
    use actix_web::ResponseError;
    use actix_web::http::StatusCode;

    impl ResponseError for Error {
        fn status_code(&self) -> StatusCode {
            match self.kind() {
                Kind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
                Kind::Conflict => StatusCode::CONFLICT,
                Kind::Auth => StatusCode::UNAUTHORIZED,
                Kind::NotFound => StatusCode::NOT_FOUND,
                Kind::Storage => StatusCode::SERVICE_UNAVAILABLE,
                Kind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
                Kind::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            }
        }
        fn error_response(&self) -> HttpResponse {
            if let Some(detail) = self.detail() {
                log::error!("{}: {}", self, detail);
            }
            let body = crate::Envelope::<&[crate::Violation]>::failure(self);
            HttpResponse::build(self.status_code()).json(body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn storage_detail_stays_internal() {
        let e = Error::Storage("relation \"users\" does not exist".into());
        assert_eq!(e.to_string(), "database server failed to execute query");
        assert_eq!(e.detail(), Some("relation \"users\" does not exist"));
        assert_eq!(e.kind(), Kind::Storage);
    }
    #[test]
    fn duplicates_become_conflicts() {
        let e = Error::from(crate::StoreError::Duplicate(crate::Field::Username));
        assert!(matches!(e, Error::UsernameExists));
        let e = Error::from(crate::StoreError::Duplicate(crate::Field::Email));
        assert!(matches!(e, Error::EmailExists));
        assert_eq!(e.kind(), Kind::Conflict);
    }
    #[test]
    fn field_failures_are_listed_together() {
        let e = Error::Fields(vec![
            crate::Violation::new("name", "name is required"),
            crate::Violation::new("email", "email must be a valid email address"),
        ]);
        assert_eq!(e.kind(), Kind::Validation);
        assert_eq!(e.to_string(), "name is required; email must be a valid email address");
        assert_eq!(e.violations().map(|v| v.len()), Some(2));
        assert!(Error::invalid("bad body").violations().is_none());
    }
    #[test]
    fn expiry_is_an_auth_failure() {
        assert_eq!(Error::TokenExpired.kind(), Kind::Auth);
        assert_eq!(Error::InvalidToken.kind(), Kind::Auth);
        assert_eq!(Error::InvalidCredentials.kind(), Kind::Auth);
    }
}
