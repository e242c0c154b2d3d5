use super::*;
use serde::Deserialize;
use serde::Serialize;
use std::sync::LazyLock;
use warden_core::Unique;

static EMAIL: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern compiles")
});

/// A single rejected request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

impl Violation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Collects every field failure before rejecting the request.
#[derive(Debug, Default)]
struct Check(Vec<Violation>);

impl Check {
    fn required(mut self, field: &'static str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.0.push(Violation::new(field, format!("{} is required", field)));
        }
        self
    }
    fn email(self, value: &str) -> Self {
        match value.trim().is_empty() || EMAIL.is_match(value) {
            true => self.required("email", value),
            false => self.push("email", "email must be a valid email address"),
        }
    }
    fn push(mut self, field: &'static str, message: &str) -> Self {
        self.0.push(Violation::new(field, message));
        self
    }
    fn finish(self) -> Result<(), Error> {
        match self.0.is_empty() {
            true => Ok(()),
            false => Err(Error::Fields(self.0)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), Error> {
        Check::default()
            .required("username", &self.username)
            .required("password", &self.password)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    #[serde(rename = "phoneNumber")]
    pub phone: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), Error> {
        Check::default()
            .required("name", &self.name)
            .email(&self.email)
            .required("phoneNumber", &self.phone)
            .required("username", &self.username)
            .required("password", &self.password)
            .required("confirmPassword", &self.confirm_password)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub name: String,
    pub email: String,
    #[serde(rename = "phoneNumber")]
    pub phone: String,
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub confirm_password: Option<String>,
}

impl UpdateRequest {
    pub fn validate(&self) -> Result<(), Error> {
        let check = Check::default()
            .required("name", &self.name)
            .email(&self.email)
            .required("phoneNumber", &self.phone)
            .required("username", &self.username);
        let check = match self.password {
            Some(ref password) => check.required("password", password),
            None => check,
        };
        check.finish()
    }
}

/// Public snapshot of an account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub uuid: uuid::Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(rename = "phoneNumber")]
    pub phone: String,
    pub role: String,
}

impl From<&Account> for UserResponse {
    fn from(account: &Account) -> Self {
        Self {
            uuid: account.id().inner(),
            name: account.name().to_string(),
            username: account.username().to_string(),
            email: account.email().to_string(),
            phone: account.phone().to_string(),
            role: account.role().label(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub token: String,
}

/// Uniform response body for every endpoint.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success",
            message: String::from("success"),
            data: Some(data),
            token: None,
        }
    }
    pub fn with_token(self, token: String) -> Self {
        Self {
            token: Some(token),
            ..self
        }
    }
}

impl<'a> Envelope<&'a [Violation]> {
    /// Error body. Field failures, if any, travel as `data`.
    pub fn failure(error: &'a Error) -> Self {
        Self {
            status: "error",
            message: error.to_string(),
            data: error.violations(),
            token: None,
        }
    }
}
