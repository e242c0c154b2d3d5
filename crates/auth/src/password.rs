use argon2::Algorithm;
use argon2::Argon2;
use argon2::Params;
use argon2::PasswordHash;
use argon2::PasswordHasher;
use argon2::PasswordVerifier;
use argon2::Version;
use argon2::password_hash::SaltString;

/// Failure inside the hashing algorithm or a malformed stored hash.
#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct HashError(String);

impl From<argon2::password_hash::Error> for HashError {
    fn from(e: argon2::password_hash::Error) -> Self {
        Self(e.to_string())
    }
}
impl From<argon2::Error> for HashError {
    fn from(e: argon2::Error) -> Self {
        Self(e.to_string())
    }
}

/// One-way credential hashing.
pub trait Hasher: Send + Sync + 'static {
    /// Salted, adaptive-cost hash of `password`.
    fn hash(&self, password: &str) -> Result<String, HashError>;
    /// `Ok(false)` on mismatch; `Err` only when `hashword` is malformed.
    fn verify(&self, password: &str, hashword: &str) -> Result<bool, HashError>;
}

/// Argon2id with a process-wide cost.
#[derive(Debug, Clone)]
pub struct Argon {
    params: Params,
}

impl Argon {
    /// `cost` is the Argon2 iteration count; memory and lanes stay at the
    /// crate defaults.
    pub fn new(cost: u32) -> Result<Self, HashError> {
        Self::with_params(Params::DEFAULT_M_COST, cost, Params::DEFAULT_P_COST)
    }
    pub fn with_params(memory: u32, cost: u32, lanes: u32) -> Result<Self, HashError> {
        Ok(Self {
            params: Params::new(memory, cost, lanes, None)?,
        })
    }
    fn argon(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Hasher for Argon {
    fn hash(&self, password: &str) -> Result<String, HashError> {
        Ok(self
            .argon()
            .hash_password(password.as_bytes(), &salt()?)?
            .to_string())
    }
    fn verify(&self, password: &str, hashword: &str) -> Result<bool, HashError> {
        let ref hash = PasswordHash::new(hashword)?;
        match self.argon().verify_password(password.as_bytes(), hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn salt() -> Result<SaltString, HashError> {
    use rand::Rng;
    let ref mut bytes = [0u8; 16];
    rand::rng().fill(bytes);
    Ok(SaltString::encode_b64(bytes)?)
}
