use super::*;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Issues and verifies HS256 session tokens with a process-wide secret.
#[derive(Clone)]
pub struct Crypto {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: std::time::Duration,
}

impl Crypto {
    pub fn new(secret: &[u8], ttl: std::time::Duration) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }
    pub fn ttl(&self) -> std::time::Duration {
        self.ttl
    }
    /// Signs a fresh session for `user`, expiring one TTL from now.
    pub fn issue(&self, user: &UserResponse, role: Role) -> Result<String, Error> {
        self.encode(&Claims::new(user.clone(), role, self.ttl))
    }
    /// Checks signature and expiry. Accepted up to and including `exp`.
    pub fn verify(&self, token: &str) -> Result<Claims, Error> {
        self.decode(token)
    }
    pub fn encode(&self, claims: &Claims) -> Result<String, Error> {
        jsonwebtoken::encode(&Header::new(ALGORITHM), claims, &self.encoding).map_err(Error::from)
    }
    pub fn decode(&self, token: &str) -> Result<Claims, Error> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(Error::from)
    }
}
