use super::*;
use actix_web::FromRequest;
use actix_web::HttpRequest;
use actix_web::dev::Payload;
use actix_web::web;
use std::future::Ready;
use std::future::ready;

/// Extractor for authenticated requests.
///
/// Verifies the bearer token before the handler runs; a missing or bad
/// token rejects the request without reaching the identity service. The
/// resolved identity is handed to the handler explicitly.
pub struct Auth(pub Claims);

impl Auth {
    pub fn claims(&self) -> &Claims {
        &self.0
    }
    pub fn user(&self) -> &UserResponse {
        self.0.user()
    }
    fn resolve(req: &HttpRequest) -> Result<Self, Error> {
        let crypto = req
            .app_data::<web::Data<Crypto>>()
            .ok_or_else(|| Error::Internal("token service not configured".into()))?;
        let header = req
            .headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(Error::InvalidToken)?;
        let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
        crypto.verify(token).map(Self)
    }
}

impl FromRequest for Auth {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;
    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::resolve(req).inspect_err(|e| log::debug!("rejected session: {}", e)))
    }
}
