use super::*;
use actix_web::HttpResponse;
use actix_web::web;
use std::sync::Arc;
use std::time::Duration;
use tokio_postgres::Client;
use warden_core::ID;

/// Identity service as wired into the HTTP server.
pub type Service = Identity<Arc<Client>, Argon>;

/// Upper bound on a single request's store and hashing work.
#[derive(Debug, Clone, Copy)]
pub struct Timeout(pub Duration);

fn scope(timeout: Option<web::Data<Timeout>>) -> Scope {
    match timeout {
        Some(t) => Scope::within(t.0),
        None => Scope::new(),
    }
}

/// Malformed JSON bodies answer with the same envelope as validation errors.
fn json() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _| Error::invalid(err.to_string()).into())
}

pub async fn register<S, H>(
    service: web::Data<Identity<S, H>>,
    timeout: Option<web::Data<Timeout>>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse, Error>
where
    S: UserStore + 'static,
    H: Hasher,
{
    let user = service.register(&scope(timeout), req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(Envelope::success(user)))
}

pub async fn login<S, H>(
    service: web::Data<Identity<S, H>>,
    timeout: Option<web::Data<Timeout>>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, Error>
where
    S: UserStore + 'static,
    H: Hasher,
{
    let LoginResponse { user, token } = service.login(&scope(timeout), req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(Envelope::success(user).with_token(token)))
}

pub async fn update<S, H>(
    service: web::Data<Identity<S, H>>,
    timeout: Option<web::Data<Timeout>>,
    _auth: Auth,
    path: web::Path<uuid::Uuid>,
    req: web::Json<UpdateRequest>,
) -> Result<HttpResponse, Error>
where
    S: UserStore + 'static,
    H: Hasher,
{
    let id = ID::from(path.into_inner());
    let user = service.update(&scope(timeout), req.into_inner(), id).await?;
    Ok(HttpResponse::Ok().json(Envelope::success(user)))
}

pub async fn me<S, H>(service: web::Data<Identity<S, H>>, auth: Auth) -> HttpResponse
where
    S: UserStore + 'static,
    H: Hasher,
{
    HttpResponse::Ok().json(Envelope::success(service.user_login(auth.user())))
}

pub async fn find<S, H>(
    service: web::Data<Identity<S, H>>,
    timeout: Option<web::Data<Timeout>>,
    _auth: Auth,
    path: web::Path<uuid::Uuid>,
) -> Result<HttpResponse, Error>
where
    S: UserStore + 'static,
    H: Hasher,
{
    let user = service
        .user_by_uuid(&scope(timeout), ID::from(path.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(Envelope::success(user)))
}

/// Mounts the `/auth` routes for an `Identity<S, H>` registered as app
/// data. Register and login are open; the rest go through the [`Auth`]
/// extractor.
pub fn routes<S, H>(cfg: &mut web::ServiceConfig)
where
    S: UserStore + 'static,
    H: Hasher,
{
    cfg.service(
        web::scope("/auth")
            .app_data(json())
            .route("/register", web::post().to(register::<S, H>))
            .route("/login", web::post().to(login::<S, H>))
            .route("/user", web::get().to(me::<S, H>))
            .route("/{uuid}", web::get().to(find::<S, H>))
            .route("/{uuid}", web::put().to(update::<S, H>)),
    );
}
