//! Warden Backend Server
//!
//! Resolves configuration, prepares the schema, seeds the admin account
//! and serves the `/auth` routes from a single actix-web server.
//!
//! ## Submodules
//!
//! - [`config`] — Flags, environment and JSON file settings
//! - [`seed`] — First-run admin account
mod config;
pub mod seed;

pub use config::*;

use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use actix_web::Responder;
use actix_web::middleware::Logger;
use actix_web::web;
use std::sync::Arc;
use tokio_postgres::Client;
use warden_auth::Argon;
use warden_auth::Crypto;
use warden_auth::Identity;
use warden_auth::Timeout;

async fn health(client: web::Data<Arc<Client>>) -> impl Responder {
    match client
        .execute("SELECT 1", &[])
        .await
        .inspect_err(|e| log::error!("health check failed: {}", e))
    {
        Ok(_) => HttpResponse::Ok().body("ok"),
        Err(_) => HttpResponse::ServiceUnavailable().body("database unavailable"),
    }
}

#[rustfmt::skip]
pub async fn run(config: Config) -> anyhow::Result<()> {
    let client = warden_database::db(&config.db_url).await?;
    warden_auth::prepare(&client).await?;
    let hasher = Argon::new(config.hash_cost)?;
    if let Some(ref password) = config.admin_password {
        seed::admin(&client, &hasher, password).await?;
    }
    let crypto = Crypto::new(config.jwt_secret.as_bytes(), config.jwt_ttl);
    let service = Identity::new(client.clone(), hasher, crypto);
    let crypto = web::Data::new(service.crypto().clone());
    let service = web::Data::new(service);
    let timeout = web::Data::new(Timeout(config.request_timeout));
    let client = web::Data::new(client);
    log::info!("starting warden server on {}", config.bind);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .app_data(service.clone())
            .app_data(crypto.clone())
            .app_data(timeout.clone())
            .app_data(client.clone())
            .route("/health", web::get().to(health))
            .configure(warden_auth::routes::<Arc<Client>, Argon>)
    })
    .workers(config.workers)
    .bind(&config.bind)?
    .run()
    .await?;
    Ok(())
}
