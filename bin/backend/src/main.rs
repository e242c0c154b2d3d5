//! Warden Backend Binary
//!
//! Serves account registration, login and profiles on BIND_ADDR
//! (default 0.0.0.0:8080). See `backend --help` for every setting.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    warden_core::log()?;
    let config = warden_server::Config::load()?;
    warden_server::run(config).await
}
