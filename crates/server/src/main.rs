//! vismatch server binary
//!
//! Reads `.env`, then `server.*` and `VISMATCH_SERVER__*` settings.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    let config = ServerConfig::load()?;
    server::start_server(config).await?;

    Ok(())
}
