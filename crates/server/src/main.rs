//! SentinelDF Server binary entry point.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let config = ServerConfig::load()?;
    server::start_server(config).await?;
    Ok(())
}
