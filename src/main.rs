use tokio::net::TcpListener;

use voice_emotion_backend::interface::http;
use voice_emotion_backend::shared::{config, logging};

/// Loads `.env`, reads configuration, and serves the HTTP API until the
/// process is stopped. Fails fast when the provider credential is missing.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv_loaded = dotenvy::dotenv().is_ok();
    logging::init(&config::LoggingConfig::from_env());
    if dotenv_loaded {
        log::debug!("[config] loaded .env");
    }

    let cfg = config::Config::from_env()?;
    log::info!("[config] {:?}", cfg);

    tokio::fs::create_dir_all(&cfg.ingest.upload_dir).await?;
    let app = http::app(&cfg)?;

    let listener = TcpListener::bind(&cfg.server.bind_addr).await?;
    http::serve(listener, app).await?;
    Ok(())
}
