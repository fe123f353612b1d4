use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use trainer_core::OpponentResolver;
use trainer_server::clients::lichess::LichessClient;
use trainer_server::config::Config;
use trainer_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env();

    let lichess = Arc::new(LichessClient::new(&config).context("Failed to build HTTP client")?);
    if config.lichess_token.is_none() {
        tracing::warn!("LICHESS_TOKEN not set; explorer requests are anonymous");
    }

    let resolver = match config.rng_seed {
        Some(seed) => {
            tracing::info!(seed, "Opponent draws are seeded");
            OpponentResolver::seeded(lichess.clone(), lichess, seed)
        }
        None => OpponentResolver::new(lichess.clone(), lichess),
    };
    let state = AppState::new(resolver, config.default_games_threshold);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    trainer_server::serve(listener, state)
        .await
        .context("Server error")
}
