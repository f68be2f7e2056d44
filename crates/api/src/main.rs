//! StakeHub API server entry point.

use stakehub_api::config;
use stakehub_api::{router, AppState};
use stakehub_core::Store;
use std::env;
use std::sync::Arc;
use tracing::{info, warn};

fn config_path_from_env() -> String {
    env::var("STAKEHUB_CONFIG").unwrap_or_else(|_| "stakehub.toml".to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let path = config_path_from_env();
    let cfg = match config::load_from_file(&path) {
        Ok(cfg) => {
            info!(config = %path, "config loaded");
            cfg
        }
        Err(e) => {
            warn!(config = %path, error = %e, "config not loaded, using defaults");
            config::Config::default()
        }
    };

    let store = Arc::new(Store::new());
    let state = AppState::new(&cfg, store);
    let app = router(state);

    let addr = cfg.bind_addr().to_string();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "stakehub api listening");
    axum::serve(listener, app).await?;
    Ok(())
}
