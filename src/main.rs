use std::sync::Arc;

use album_service::api::{self, AppState};
use album_service::config::Config;
use album_service::store::MongoStore;
use album_service::Server;
use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loaded before the subscriber so `RUST_LOG` may come from `.env`.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match dotenv {
        Ok(path) => debug!(path = %path.display(), "loaded environment file"),
        Err(e) => info!("no `.env` loaded ({e}), using the process environment"),
    }

    let config = Config::parse();

    let store = MongoStore::connect(&config.connection_url, &config.database)
        .await
        .context("connect to MongoDB")?;
    info!(database = %config.database, "connected to MongoDB");

    let state = AppState::new(Arc::new(store));

    Server::bind(config.listen_addr())
        .serve(api::router(state))
        .await
        .context("serve HTTP")?;

    Ok(())
}
