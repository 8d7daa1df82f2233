//! Wakaf ledger service
//!
//! Hosts the in-process ledger, deploys the MockIDR token and the Wakaf
//! escrow at startup, mirrors every committed event into SQLite and serves
//! the REST API.

mod api;
mod config;
mod db;
mod errors;
mod events;
mod ingest;

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wakaf_protocol::{genesis, Chain, ChannelSink};

use crate::api::ApiState;
use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    info!(database_url = %config.database_url, "Connecting to event index");
    let pool = db::init_pool(&config.database_url).await?;
    db::clear_index(&pool).await?;

    // Start ingestion before genesis so the deployment events are indexed.
    let (tx, rx) = mpsc::unbounded_channel();
    let shutdown = CancellationToken::new();
    let ingest_handle = {
        let (pool, shutdown) = (pool.clone(), shutdown.clone());
        tokio::spawn(async move {
            let result = ingest::run(pool, rx, shutdown.clone()).await;
            // The server stops with ingestion.
            shutdown.cancel();
            result
        })
    };

    let chain = Arc::new(Chain::new(ChannelSink::new(tx)));
    let deployment = genesis::deploy(&chain, &config.genesis).context("genesis deployment failed")?;
    info!(token = %deployment.token, wakaf = %deployment.wakaf, "Contracts deployed");

    let state = Arc::new(ApiState {
        pool,
        chain,
        deployment,
    });
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Wakaf service listening on: {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    match ingest_handle.await {
        Ok(Ok(indexed)) => info!(indexed, "Indexer shut down cleanly"),
        Ok(Err(e)) => return Err(anyhow::Error::new(e).context("event ingestion failed")),
        Err(e) => warn!(error = %e, "Ingestion task panicked"),
    }

    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => {
                warn!(error = %e, "Failed to listen for shutdown signal");
                shutdown.cancelled().await;
            }
        },
        _ = shutdown.cancelled() => warn!("Event ingestion ended; shutting down"),
    }
}
