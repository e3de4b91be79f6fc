use anyhow::Context;
use pnl_reconciler::datasource::{HttpChainSnapshotReader, HttpIndexerClient, HttpPriceFeed};
use pnl_reconciler::orchestration::{spawn_price_poller, LivePriceGate, Orchestrator};
use pnl_reconciler::{api, config::Config, ChainSnapshotReader, IndexerClient, LivePriceFeed};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("Configuration error")?;
    let port = config.port;

    let chain: Arc<dyn ChainSnapshotReader> =
        Arc::new(HttpChainSnapshotReader::new(config.chain_snapshot_url.clone()));
    let indexer: Arc<dyn IndexerClient> =
        Arc::new(HttpIndexerClient::new(config.indexer_url.clone()));
    let orchestrator = Arc::new(Orchestrator::new(chain, indexer, config.indexer_page_size));

    let price_gate = Arc::new(LivePriceGate::new(config.price_staleness_ms));
    match &config.price_feed_url {
        Some(url) => {
            let feed: Arc<dyn LivePriceFeed> = Arc::new(HttpPriceFeed::new(url.clone()));
            spawn_price_poller(
                feed,
                price_gate.clone(),
                config.markets.clone(),
                Duration::from_millis(config.price_poll_interval_ms.max(1)),
            );
            tracing::info!("Polling live prices from {}", url);
        }
        None => tracing::info!("PRICE_FEED_URL not set, live overlay disabled"),
    }

    let app = api::create_router(api::AppState::new(config, orchestrator, price_gate));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
