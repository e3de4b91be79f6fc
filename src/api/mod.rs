pub mod health;
pub mod live;
pub mod pnl;

use crate::config::Config;
use crate::domain::{Address, Asset};
use crate::error::AppError;
use crate::orchestration::{LivePriceGate, Orchestrator};
use axum::{routing::get, Router};
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub orchestrator: Arc<Orchestrator>,
    pub price_gate: Arc<LivePriceGate>,
}

impl AppState {
    pub fn new(config: Config, orchestrator: Arc<Orchestrator>, price_gate: Arc<LivePriceGate>) -> Self {
        Self {
            config,
            orchestrator,
            price_gate,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/pnl", get(pnl::get_pnl))
        .route("/v1/pnl/live", get(live::get_live_pnl))
        .layer(cors)
        .with_state(state)
}

pub(crate) fn parse_account(input: &str) -> Result<Address, AppError> {
    Address::parse(input.trim())
        .ok_or_else(|| AppError::BadRequest("Invalid account address".to_string()))
}

/// A market the service was configured to reconcile.
pub(crate) fn parse_market(input: &str, config: &Config) -> Result<Asset, AppError> {
    let asset = Asset::from_str(input).map_err(AppError::BadRequest)?;
    if !config.markets.contains(&asset) {
        return Err(AppError::NotFound(format!("market {} is not enabled", asset)));
    }
    Ok(asset)
}
