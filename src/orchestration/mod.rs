//! Drives the pure engine from the data sources.

use crate::datasource::DataSourceError;
use crate::error::EngineError;
use thiserror::Error;

pub mod live;
pub mod orchestrator;

pub use live::{poll_prices_once, spawn_price_poller, LivePriceGate, ResultSlot};
pub use orchestrator::{MarketRow, Orchestrator, ReconciledMarket};

#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error(transparent)]
    DataSource(#[from] DataSourceError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}
