//! Collaborators that supply reconciliation inputs: chain snapshots, indexer history and
//! live prices.

use crate::domain::{
    AccountAccumulation, AccountSnapshot, Address, Asset, Checkpoint, CheckpointKind, Fixed18,
    GlobalAccumulator, MarketSnapshot, TimeMs, UpdateEvent, Version,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod chain;
pub mod http;
pub mod indexer;
pub mod mock;
pub mod price;

pub use chain::HttpChainSnapshotReader;
pub use indexer::HttpIndexerClient;
pub use mock::MockDataSource;
pub use price::HttpPriceFeed;

/// Market and account state as if settled now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainSnapshot {
    pub market: MarketSnapshot,
    pub account: AccountSnapshot,
}

/// Indexer position every query of one reconciliation is pinned to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexerCursor {
    pub block_number: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePage {
    /// Newest first.
    pub updates: Vec<UpdateEvent>,
    pub has_more: bool,
}

/// A published price for an oracle feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTick {
    /// Underlying feed, not the market.
    pub asset: Asset,
    pub price: Fixed18,
    pub publish_time: TimeMs,
}

/// Reads simulated post-settlement state from chain. Idempotent for the same chain state.
#[async_trait]
pub trait ChainSnapshotReader: Send + Sync + fmt::Debug {
    async fn fetch_snapshot(
        &self,
        account: &Address,
        asset: Asset,
    ) -> Result<ChainSnapshot, DataSourceError>;
}

/// Reads checkpointed account history and global accumulators.
///
/// Every query takes the cursor returned by [`IndexerClient::latest_cursor`] so that one
/// reconciliation never mixes data from different indexer heights.
#[async_trait]
pub trait IndexerClient: Send + Sync + fmt::Debug {
    async fn latest_cursor(&self) -> Result<IndexerCursor, DataSourceError>;

    /// Checkpoints ordered by version, optionally only one kind.
    async fn fetch_checkpoints(
        &self,
        cursor: IndexerCursor,
        account: &Address,
        asset: Asset,
        kind: Option<CheckpointKind>,
    ) -> Result<Vec<Checkpoint>, DataSourceError>;

    async fn fetch_latest_accumulation(
        &self,
        cursor: IndexerCursor,
        account: &Address,
        asset: Asset,
    ) -> Result<Option<AccountAccumulation>, DataSourceError>;

    /// The newest entry at or before `from` followed by every later entry, ascending.
    async fn fetch_global_accumulators(
        &self,
        cursor: IndexerCursor,
        asset: Asset,
        from: Version,
    ) -> Result<Vec<GlobalAccumulator>, DataSourceError>;

    /// One page of account updates, newest first.
    async fn fetch_updates(
        &self,
        cursor: IndexerCursor,
        account: &Address,
        asset: Asset,
        page: PageRequest,
    ) -> Result<UpdatePage, DataSourceError>;
}

#[async_trait]
pub trait LivePriceFeed: Send + Sync + fmt::Debug {
    /// Latest tick for an underlying feed, `None` if the feed has not published.
    async fn latest_price(&self, asset: Asset) -> Result<Option<PriceTick>, DataSourceError>;
}

/// Error type for data source operations.
#[derive(Debug, Clone)]
pub enum DataSourceError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 429 rate limit, 5xx server error)
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON or malformed response)
    ParseError(String),
    /// Rate limit exceeded (caller should implement backoff)
    RateLimited,
    /// Requested account or market is unknown upstream
    NotFound(String),
    /// Other error
    Other(String),
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DataSourceError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            DataSourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DataSourceError::RateLimited => write!(f, "Rate limited"),
            DataSourceError::NotFound(what) => write!(f, "Not found: {}", what),
            DataSourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for DataSourceError {}
