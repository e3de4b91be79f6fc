//! Mock data source for testing without network calls.

use super::{
    ChainSnapshot, ChainSnapshotReader, DataSourceError, IndexerClient, IndexerCursor,
    LivePriceFeed, PageRequest, PriceTick, UpdatePage,
};
use crate::domain::{
    sort_checkpoints, AccountAccumulation, Address, Asset, Checkpoint, CheckpointKind,
    GlobalAccumulator, UpdateEvent, Version,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// In-memory chain, indexer and price feed.
#[derive(Debug, Clone, Default)]
pub struct MockDataSource {
    cursor: IndexerCursor,
    snapshots: HashMap<(Address, Asset), ChainSnapshot>,
    checkpoints: Vec<Checkpoint>,
    accumulations: HashMap<(Address, Asset), AccountAccumulation>,
    accumulators: Vec<GlobalAccumulator>,
    updates: Vec<UpdateEvent>,
    prices: HashMap<Asset, PriceTick>,
    failing: HashSet<Asset>,
}

impl MockDataSource {
    /// Create a new mock data source with empty data.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cursor(mut self, block_number: u64) -> Self {
        self.cursor = IndexerCursor { block_number };
        self
    }

    /// Add a snapshot, keyed by its account and market.
    pub fn with_snapshot(mut self, snapshot: ChainSnapshot) -> Self {
        let key = (snapshot.account.account.clone(), snapshot.market.asset);
        self.snapshots.insert(key, snapshot);
        self
    }

    pub fn with_checkpoint(mut self, checkpoint: Checkpoint) -> Self {
        self.checkpoints.push(checkpoint);
        self
    }

    pub fn with_checkpoints(mut self, checkpoints: Vec<Checkpoint>) -> Self {
        self.checkpoints.extend(checkpoints);
        self
    }

    pub fn with_accumulation(
        mut self,
        account: Address,
        asset: Asset,
        accumulation: AccountAccumulation,
    ) -> Self {
        self.accumulations.insert((account, asset), accumulation);
        self
    }

    pub fn with_accumulators(mut self, accumulators: Vec<GlobalAccumulator>) -> Self {
        self.accumulators.extend(accumulators);
        self
    }

    /// Add updates in log order; they are served newest first.
    pub fn with_updates(mut self, updates: Vec<UpdateEvent>) -> Self {
        self.updates.extend(updates);
        self
    }

    pub fn with_price(mut self, tick: PriceTick) -> Self {
        self.prices.insert(tick.asset, tick);
        self
    }

    /// Make every chain read for `asset` fail.
    pub fn with_failing_market(mut self, asset: Asset) -> Self {
        self.failing.insert(asset);
        self
    }
}

#[async_trait]
impl ChainSnapshotReader for MockDataSource {
    async fn fetch_snapshot(
        &self,
        account: &Address,
        asset: Asset,
    ) -> Result<ChainSnapshot, DataSourceError> {
        if self.failing.contains(&asset) {
            return Err(DataSourceError::NetworkError(format!(
                "{} snapshot unavailable",
                asset
            )));
        }
        self.snapshots
            .get(&(account.clone(), asset))
            .cloned()
            .ok_or_else(|| DataSourceError::NotFound(format!("{} snapshot for {}", asset, account)))
    }
}

#[async_trait]
impl IndexerClient for MockDataSource {
    async fn latest_cursor(&self) -> Result<IndexerCursor, DataSourceError> {
        Ok(self.cursor)
    }

    async fn fetch_checkpoints(
        &self,
        _cursor: IndexerCursor,
        account: &Address,
        asset: Asset,
        kind: Option<CheckpointKind>,
    ) -> Result<Vec<Checkpoint>, DataSourceError> {
        let mut checkpoints: Vec<Checkpoint> = self
            .checkpoints
            .iter()
            .filter(|c| {
                &c.account == account && c.asset == asset && kind.map_or(true, |k| c.kind == k)
            })
            .cloned()
            .collect();
        sort_checkpoints(&mut checkpoints);
        Ok(checkpoints)
    }

    async fn fetch_latest_accumulation(
        &self,
        _cursor: IndexerCursor,
        account: &Address,
        asset: Asset,
    ) -> Result<Option<AccountAccumulation>, DataSourceError> {
        Ok(self.accumulations.get(&(account.clone(), asset)).copied())
    }

    async fn fetch_global_accumulators(
        &self,
        _cursor: IndexerCursor,
        asset: Asset,
        from: Version,
    ) -> Result<Vec<GlobalAccumulator>, DataSourceError> {
        let mut series: Vec<GlobalAccumulator> = self
            .accumulators
            .iter()
            .filter(|a| a.asset == asset)
            .copied()
            .collect();
        series.sort_by_key(|a| a.version);

        let anchor = series.iter().rposition(|a| a.version <= from).unwrap_or(0);
        Ok(series.split_off(anchor))
    }

    async fn fetch_updates(
        &self,
        _cursor: IndexerCursor,
        account: &Address,
        asset: Asset,
        page: PageRequest,
    ) -> Result<UpdatePage, DataSourceError> {
        let mut updates: Vec<UpdateEvent> = self
            .updates
            .iter()
            .filter(|u| &u.account == account && u.asset == asset)
            .cloned()
            .collect();
        // Inserted in log order, served newest first.
        updates.reverse();
        updates.sort_by(|a, b| b.version.cmp(&a.version));

        let has_more = updates.len() > page.offset + page.limit;
        let updates = updates
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect();
        Ok(UpdatePage { updates, has_more })
    }
}

#[async_trait]
impl LivePriceFeed for MockDataSource {
    async fn latest_price(&self, asset: Asset) -> Result<Option<PriceTick>, DataSourceError> {
        Ok(self.prices.get(&asset).copied())
    }
}
