use crate::datasource::{
    ChainSnapshotReader, DataSourceError, IndexerClient, IndexerCursor, PageRequest,
};
use crate::domain::{Address, Asset, Fixed6, MarketSnapshot, UpdateEvent, Version};
use crate::engine::{
    derive_account, derive_market, reconcile, AccountDerived, MarketDerived, PositionPnl,
    ReconcileInput,
};
use crate::orchestration::live::ResultSlot;
use crate::orchestration::OrchestrationError;
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// One market's reconciled view for an account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledMarket {
    pub asset: Asset,
    pub cursor: IndexerCursor,
    pub latest_price: Fixed6,
    pub latest_version: Version,
    pub market: MarketDerived,
    pub account: AccountDerived,
    pub pnl: PositionPnl,
    #[serde(skip)]
    pub snapshot: MarketSnapshot,
}

/// Per-market outcome; a failing market never hides the others.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum MarketRow {
    Available(Box<ReconciledMarket>),
    Unavailable { asset: Asset, error: String },
}

impl MarketRow {
    pub fn asset(&self) -> Asset {
        match self {
            MarketRow::Available(market) => market.asset,
            MarketRow::Unavailable { asset, .. } => *asset,
        }
    }
}

type SlotKey = (Address, Asset);

#[derive(Clone, Debug)]
pub struct Orchestrator {
    chain: Arc<dyn ChainSnapshotReader>,
    indexer: Arc<dyn IndexerClient>,
    page_size: usize,
    slots: Arc<Mutex<HashMap<SlotKey, Arc<ResultSlot<ReconciledMarket>>>>>,
}

impl Orchestrator {
    pub fn new(
        chain: Arc<dyn ChainSnapshotReader>,
        indexer: Arc<dyn IndexerClient>,
        page_size: usize,
    ) -> Self {
        Self {
            chain,
            indexer,
            page_size: page_size.max(1),
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Reconcile every market concurrently. Failures become unavailable rows.
    pub async fn reconcile_account(&self, account: &Address, assets: &[Asset]) -> Vec<MarketRow> {
        let futures = assets.iter().map(|&asset| async move {
            match self.reconcile_market(account, asset).await {
                Ok(market) => MarketRow::Available(Box::new(market)),
                Err(e) => {
                    warn!(account = %account, asset = %asset, error = %e, "market unavailable");
                    MarketRow::Unavailable {
                        asset,
                        error: e.to_string(),
                    }
                }
            }
        });
        join_all(futures).await
    }

    /// Fetch a consistent input set for one market and run the engine on it.
    ///
    /// If a reconciliation started later for the same account and market has already
    /// published, its result is returned instead of this one. The slot that arbitrates
    /// between them lives only while a reconciliation for the key is in flight.
    pub async fn reconcile_market(
        &self,
        account: &Address,
        asset: Asset,
    ) -> Result<ReconciledMarket, OrchestrationError> {
        let slot = self.slot(account, asset).await;
        let result = self.reconcile_in_slot(&slot, account, asset).await;
        self.release(account, asset, &slot).await;
        result
    }

    async fn reconcile_in_slot(
        &self,
        slot: &ResultSlot<ReconciledMarket>,
        account: &Address,
        asset: Asset,
    ) -> Result<ReconciledMarket, OrchestrationError> {
        let seq = slot.begin();

        let cursor = self.indexer.latest_cursor().await?;
        let (snapshot, checkpoints, accumulation) = tokio::try_join!(
            self.chain.fetch_snapshot(account, asset),
            self.indexer.fetch_checkpoints(cursor, account, asset, None),
            self.indexer.fetch_latest_accumulation(cursor, account, asset),
        )?;

        // Oldest version the engine can stitch at: the indexed end or the account's own
        // settlement, whichever is earlier.
        let indexed = accumulation
            .map(|a| a.version)
            .or_else(|| checkpoints.last().map(|c| c.version))
            .unwrap_or_default();
        let from = indexed.min(snapshot.account.local.latest_version);

        let (accumulators, updates) = tokio::try_join!(
            self.indexer.fetch_global_accumulators(cursor, asset, from),
            self.fetch_updates_since(cursor, account, asset, from),
        )?;

        debug!(
            account = %account,
            asset = %asset,
            block = cursor.block_number,
            checkpoints = checkpoints.len(),
            accumulators = accumulators.len(),
            updates = updates.len(),
            "reconciling"
        );

        let market = derive_market(&snapshot.market);
        let derived = derive_account(&snapshot.account, &snapshot.market)?;
        let pnl = reconcile(&ReconcileInput {
            account: &snapshot.account,
            market: &snapshot.market,
            checkpoints: &checkpoints,
            latest_accumulation: accumulation.as_ref(),
            accumulators: &accumulators,
            pending_updates: &updates,
        })?;

        let result = ReconciledMarket {
            asset,
            cursor,
            latest_price: snapshot.market.global.latest_price,
            latest_version: snapshot.market.global.latest_version,
            market,
            account: derived,
            pnl,
            snapshot: snapshot.market,
        };

        if slot.publish(seq, result.clone()).await {
            info!(account = %account, asset = %asset, status = ?result.account.status, "reconciled");
            return Ok(result);
        }
        debug!(account = %account, asset = %asset, seq, "superseded by newer reconciliation");
        Ok(slot.current().await.unwrap_or(result))
    }

    /// Page updates newest first until a page reaches `stop` or runs out.
    async fn fetch_updates_since(
        &self,
        cursor: IndexerCursor,
        account: &Address,
        asset: Asset,
        stop: Version,
    ) -> Result<Vec<UpdateEvent>, DataSourceError> {
        let mut updates = Vec::new();
        let mut offset = 0;
        loop {
            let page = self
                .indexer
                .fetch_updates(
                    cursor,
                    account,
                    asset,
                    PageRequest {
                        offset,
                        limit: self.page_size,
                    },
                )
                .await?;

            let fetched = page.updates.len();
            let reached_stop = page.updates.last().map_or(true, |u| u.version <= stop);
            updates.extend(page.updates);

            if !page.has_more || fetched == 0 || reached_stop {
                break;
            }
            offset += fetched;
        }
        Ok(updates)
    }

    async fn slot(&self, account: &Address, asset: Asset) -> Arc<ResultSlot<ReconciledMarket>> {
        let mut slots = self.slots.lock().await;
        slots
            .entry((account.clone(), asset))
            .or_insert_with(|| Arc::new(ResultSlot::new()))
            .clone()
    }

    /// Drop the slot once the map and the caller hold the only references.
    async fn release(&self, account: &Address, asset: Asset, slot: &Arc<ResultSlot<ReconciledMarket>>) {
        let key = (account.clone(), asset);
        let mut slots = self.slots.lock().await;
        let idle = slots
            .get(&key)
            .map_or(false, |held| Arc::ptr_eq(held, slot) && Arc::strong_count(slot) == 2);
        if idle {
            slots.remove(&key);
        }
    }
}
