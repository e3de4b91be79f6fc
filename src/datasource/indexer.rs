//! Indexer client over the indexer's JSON query endpoint.

use super::http::JsonClient;
use super::{DataSourceError, IndexerClient, IndexerCursor, PageRequest, UpdatePage};
use crate::domain::{
    AccountAccumulation, Address, Asset, Checkpoint, CheckpointKind, GlobalAccumulator, Version,
};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct HttpIndexerClient {
    client: JsonClient,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CursorResponse {
    block_number: u64,
}

impl HttpIndexerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: JsonClient::new(base_url),
        }
    }

    async fn query<T: serde::de::DeserializeOwned>(
        &self,
        payload: serde_json::Value,
    ) -> Result<T, DataSourceError> {
        self.client.post("/query", &payload).await
    }
}

#[async_trait]
impl IndexerClient for HttpIndexerClient {
    async fn latest_cursor(&self) -> Result<IndexerCursor, DataSourceError> {
        let response: CursorResponse = self
            .query(serde_json::json!({ "type": "cursor" }))
            .await?;
        Ok(IndexerCursor {
            block_number: response.block_number,
        })
    }

    async fn fetch_checkpoints(
        &self,
        cursor: IndexerCursor,
        account: &Address,
        asset: Asset,
        kind: Option<CheckpointKind>,
    ) -> Result<Vec<Checkpoint>, DataSourceError> {
        debug!(account = %account, asset = %asset, block = cursor.block_number, "fetching checkpoints");

        let checkpoints: Vec<Checkpoint> = self
            .query(serde_json::json!({
                "type": "checkpoints",
                "account": account.as_str(),
                "market": asset.as_str(),
                "kind": kind,
                "block": cursor.block_number,
            }))
            .await?;

        let (kept, foreign): (Vec<_>, Vec<_>) = checkpoints
            .into_iter()
            .partition(|c| c.asset == asset && kind.map_or(true, |k| c.kind == k));
        if !foreign.is_empty() {
            warn!(count = foreign.len(), asset = %asset, "dropping checkpoints outside the query");
        }
        Ok(kept)
    }

    async fn fetch_latest_accumulation(
        &self,
        cursor: IndexerCursor,
        account: &Address,
        asset: Asset,
    ) -> Result<Option<AccountAccumulation>, DataSourceError> {
        self.query(serde_json::json!({
            "type": "accountAccumulation",
            "account": account.as_str(),
            "market": asset.as_str(),
            "block": cursor.block_number,
        }))
        .await
    }

    async fn fetch_global_accumulators(
        &self,
        cursor: IndexerCursor,
        asset: Asset,
        from: Version,
    ) -> Result<Vec<GlobalAccumulator>, DataSourceError> {
        debug!(asset = %asset, from = %from, "fetching global accumulators");

        self.query(serde_json::json!({
            "type": "globalAccumulators",
            "market": asset.as_str(),
            "fromVersion": from.as_u64(),
            "block": cursor.block_number,
        }))
        .await
    }

    async fn fetch_updates(
        &self,
        cursor: IndexerCursor,
        account: &Address,
        asset: Asset,
        page: PageRequest,
    ) -> Result<UpdatePage, DataSourceError> {
        self.query(serde_json::json!({
            "type": "updates",
            "account": account.as_str(),
            "market": asset.as_str(),
            "skip": page.offset,
            "first": page.limit,
            "order": "desc",
            "block": cursor.block_number,
        }))
        .await
    }
}
