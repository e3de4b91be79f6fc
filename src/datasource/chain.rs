//! Chain snapshot reader backed by a simulation endpoint.

use super::http::JsonClient;
use super::{ChainSnapshot, ChainSnapshotReader, DataSourceError};
use crate::domain::{Address, Asset};
use async_trait::async_trait;
use tracing::debug;

/// Reads `{market, account}` snapshots from a service that simulates settlement.
#[derive(Debug, Clone)]
pub struct HttpChainSnapshotReader {
    client: JsonClient,
}

impl HttpChainSnapshotReader {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: JsonClient::new(base_url),
        }
    }
}

#[async_trait]
impl ChainSnapshotReader for HttpChainSnapshotReader {
    async fn fetch_snapshot(
        &self,
        account: &Address,
        asset: Asset,
    ) -> Result<ChainSnapshot, DataSourceError> {
        debug!(account = %account, asset = %asset, "fetching chain snapshot");

        let payload = serde_json::json!({
            "account": account.as_str(),
            "market": asset.as_str(),
            "settle": true,
        });
        let snapshot: ChainSnapshot = self.client.post("/snapshot", &payload).await?;

        if snapshot.account.asset != asset || snapshot.market.asset != asset {
            return Err(DataSourceError::ParseError(format!(
                "snapshot for {} returned market {}",
                asset, snapshot.market.asset
            )));
        }
        Ok(snapshot)
    }
}
