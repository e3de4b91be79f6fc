//! Per-account market snapshot.

use crate::domain::decimal::Fixed6;
use crate::domain::position::PositionTriple;
use crate::domain::primitives::{Address, Asset, Version};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalState {
    pub collateral: Fixed6,
    /// Version of the account's last local settlement.
    pub latest_version: Version,
}

/// A position update that has been submitted but not yet settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPosition {
    pub version: Version,
    pub position: PositionTriple,
    #[serde(default)]
    pub collateral: Fixed6,
}

/// Oracle outcome for one of the account's pending versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleVersion {
    pub version: Version,
    pub price: Fixed6,
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSnapshot {
    pub account: Address,
    pub asset: Asset,
    pub local: LocalState,
    /// Settled position.
    pub position: PositionTriple,
    /// Position once pending updates settle.
    pub next_position: PositionTriple,
    /// Position immediately before the last update.
    #[serde(default)]
    pub pre: PositionTriple,
    #[serde(default)]
    pub pending_positions: Vec<PendingPosition>,
    #[serde(default)]
    pub versions: Vec<OracleVersion>,
}

impl AccountSnapshot {
    /// Version of the newest pending settlement, or the latest settled version when
    /// nothing is pending.
    pub fn last_pending_version(&self) -> Version {
        self.pending_positions
            .iter()
            .map(|p| p.version)
            .max()
            .unwrap_or(self.local.latest_version)
    }

    /// Whether the oracle accepted the most recent local update.
    pub fn last_update_valid(&self) -> bool {
        self.versions
            .iter()
            .max_by_key(|v| v.version)
            .map(|v| v.valid)
            .unwrap_or(true)
    }
}
