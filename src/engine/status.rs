//! Position lifecycle status, re-derived from every new snapshot.

use crate::domain::{AccountSnapshot, Fixed6, MarketSnapshot};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PositionStatus {
    Opening,
    Open,
    Closing,
    Closed,
    /// Size change pending settlement.
    Pricing,
    /// No position and no collateral.
    Resolved,
    /// Assigned by hosts for reverted submissions; never produced by [`classify`].
    Failed,
    SyncError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusInputs {
    pub magnitude: Fixed6,
    pub next_magnitude: Fixed6,
    pub collateral: Fixed6,
    pub stale: bool,
}

/// Total classifier; rules are checked in priority order and the first match wins.
pub fn classify(inputs: StatusInputs) -> PositionStatus {
    let StatusInputs {
        magnitude,
        next_magnitude,
        collateral,
        stale,
    } = inputs;

    if stale {
        return PositionStatus::SyncError;
    }

    match (magnitude.is_zero(), next_magnitude.is_zero()) {
        (true, true) if !collateral.is_zero() => PositionStatus::Closed,
        (false, true) => PositionStatus::Closing,
        (true, false) => PositionStatus::Opening,
        (false, false) if next_magnitude != magnitude => PositionStatus::Pricing,
        (false, false) => PositionStatus::Open,
        (true, true) => PositionStatus::Resolved,
    }
}

/// An account is out of sync when its newest pending settlement lags the market by more
/// than one oracle version and that update was rejected.
pub fn stale_flag(account: &AccountSnapshot, market: &MarketSnapshot) -> bool {
    let granularity = market.parameter.oracle_granularity.max(1);
    let lag = market
        .global
        .latest_version
        .as_u64()
        .saturating_sub(account.last_pending_version().as_u64());
    lag > granularity && !account.last_update_valid()
}
