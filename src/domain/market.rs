//! Market-wide snapshot as read from chain after a simulated settlement.

use crate::domain::decimal::Fixed6;
use crate::domain::position::PositionTriple;
use crate::domain::primitives::{Asset, Version};
use serde::{Deserialize, Serialize};

/// Position fee curve for one order side (taker or maker).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeCurve {
    /// Flat fee rate on notional.
    pub linear_fee: Fixed6,
    /// Rate that grows with order size relative to `scale`.
    pub proportional_fee: Fixed6,
    /// Rate charged for moving the long/short skew, rebated when reducing it.
    #[serde(default)]
    pub adiabatic_fee: Fixed6,
    /// Size at which the proportional fee reaches its full rate.
    pub scale: Fixed6,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskParameter {
    pub margin: Fixed6,
    pub maintenance: Fixed6,
    pub min_margin: Fixed6,
    pub min_maintenance: Fixed6,
    pub taker_fee: FeeCurve,
    pub maker_fee: FeeCurve,
    /// Share of funding retained by the protocol.
    #[serde(default)]
    pub funding_fee: Fixed6,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketParameter {
    /// Keeper fee charged per settled update.
    pub settlement_fee: Fixed6,
    /// Spacing between consecutive oracle versions.
    pub oracle_granularity: u64,
    #[serde(default)]
    pub closed: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalState {
    pub latest_price: Fixed6,
    pub latest_version: Version,
    /// Annualized rate; positive means longs pay.
    #[serde(default)]
    pub funding_rate: Fixed6,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub asset: Asset,
    pub global: GlobalState,
    /// Settled global position.
    pub position: PositionTriple,
    /// Global position including pending orders.
    pub next_position: PositionTriple,
    /// Global position immediately before the last update.
    #[serde(default)]
    pub pre: PositionTriple,
    pub risk_parameter: RiskParameter,
    pub parameter: MarketParameter,
}
