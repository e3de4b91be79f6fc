//! Indexed open/close boundaries and the account totals they anchor.

use crate::domain::accumulator::AccumulatedValues;
use crate::domain::decimal::Fixed6;
use crate::domain::position::PositionSide;
use crate::domain::primitives::{Address, Asset, Version};
use crate::domain::update::UpdateEvent;
use serde::{Deserialize, Serialize};

/// Fees charged to an account, by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeTotals {
    pub keeper: Fixed6,
    pub position: Fixed6,
    pub price_impact: Fixed6,
    pub interface: Fixed6,
    pub order: Fixed6,
}

impl FeeTotals {
    pub fn total(&self) -> Fixed6 {
        self.keeper + self.position + self.price_impact + self.interface + self.order
    }

    /// Fields paired with their names, for regression checks and logging.
    pub fn fields(&self) -> [(&'static str, Fixed6); 5] {
        [
            ("keeperFees", self.keeper),
            ("positionFees", self.position),
            ("priceImpactFees", self.price_impact),
            ("interfaceFees", self.interface),
            ("orderFees", self.order),
        ]
    }
}

impl std::ops::Add for FeeTotals {
    type Output = FeeTotals;

    fn add(self, rhs: FeeTotals) -> FeeTotals {
        FeeTotals {
            keeper: self.keeper + rhs.keeper,
            position: self.position + rhs.position,
            price_impact: self.price_impact + rhs.price_impact,
            interface: self.interface + rhs.interface,
            order: self.order + rhs.order,
        }
    }
}

impl std::ops::Sub for FeeTotals {
    type Output = FeeTotals;

    fn sub(self, rhs: FeeTotals) -> FeeTotals {
        FeeTotals {
            keeper: self.keeper - rhs.keeper,
            position: self.position - rhs.position,
            price_impact: self.price_impact - rhs.price_impact,
            interface: self.interface - rhs.interface,
            order: self.order - rhs.order,
        }
    }
}

/// Cumulative totals for one account in one market, inclusive of every update settled
/// at or before `version`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountAccumulation {
    pub version: Version,
    /// Position size after the last update at `version`.
    pub magnitude: Fixed6,
    pub net_deposits: Fixed6,
    pub open_size: Fixed6,
    pub open_notional: Fixed6,
    pub open_price_impact_fees: Fixed6,
    pub accumulated: AccumulatedValues,
    pub fees: FeeTotals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointKind {
    Open,
    Close,
}

/// Written once by the indexer when a position goes from zero to non-zero (open) or
/// back to zero (close).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub kind: CheckpointKind,
    pub account: Address,
    pub asset: Asset,
    pub version: Version,
    pub block_number: u64,
    pub side: PositionSide,
    /// Size entering the boundary (zero for opens).
    pub start_magnitude: Fixed6,
    /// Collateral after the boundary update.
    pub collateral: Fixed6,
    /// The boundary update's own open contribution.
    pub open_size: Fixed6,
    pub open_notional: Fixed6,
    pub open_price_impact_fees: Fixed6,
    /// Fees charged by the boundary update itself.
    pub fees: FeeTotals,
    /// Account totals including the boundary update.
    pub accumulation: AccountAccumulation,
    /// The update that crossed the boundary, when the indexer recorded it.
    #[serde(default)]
    pub trigger: Option<UpdateEvent>,
}
