//! A single user-submitted position change as recorded by the indexer.

use crate::domain::checkpoint::FeeTotals;
use crate::domain::decimal::Fixed6;
use crate::domain::position::PositionTriple;
use crate::domain::primitives::{Address, Asset, Version};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEvent {
    pub version: Version,
    pub account: Address,
    pub asset: Asset,
    pub new_maker: Fixed6,
    pub new_long: Fixed6,
    pub new_short: Fixed6,
    /// Collateral change; negative for withdrawals and liquidation fees.
    pub collateral: Fixed6,
    /// Oracle price at the update's version.
    pub price: Fixed6,
    pub price_impact_fee: Fixed6,
    #[serde(default)]
    pub position_fee: Fixed6,
    #[serde(default)]
    pub keeper_fee: Fixed6,
    #[serde(default)]
    pub interface_fee: Fixed6,
    #[serde(default)]
    pub order_fee: Fixed6,
    /// Set on liquidations.
    #[serde(default)]
    pub protect: bool,
    /// False when the oracle rejected the version and the update never took effect.
    #[serde(default = "default_valid")]
    pub valid: bool,
}

fn default_valid() -> bool {
    true
}

impl UpdateEvent {
    pub fn new_position(&self) -> PositionTriple {
        PositionTriple::new(self.new_maker, self.new_long, self.new_short)
    }

    pub fn fees(&self) -> FeeTotals {
        FeeTotals {
            keeper: self.keeper_fee,
            position: self.position_fee,
            price_impact: self.price_impact_fee,
            interface: self.interface_fee,
            order: self.order_fee,
        }
    }
}
