//! Pure computation engine for position accounting.
//!
//! Nothing here performs I/O or retains state: hosts call these functions again on
//! every new snapshot, checkpoint or price tick and discard the previous result.

use crate::domain::{AccumulatedValues, Fixed6, PositionSide, Version};
use serde::Serialize;

pub mod derive;
pub mod fees;
pub mod overlay;
pub mod reconcile;
pub mod status;

pub use crate::domain::FeeTotals;
pub use derive::{derive_account, derive_market, AccountDerived, MarketDerived};
pub use fees::{
    funding_rates, leverage, liquidation_price, maintenance, maker_exposure, margin, notional,
    trade_fee, FundingRates, TradeFee,
};
pub use overlay::live_overlay;
pub use reconcile::{reconcile, ReconcileInput};
pub use status::{classify, stale_flag, PositionStatus, StatusInputs};

/// Slice of history a reconciliation result covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowKind {
    /// No indexed open for the current position; realized values are zero.
    #[default]
    New,
    /// From the open checkpoint to the latest indexed totals.
    Open,
    /// A finished position, from its open to its close checkpoint.
    Closed,
}

/// Reconciled PnL for one account in one market.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionPnl {
    pub window: WindowKind,
    pub side: PositionSide,
    /// Settled size.
    pub magnitude: Fixed6,
    pub start_version: Option<Version>,
    /// Version where the realized window ends and the unrealized window starts.
    pub end_version: Version,
    pub start_collateral: Fixed6,
    pub net_deposits: Fixed6,
    pub realized: AccumulatedValues,
    pub unrealized: AccumulatedValues,
    pub pnl: Fixed6,
    pub value: Fixed6,
    /// Value net of every fee.
    pub realtime: Fixed6,
    pub realtime_percent: Fixed6,
    pub realtime_percent_denominator: Fixed6,
    pub average_entry_price: Fixed6,
    pub fees: FeeTotals,
    pub liquidation: bool,
    pub liquidation_fee: Fixed6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LivePnl {
    pub live_price: Fixed6,
    pub price_delta: Fixed6,
    pub live_delta: Fixed6,
    pub live_pnl: Fixed6,
    pub live_pnl_percent: Fixed6,
}
