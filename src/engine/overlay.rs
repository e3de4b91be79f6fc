//! Live price overlay on a settled reconciliation result.

use crate::domain::{Fixed6, MarketSnapshot, PositionSide};
use crate::engine::fees::maker_exposure;
use crate::engine::reconcile::percent_of;
use crate::engine::{LivePnl, PositionPnl};

/// Move the settled result to `live_price` (already in market terms).
///
/// Pure: recomputed on every accepted tick without re-running reconciliation.
pub fn live_overlay(pnl: &PositionPnl, market: &MarketSnapshot, live_price: Fixed6) -> LivePnl {
    let price_delta = live_price - market.global.latest_price;

    let live_delta = match pnl.side {
        PositionSide::Long => pnl.magnitude.mul(price_delta),
        PositionSide::Short => -pnl.magnitude.mul(price_delta),
        PositionSide::Maker => price_delta.mul(maker_exposure(pnl.magnitude, &market.next_position)),
        PositionSide::None => Fixed6::ZERO,
    };

    let live_pnl = pnl.realtime + live_delta;

    LivePnl {
        live_price,
        price_delta,
        live_delta,
        live_pnl,
        live_pnl_percent: percent_of(live_pnl, pnl.realtime_percent_denominator),
    }
}
