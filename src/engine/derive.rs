//! Derived market and account views, recomputed from each snapshot.

use crate::domain::{
    magnitude_of, major_minor, socialization_factor, AccountSnapshot, Fixed6, MarketSnapshot,
    PositionSide,
};
use crate::engine::fees::{self, FundingRates};
use crate::engine::status::{classify, stale_flag, PositionStatus, StatusInputs};
use crate::error::EngineError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDerived {
    pub major: Fixed6,
    pub major_side: PositionSide,
    pub minor: Fixed6,
    pub minor_side: PositionSide,
    pub socialization_factor: Fixed6,
    /// Major side exposure is being scaled down for lack of matching liquidity.
    pub is_socialized: bool,
    pub funding_rates: FundingRates,
}

/// Market view over the pending global position.
pub fn derive_market(market: &MarketSnapshot) -> MarketDerived {
    let next = &market.next_position;
    let mm = major_minor(next.long, next.short);
    let factor = socialization_factor(mm.minor, next.maker, mm.major);

    MarketDerived {
        major: mm.major,
        major_side: mm.major_side,
        minor: mm.minor,
        minor_side: mm.minor_side,
        socialization_factor: factor,
        is_socialized: factor < Fixed6::ONE,
        funding_rates: fees::funding_rates(market),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDerived {
    pub side: PositionSide,
    pub next_side: PositionSide,
    pub magnitude: Fixed6,
    pub next_magnitude: Fixed6,
    pub status: PositionStatus,
    pub notional: Fixed6,
    pub next_notional: Fixed6,
    pub leverage: Fixed6,
    pub next_leverage: Fixed6,
    pub maintenance: Fixed6,
    pub next_maintenance: Fixed6,
    pub margin: Fixed6,
    pub next_margin: Fixed6,
    /// For the pending position, at the market's latest price.
    pub liquidation_price: Option<Fixed6>,
}

/// Account view at the market's latest price.
///
/// Fails with an integrity error when either the settled or the pending position holds
/// more than one side.
pub fn derive_account(
    account: &AccountSnapshot,
    market: &MarketSnapshot,
) -> Result<AccountDerived, EngineError> {
    let side = account.position.side()?;
    let next_side = account.next_position.side()?;
    let magnitude = magnitude_of(&account.position, side);
    let next_magnitude = magnitude_of(&account.next_position, next_side);

    let price = market.global.latest_price;
    let collateral = account.local.collateral;
    let risk = &market.risk_parameter;

    let status = classify(StatusInputs {
        magnitude,
        next_magnitude,
        collateral,
        stale: stale_flag(account, market),
    });

    let notional = fees::notional(magnitude, price);
    let next_notional = fees::notional(next_magnitude, price);

    Ok(AccountDerived {
        side,
        next_side,
        magnitude,
        next_magnitude,
        status,
        notional,
        next_notional,
        leverage: fees::leverage(notional, collateral),
        next_leverage: fees::leverage(next_notional, collateral),
        maintenance: fees::maintenance(risk, magnitude, price),
        next_maintenance: fees::maintenance(risk, next_magnitude, price),
        margin: fees::margin(risk, magnitude, price),
        next_margin: fees::margin(risk, next_magnitude, price),
        liquidation_price: fees::liquidation_price(
            next_side,
            next_magnitude,
            price,
            collateral,
            risk,
        ),
    })
}
