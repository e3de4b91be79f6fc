//! Stateless notional, margin, fee and funding formulas.
//!
//! Shared by the reconciliation engine (derived account fields), the live overlay
//! (maker exposure) and hosts quoting a trade before submission.

use crate::domain::{
    major_minor, socialization_factor, Fixed6, MarketSnapshot, PositionSide, PositionTriple,
    RiskParameter,
};
use serde::Serialize;

const HOURS_PER_YEAR: i64 = 8_760;

pub fn notional(magnitude: Fixed6, price: Fixed6) -> Fixed6 {
    magnitude.mul(price.abs())
}

/// Zero when collateral is not positive.
pub fn leverage(notional: Fixed6, collateral: Fixed6) -> Fixed6 {
    if !collateral.is_positive() {
        return Fixed6::ZERO;
    }
    notional.div(collateral)
}

/// Maintenance requirement: `max(notional × maintenance, minMaintenance)`, zero when flat.
pub fn maintenance(risk: &RiskParameter, magnitude: Fixed6, price: Fixed6) -> Fixed6 {
    if magnitude.is_zero() {
        return Fixed6::ZERO;
    }
    notional(magnitude, price)
        .mul(risk.maintenance)
        .max(risk.min_maintenance)
}

/// Initial margin requirement: `max(notional × margin, minMargin)`, zero when flat.
pub fn margin(risk: &RiskParameter, magnitude: Fixed6, price: Fixed6) -> Fixed6 {
    if magnitude.is_zero() {
        return Fixed6::ZERO;
    }
    notional(magnitude, price).mul(risk.margin).max(risk.min_margin)
}

/// Price at which collateral plus price PnL falls to the maintenance requirement.
///
/// Both the ratio and the minimum-maintenance requirement are solved for; whichever is
/// reached first as price moves against the position wins. `None` for makers and flat
/// positions.
pub fn liquidation_price(
    side: PositionSide,
    magnitude: Fixed6,
    price: Fixed6,
    collateral: Fixed6,
    risk: &RiskParameter,
) -> Option<Fixed6> {
    if magnitude.is_zero() {
        return None;
    }
    let entry_notional = magnitude.mul(price);
    let from_minimum = (collateral - risk.min_maintenance).div(magnitude);

    match side {
        PositionSide::Long => {
            let ratio_denominator = magnitude.mul(Fixed6::ONE - risk.maintenance);
            let by_ratio = if ratio_denominator.is_positive() {
                (entry_notional - collateral).div(ratio_denominator)
            } else {
                price
            };
            let by_minimum = price - from_minimum;
            Some(by_ratio.max(by_minimum).max(Fixed6::ZERO))
        }
        PositionSide::Short => {
            let ratio_denominator = magnitude.mul(Fixed6::ONE + risk.maintenance);
            let by_ratio = (collateral + entry_notional).div(ratio_denominator);
            let by_minimum = price + from_minimum;
            Some(by_ratio.min(by_minimum).max(Fixed6::ZERO))
        }
        PositionSide::Maker | PositionSide::None => None,
    }
}

/// Breakdown of the fees charged for one position change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeFee {
    pub linear: Fixed6,
    pub proportional: Fixed6,
    /// Negative when the order reduces skew.
    pub adiabatic: Fixed6,
    /// `proportional + adiabatic`: the part of the fee that moves execution away from
    /// the oracle price.
    pub price_impact: Fixed6,
    pub settlement: Fixed6,
    pub interface: Fixed6,
    pub total: Fixed6,
}

/// Quote the fee for changing `side` by `delta` (signed) at `price`.
///
/// Makers pay linear and proportional fees only; takers additionally pay (or are
/// rebated) the adiabatic fee based on the global skew before and after the order.
pub fn trade_fee(
    market: &MarketSnapshot,
    side: PositionSide,
    delta: Fixed6,
    price: Fixed6,
    interface_fee_rate: Fixed6,
) -> TradeFee {
    if delta.is_zero() || side == PositionSide::None {
        return TradeFee::default();
    }

    let curve = match side {
        PositionSide::Maker => market.risk_parameter.maker_fee,
        PositionSide::Long | PositionSide::Short => market.risk_parameter.taker_fee,
        PositionSide::None => return TradeFee::default(),
    };

    let size = delta.abs();
    let order_notional = notional(size, price);
    let linear = order_notional.mul(curve.linear_fee);
    let proportional = order_notional
        .mul(size.div(curve.scale))
        .mul(curve.proportional_fee);

    let adiabatic = match side {
        PositionSide::Long | PositionSide::Short => {
            let global = &market.next_position;
            let before = global.long - global.short;
            let signed = if side == PositionSide::Long { delta } else { -delta };
            let after = before + signed;
            let mean_skew = (before.abs() + after.abs()).div(Fixed6::from_int(2));
            let charge = order_notional
                .mul(curve.adiabatic_fee)
                .mul(mean_skew.div(curve.scale));
            if after.abs() < before.abs() {
                -charge
            } else {
                charge
            }
        }
        PositionSide::Maker | PositionSide::None => Fixed6::ZERO,
    };

    let price_impact = proportional + adiabatic;
    let settlement = market.parameter.settlement_fee;
    let interface = order_notional.mul(interface_fee_rate);

    TradeFee {
        linear,
        proportional,
        adiabatic,
        price_impact,
        settlement,
        interface,
        total: linear + price_impact + settlement + interface,
    }
}

/// Signed exposure a maker position carries: its share of the taker skew that makers
/// absorb, on the opposite side of the dominant takers.
pub fn maker_exposure(maker_magnitude: Fixed6, global: &PositionTriple) -> Fixed6 {
    if global.maker.is_zero() || maker_magnitude.is_zero() {
        return Fixed6::ZERO;
    }
    let share = maker_magnitude.div(global.maker);
    let skew = global.long - global.short;
    let absorbed = share.mul(skew.abs().min(global.maker));
    if skew.is_positive() {
        -absorbed
    } else {
        absorbed
    }
}

/// Annualized funding paid per unit of each side; negative values are received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRates {
    pub maker: Fixed6,
    pub long: Fixed6,
    pub short: Fixed6,
}

impl FundingRates {
    pub fn hourly(&self) -> FundingRates {
        let hours = Fixed6::from_int(HOURS_PER_YEAR);
        FundingRates {
            maker: self.maker.div(hours),
            long: self.long.div(hours),
            short: self.short.div(hours),
        }
    }

    pub fn for_side(&self, side: PositionSide) -> Fixed6 {
        match side {
            PositionSide::Maker => self.maker,
            PositionSide::Long => self.long,
            PositionSide::Short => self.short,
            PositionSide::None => Fixed6::ZERO,
        }
    }
}

/// Split the market funding rate across sides.
///
/// The paying taker side pays the full rate, scaled down by the socialization factor
/// when it is the socialized major side. After the protocol's funding fee, the rest is
/// shared per unit between the opposite takers and makers.
pub fn funding_rates(market: &MarketSnapshot) -> FundingRates {
    let rate = market.global.funding_rate;
    if rate.is_zero() {
        return FundingRates::default();
    }

    let global = &market.next_position;
    let mm = major_minor(global.long, global.short);
    let socialization = socialization_factor(mm.minor, global.maker, mm.major);

    let (payer_side, payer, receiver) = if rate.is_positive() {
        (PositionSide::Long, global.long, global.short)
    } else {
        (PositionSide::Short, global.short, global.long)
    };

    let payer_factor = if payer_side == mm.major_side {
        socialization
    } else {
        Fixed6::ONE
    };
    let paid_rate = rate.abs().mul(payer_factor);
    let distributed = paid_rate
        .mul(payer)
        .mul(Fixed6::ONE - market.risk_parameter.funding_fee);
    let received_rate = distributed.div(receiver + global.maker);

    let maker = if global.maker.is_zero() {
        Fixed6::ZERO
    } else {
        -received_rate
    };
    let (long, short) = match payer_side {
        PositionSide::Long => (paid_rate, -received_rate),
        _ => (-received_rate, paid_rate),
    };

    FundingRates { maker, long, short }
}
