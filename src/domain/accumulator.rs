//! Cumulative value components and the per-market global accumulator series.

use crate::domain::decimal::Fixed6;
use crate::domain::position::PositionSide;
use crate::domain::primitives::{Asset, Version};
use serde::{Deserialize, Serialize};

/// The value components tracked by accumulators.
///
/// On a [`GlobalAccumulator`] these are per unit of position; on an account
/// accumulation they are already multiplied by the account's size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulatedValues {
    /// Sum of the components below.
    pub value: Fixed6,
    pub pnl: Fixed6,
    pub funding: Fixed6,
    pub interest: Fixed6,
    /// Position fees earned by makers.
    #[serde(default)]
    pub position_fee: Fixed6,
}

impl AccumulatedValues {
    /// Multiply every per-unit component by a position size.
    pub fn scaled_by(&self, magnitude: Fixed6) -> Self {
        Self {
            value: self.value.mul(magnitude),
            pnl: self.pnl.mul(magnitude),
            funding: self.funding.mul(magnitude),
            interest: self.interest.mul(magnitude),
            position_fee: self.position_fee.mul(magnitude),
        }
    }
}

impl std::ops::Add for AccumulatedValues {
    type Output = AccumulatedValues;

    fn add(self, rhs: AccumulatedValues) -> AccumulatedValues {
        AccumulatedValues {
            value: self.value + rhs.value,
            pnl: self.pnl + rhs.pnl,
            funding: self.funding + rhs.funding,
            interest: self.interest + rhs.interest,
            position_fee: self.position_fee + rhs.position_fee,
        }
    }
}

impl std::ops::Sub for AccumulatedValues {
    type Output = AccumulatedValues;

    fn sub(self, rhs: AccumulatedValues) -> AccumulatedValues {
        AccumulatedValues {
            value: self.value - rhs.value,
            pnl: self.pnl - rhs.pnl,
            funding: self.funding - rhs.funding,
            interest: self.interest - rhs.interest,
            position_fee: self.position_fee - rhs.position_fee,
        }
    }
}

/// Per-unit cumulative values for every side of one market at one settlement version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalAccumulator {
    pub asset: Asset,
    pub version: Version,
    pub maker: AccumulatedValues,
    pub long: AccumulatedValues,
    pub short: AccumulatedValues,
}

impl GlobalAccumulator {
    pub fn for_side(&self, side: PositionSide) -> AccumulatedValues {
        match side {
            PositionSide::None => AccumulatedValues::default(),
            PositionSide::Maker => self.maker,
            PositionSide::Long => self.long,
            PositionSide::Short => self.short,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(value: i128, pnl: i128) -> AccumulatedValues {
        AccumulatedValues {
            value: Fixed6::from_raw(value),
            pnl: Fixed6::from_raw(pnl),
            ..Default::default()
        }
    }

    #[test]
    fn test_scaled_by_truncates_per_component() {
        let v = values(50_000, -3).scaled_by(Fixed6::from_raw(1_500_000));
        assert_eq!(v.value.raw(), 75_000);
        assert_eq!(v.pnl.raw(), -4);
    }

    #[test]
    fn test_sub_is_componentwise() {
        let d = values(10, 7) - values(4, 9);
        assert_eq!(d.value.raw(), 6);
        assert_eq!(d.pnl.raw(), -2);
    }

    #[test]
    fn test_for_side_none_is_zero() {
        let acc = GlobalAccumulator {
            asset: Asset::Eth,
            version: Version::new(1),
            maker: values(1, 1),
            long: values(2, 2),
            short: values(3, 3),
        };
        assert_eq!(acc.for_side(PositionSide::None), AccumulatedValues::default());
        assert_eq!(acc.for_side(PositionSide::Short), values(3, 3));
    }
}
