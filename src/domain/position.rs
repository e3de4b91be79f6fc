//! Position sides, magnitudes and the long/short balance of a market.

use crate::domain::decimal::Fixed6;
use crate::error::IntegrityViolation;
use serde::{Deserialize, Serialize};

/// Which side of a market a position holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    #[default]
    None,
    Maker,
    Long,
    Short,
}

impl PositionSide {
    pub fn is_taker(&self) -> bool {
        matches!(self, PositionSide::Long | PositionSide::Short)
    }
}

impl std::fmt::Display for PositionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionSide::None => write!(f, "none"),
            PositionSide::Maker => write!(f, "maker"),
            PositionSide::Long => write!(f, "long"),
            PositionSide::Short => write!(f, "short"),
        }
    }
}

/// `{maker, long, short}` sizes. For an account at most one is non-zero; for a market
/// all three are the global open interest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionTriple {
    pub maker: Fixed6,
    pub long: Fixed6,
    pub short: Fixed6,
}

impl PositionTriple {
    pub fn new(maker: Fixed6, long: Fixed6, short: Fixed6) -> Self {
        Self { maker, long, short }
    }

    pub fn maker(size: Fixed6) -> Self {
        Self::new(size, Fixed6::ZERO, Fixed6::ZERO)
    }

    pub fn long(size: Fixed6) -> Self {
        Self::new(Fixed6::ZERO, size, Fixed6::ZERO)
    }

    pub fn short(size: Fixed6) -> Self {
        Self::new(Fixed6::ZERO, Fixed6::ZERO, size)
    }

    pub fn side(&self) -> Result<PositionSide, IntegrityViolation> {
        side_of(self.maker, self.long, self.short)
    }

    /// Size of the held side, zero when flat.
    pub fn magnitude(&self) -> Result<Fixed6, IntegrityViolation> {
        Ok(magnitude_of(self, self.side()?))
    }
}

/// The side with a non-zero size. More than one non-zero side is an integrity error.
pub fn side_of(
    maker: Fixed6,
    long: Fixed6,
    short: Fixed6,
) -> Result<PositionSide, IntegrityViolation> {
    for v in [maker, long, short] {
        if v.is_negative() {
            return Err(IntegrityViolation::NegativeMagnitude(v));
        }
    }

    match (!maker.is_zero(), !long.is_zero(), !short.is_zero()) {
        (false, false, false) => Ok(PositionSide::None),
        (true, false, false) => Ok(PositionSide::Maker),
        (false, true, false) => Ok(PositionSide::Long),
        (false, false, true) => Ok(PositionSide::Short),
        _ => Err(IntegrityViolation::MultipleSides { maker, long, short }),
    }
}

pub fn magnitude_of(triple: &PositionTriple, side: PositionSide) -> Fixed6 {
    match side {
        PositionSide::None => Fixed6::ZERO,
        PositionSide::Maker => triple.maker,
        PositionSide::Long => triple.long,
        PositionSide::Short => triple.short,
    }
}

/// The larger and smaller taker sides of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MajorMinor {
    pub major: Fixed6,
    pub major_side: PositionSide,
    pub minor: Fixed6,
    pub minor_side: PositionSide,
}

/// Ties break toward long being the major side.
pub fn major_minor(long: Fixed6, short: Fixed6) -> MajorMinor {
    if long >= short {
        MajorMinor {
            major: long,
            major_side: PositionSide::Long,
            minor: short,
            minor_side: PositionSide::Short,
        }
    } else {
        MajorMinor {
            major: short,
            major_side: PositionSide::Short,
            minor: long,
            minor_side: PositionSide::Long,
        }
    }
}

/// `min((minor + maker) / major, 1)`, or 1 when there is no major side.
///
/// Below 1 the major side is only partly matched and its exposure is socialized.
pub fn socialization_factor(minor: Fixed6, maker_next: Fixed6, major: Fixed6) -> Fixed6 {
    if major.is_zero() {
        return Fixed6::ONE;
    }
    (minor + maker_next).div(major).min(Fixed6::ONE)
}
