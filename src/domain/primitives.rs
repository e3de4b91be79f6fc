//! Domain primitives: TimeMs, Version, Address, Asset.

use crate::domain::decimal::Fixed6;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        TimeMs(chrono::Utc::now().timestamp_millis())
    }

    pub fn as_ms(&self) -> i64 {
        self.0
    }
}

/// Settlement (oracle) version. Versions are timestamps in seconds on the markets this
/// crate reads, but only their ordering and spacing are relied on.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Version(pub u64);

impl Version {
    pub fn new(v: u64) -> Self {
        Version(v)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account address (hex string).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
    pub fn new(addr: String) -> Self {
        Address(addr)
    }

    /// Parse a `0x`-prefixed hex address, lowercasing it.
    pub fn parse(input: &str) -> Option<Self> {
        let hex = input.strip_prefix("0x")?;
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(Address(input.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Markets supported by the reconciler.
///
/// Closed set: adding a market means adding a variant, and every `match` below has to
/// say how it prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Asset {
    Btc,
    Eth,
    Sol,
    Link,
    Arb,
    Xau,
    Eur,
    /// Milli-squared BTC: BTC² / 1000.
    MsqBtc,
    /// Centimilli-squared ETH: ETH² / 100000.
    CmsqEth,
}

/// How a market's price is derived from its underlying oracle price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payoff {
    Linear,
    Squared { divisor: i64 },
}

impl Asset {
    pub const ALL: [Asset; 9] = [
        Asset::Btc,
        Asset::Eth,
        Asset::Sol,
        Asset::Link,
        Asset::Arb,
        Asset::Xau,
        Asset::Eur,
        Asset::MsqBtc,
        Asset::CmsqEth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Asset::Btc => "btc",
            Asset::Eth => "eth",
            Asset::Sol => "sol",
            Asset::Link => "link",
            Asset::Arb => "arb",
            Asset::Xau => "xau",
            Asset::Eur => "eur",
            Asset::MsqBtc => "msqbtc",
            Asset::CmsqEth => "cmsqeth",
        }
    }

    /// The oracle feed whose price this market follows.
    pub fn underlying(&self) -> Asset {
        match self {
            Asset::MsqBtc => Asset::Btc,
            Asset::CmsqEth => Asset::Eth,
            Asset::Btc
            | Asset::Eth
            | Asset::Sol
            | Asset::Link
            | Asset::Arb
            | Asset::Xau
            | Asset::Eur => *self,
        }
    }

    pub fn payoff(&self) -> Payoff {
        match self {
            Asset::MsqBtc => Payoff::Squared { divisor: 1_000 },
            Asset::CmsqEth => Payoff::Squared { divisor: 100_000 },
            Asset::Btc
            | Asset::Eth
            | Asset::Sol
            | Asset::Link
            | Asset::Arb
            | Asset::Xau
            | Asset::Eur => Payoff::Linear,
        }
    }

    /// Map an underlying oracle price to this market's price.
    pub fn market_price(&self, underlying_price: Fixed6) -> Fixed6 {
        match self.payoff() {
            Payoff::Linear => underlying_price,
            Payoff::Squared { divisor } => {
                underlying_price.mul(underlying_price).div(Fixed6::from_int(divisor))
            }
        }
    }
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Asset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Asset::ALL
            .iter()
            .find(|a| a.as_str() == lowered)
            .copied()
            .ok_or_else(|| format!("unknown asset: {}", s))
    }
}
