//! Domain records for position accounting.
//!
//! This module provides:
//! - Scaled-integer fixed-point decimals (`Fixed6`, `Fixed18`)
//! - Primitives: TimeMs, Version, Address, Asset
//! - Position triples and side derivation
//! - Market/account snapshots, checkpoints, accumulators and update events as read
//!   from chain and indexer
//! - Stable ordering helpers for deterministic folding

pub mod account;
pub mod accumulator;
pub mod checkpoint;
pub mod decimal;
pub mod market;
pub mod ordering;
pub mod position;
pub mod primitives;
pub mod update;

pub use account::{AccountSnapshot, LocalState, OracleVersion, PendingPosition};
pub use accumulator::{AccumulatedValues, GlobalAccumulator};
pub use checkpoint::{AccountAccumulation, Checkpoint, CheckpointKind, FeeTotals};
pub use decimal::{DecimalParseError, Fixed18, Fixed6, ScaledDecimal};
pub use market::{FeeCurve, GlobalState, MarketParameter, MarketSnapshot, RiskParameter};
pub use ordering::{pending_tail, sort_checkpoints, sort_updates_ascending};
pub use position::{
    magnitude_of, major_minor, side_of, socialization_factor, MajorMinor, PositionSide,
    PositionTriple,
};
pub use primitives::{Address, Asset, Payoff, TimeMs, Version};
pub use update::UpdateEvent;
