//! Checkpoint reconciliation.
//!
//! Stitches three sources into one PnL view for an account in one market:
//! - the indexer's open/close checkpoints and latest cumulative account totals
//!   (realized window)
//! - the global per-side accumulator series (unrealized window, from the end of the
//!   realized window to the market's latest settlement)
//! - updates not yet folded into the indexer's totals (pending tail)
//!
//! Every call recomputes from its inputs; nothing is retained between calls.

use crate::domain::{
    magnitude_of, pending_tail, sort_checkpoints, AccountAccumulation, AccountSnapshot,
    AccumulatedValues, Checkpoint, CheckpointKind, Fixed6, GlobalAccumulator, MarketSnapshot,
    PositionSide, UpdateEvent, Version,
};
use crate::engine::{FeeTotals, PositionPnl, WindowKind};
use crate::error::{EngineError, IntegrityViolation};
use tracing::debug;

/// Everything one reconciliation reads. Collections belong to a single account and
/// market and must have been fetched against the same indexer cursor.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileInput<'a> {
    pub account: &'a AccountSnapshot,
    pub market: &'a MarketSnapshot,
    pub checkpoints: &'a [Checkpoint],
    pub latest_accumulation: Option<&'a AccountAccumulation>,
    /// Global accumulator series, ascending by version.
    pub accumulators: &'a [GlobalAccumulator],
    /// Account updates, newest first as paged by the indexer.
    pub pending_updates: &'a [UpdateEvent],
}

/// Which slice of history the result covers.
enum Window<'a> {
    /// No indexed open for the current position.
    New,
    Open(&'a Checkpoint),
    Closed {
        open: &'a Checkpoint,
        close: &'a Checkpoint,
    },
}

/// Opening totals accumulated over a window.
#[derive(Debug, Clone, Copy, Default)]
struct OpenTotals {
    size: Fixed6,
    notional: Fixed6,
    price_impact: Fixed6,
}

/// Contribution of not-yet-indexed updates.
#[derive(Debug, Clone, Copy, Default)]
struct TailTotals {
    fees: FeeTotals,
    opens: OpenTotals,
    deposits: Fixed6,
}

pub fn reconcile(input: &ReconcileInput<'_>) -> Result<PositionPnl, EngineError> {
    let account = input.account;
    let side = account.position.side()?;
    account.next_position.side()?;
    let magnitude = magnitude_of(&account.position, side);

    let mut checkpoints = input.checkpoints.to_vec();
    sort_checkpoints(&mut checkpoints);
    check_pairing(&checkpoints)?;
    check_accumulator_order(input.accumulators)?;

    let window = locate_window(&checkpoints, account.local.latest_version, magnitude);

    let mut pnl = match window {
        Window::New => reconcile_new(input, &checkpoints, side, magnitude)?,
        Window::Open(open) => reconcile_open(input, open, side, magnitude)?,
        Window::Closed { open, close } => reconcile_closed(open, close)?,
    };

    apply_totals(&mut pnl);
    Ok(pnl)
}

/// Two opens with no close between them means the indexer dropped a close.
fn check_pairing(sorted: &[Checkpoint]) -> Result<(), IntegrityViolation> {
    let mut open_at: Option<Version> = None;
    for checkpoint in sorted {
        match checkpoint.kind {
            CheckpointKind::Open => {
                if let Some(first) = open_at {
                    return Err(IntegrityViolation::UnpairedOpen {
                        first,
                        second: checkpoint.version,
                    });
                }
                open_at = Some(checkpoint.version);
            }
            CheckpointKind::Close => open_at = None,
        }
    }
    Ok(())
}

fn check_accumulator_order(series: &[GlobalAccumulator]) -> Result<(), IntegrityViolation> {
    for pair in series.windows(2) {
        if pair[1].version < pair[0].version {
            return Err(IntegrityViolation::AccumulatorRegression {
                earlier: pair[0].version,
                later: pair[1].version,
            });
        }
    }
    Ok(())
}

fn locate_window(sorted: &[Checkpoint], cutoff: Version, magnitude: Fixed6) -> Window<'_> {
    let visible: Vec<&Checkpoint> = sorted.iter().filter(|c| c.version <= cutoff).collect();

    let Some(open_idx) = visible
        .iter()
        .rposition(|c| c.kind == CheckpointKind::Open)
    else {
        debug!(cutoff = %cutoff, "no open checkpoint, reconciling as new position");
        return Window::New;
    };
    let open = visible[open_idx];

    let close = visible[open_idx + 1..]
        .iter()
        .find(|c| c.kind == CheckpointKind::Close);

    match close {
        None => Window::Open(open),
        Some(close) if magnitude.is_zero() => Window::Closed { open, close },
        Some(close) => {
            debug!(
                open = %open.version,
                close = %close.version,
                "position newer than indexed history, reconciling as new position"
            );
            Window::New
        }
    }
}

fn reconcile_new(
    input: &ReconcileInput<'_>,
    sorted: &[Checkpoint],
    side: PositionSide,
    magnitude: Fixed6,
) -> Result<PositionPnl, EngineError> {
    let account = input.account;
    let indexed_until = sorted
        .iter()
        .map(|c| c.version)
        .chain(input.latest_accumulation.map(|a| a.version))
        .max()
        .unwrap_or_default();
    let indexed_magnitude = input
        .latest_accumulation
        .filter(|a| a.version >= indexed_until)
        .map(|a| a.magnitude)
        .unwrap_or(Fixed6::ZERO);

    let tail = fold_tail(input.pending_updates, indexed_until, indexed_magnitude)?;

    // Snapshot collateral already reflects everything up to the account's own settlement.
    let boundary = account.local.latest_version;
    let unrealized = unrealized(input.accumulators, boundary, side, magnitude)?;

    Ok(PositionPnl {
        window: WindowKind::New,
        side,
        magnitude,
        start_version: None,
        end_version: boundary,
        start_collateral: account.local.collateral,
        net_deposits: Fixed6::ZERO,
        realized: AccumulatedValues::default(),
        unrealized,
        fees: tail.fees,
        average_entry_price: average_entry(side, tail.opens),
        ..PositionPnl::default()
    })
}

fn reconcile_open(
    input: &ReconcileInput<'_>,
    open: &Checkpoint,
    side: PositionSide,
    magnitude: Fixed6,
) -> Result<PositionPnl, EngineError> {
    let start = &open.accumulation;
    let end = match input.latest_accumulation {
        Some(latest) => latest,
        None => {
            debug!(open = %open.version, "no account accumulation, window ends at open checkpoint");
            start
        }
    };
    check_window(open, end)?;

    let after = end.version.max(open.version);
    let tail = fold_tail(input.pending_updates, after, end.magnitude)?;

    let fees = open.fees + (end.fees - start.fees) + tail.fees;
    let opens = OpenTotals {
        size: open.open_size + (end.open_size - start.open_size) + tail.opens.size,
        notional: open.open_notional
            + (end.open_notional - start.open_notional)
            + tail.opens.notional,
        price_impact: open.open_price_impact_fees
            + (end.open_price_impact_fees - start.open_price_impact_fees)
            + tail.opens.price_impact,
    };

    let unrealized = unrealized(input.accumulators, end.version, side, magnitude)?;

    Ok(PositionPnl {
        window: WindowKind::Open,
        side: if side == PositionSide::None { open.side } else { side },
        magnitude,
        start_version: Some(open.version),
        end_version: end.version,
        start_collateral: open.collateral,
        net_deposits: end.net_deposits - start.net_deposits + tail.deposits,
        realized: end.accumulated - start.accumulated,
        unrealized,
        fees,
        average_entry_price: average_entry(open.side, opens),
        ..PositionPnl::default()
    })
}

fn reconcile_closed(open: &Checkpoint, close: &Checkpoint) -> Result<PositionPnl, EngineError> {
    let start = &open.accumulation;
    let end = &close.accumulation;
    check_window(open, end)?;

    let opens = OpenTotals {
        size: open.open_size + (end.open_size - start.open_size),
        notional: open.open_notional + (end.open_notional - start.open_notional),
        price_impact: open.open_price_impact_fees
            + (end.open_price_impact_fees - start.open_price_impact_fees),
    };

    let (liquidation, liquidation_fee) = match &close.trigger {
        Some(trigger) if trigger.protect => (true, trigger.collateral.abs()),
        _ => (false, Fixed6::ZERO),
    };

    Ok(PositionPnl {
        window: WindowKind::Closed,
        side: open.side,
        magnitude: Fixed6::ZERO,
        start_version: Some(open.version),
        end_version: end.version,
        start_collateral: open.collateral,
        net_deposits: end.net_deposits - start.net_deposits,
        realized: end.accumulated - start.accumulated,
        unrealized: AccumulatedValues::default(),
        fees: open.fees + (end.fees - start.fees),
        average_entry_price: average_entry(open.side, opens),
        liquidation,
        liquidation_fee,
        ..PositionPnl::default()
    })
}

/// Cumulative totals may only grow between the open checkpoint and the window end.
fn check_window(open: &Checkpoint, end: &AccountAccumulation) -> Result<(), IntegrityViolation> {
    let start = &open.accumulation;
    if end.version < start.version {
        return Err(IntegrityViolation::AccumulationBeforeCheckpoint {
            start: start.version,
            end: end.version,
        });
    }

    let monotonic = start
        .fees
        .fields()
        .into_iter()
        .zip(end.fees.fields())
        .map(|((field, before), (_, after))| (field, before, after))
        .chain([
            ("openSize", start.open_size, end.open_size),
            ("openNotional", start.open_notional, end.open_notional),
            (
                "openPriceImpactFees",
                start.open_price_impact_fees,
                end.open_price_impact_fees,
            ),
        ]);

    for (field, before, after) in monotonic {
        if after < before {
            return Err(IntegrityViolation::CumulativeRegression {
                field,
                start: before,
                end: after,
            });
        }
    }
    Ok(())
}

/// Fold valid updates after `after`, starting from the indexed magnitude.
fn fold_tail(
    updates: &[UpdateEvent],
    after: Version,
    indexed_magnitude: Fixed6,
) -> Result<TailTotals, IntegrityViolation> {
    let tail = pending_tail(updates, after);
    let mut totals = TailTotals::default();
    let mut previous = indexed_magnitude;

    for update in &tail {
        let next = update.new_position().magnitude()?;
        if next > previous {
            let opened = next - previous;
            totals.opens.size += opened;
            totals.opens.notional += opened.mul(update.price.abs());
            totals.opens.price_impact += update.price_impact_fee;
        }
        if !update.protect {
            totals.deposits += update.collateral;
        }
        totals.fees = totals.fees + update.fees();
        previous = next;
    }

    if !tail.is_empty() {
        debug!(count = tail.len(), after = %after, "folded pending tail");
    }
    Ok(totals)
}

/// Per-side accumulator movement since `boundary`, times the settled magnitude.
fn unrealized(
    series: &[GlobalAccumulator],
    boundary: Version,
    side: PositionSide,
    magnitude: Fixed6,
) -> Result<AccumulatedValues, IntegrityViolation> {
    if magnitude.is_zero() || side == PositionSide::None {
        return Ok(AccumulatedValues::default());
    }
    let Some(latest) = series.last() else {
        debug!(boundary = %boundary, "empty accumulator series, no unrealized movement");
        return Ok(AccumulatedValues::default());
    };
    let anchor = series
        .iter()
        .rev()
        .find(|a| a.version <= boundary)
        .ok_or(IntegrityViolation::MissingAccumulator(boundary))?;

    Ok((latest.for_side(side) - anchor.for_side(side)).scaled_by(magnitude))
}

/// `(notional ± impact) / size`; impact is added for longs, subtracted for shorts and
/// left out for makers.
fn average_entry(side: PositionSide, opens: OpenTotals) -> Fixed6 {
    let adjusted = match side {
        PositionSide::Long => opens.notional + opens.price_impact,
        PositionSide::Short => opens.notional - opens.price_impact,
        PositionSide::Maker | PositionSide::None => opens.notional,
    };
    adjusted.div(opens.size)
}

/// Fill in the figures derived from realized, unrealized and fees.
fn apply_totals(pnl: &mut PositionPnl) {
    let total = pnl.realized + pnl.unrealized;
    let impact = if pnl.side.is_taker() {
        pnl.fees.price_impact
    } else {
        Fixed6::ZERO
    };

    pnl.pnl = total.pnl - impact;
    pnl.value = total.value - impact;
    pnl.realtime = pnl.value
        - pnl.fees.keeper
        - pnl.fees.position
        - pnl.fees.interface
        - pnl.fees.order;

    let denominator = (pnl.start_collateral
        + pnl.net_deposits.max(Fixed6::ZERO)
        + pnl.fees.interface
        + pnl.fees.order)
        .max(Fixed6::ONE);
    pnl.realtime_percent_denominator = denominator;
    pnl.realtime_percent = percent_of(pnl.realtime, denominator);
}

/// `|amount| / denominator`, with the denominator floored at one.
pub(crate) fn percent_of(amount: Fixed6, denominator: Fixed6) -> Fixed6 {
    amount.abs().div(denominator.max(Fixed6::ONE))
}
