use pnl_reconciler::domain::{
    AccountAccumulation, AccountSnapshot, AccumulatedValues, Checkpoint, CheckpointKind,
    FeeTotals, GlobalAccumulator, GlobalState, LocalState, MarketParameter, MarketSnapshot,
    PositionTriple, RiskParameter,
};
use pnl_reconciler::{
    live_overlay, reconcile, Address, Asset, Fixed6, PositionPnl, PositionSide, ReconcileInput,
    Version,
};

fn d(s: &str) -> Fixed6 {
    Fixed6::from_decimal_string(s).unwrap()
}

fn market() -> MarketSnapshot {
    let global = PositionTriple::new(d("100"), d("30"), d("10"));
    MarketSnapshot {
        asset: Asset::Eth,
        global: GlobalState {
            latest_price: d("2.05"),
            latest_version: Version::new(20),
            funding_rate: Fixed6::ZERO,
        },
        position: global,
        next_position: global,
        pre: global,
        risk_parameter: RiskParameter::default(),
        parameter: MarketParameter::default(),
    }
}

fn accumulator(version: u64, value: &str) -> GlobalAccumulator {
    let values = AccumulatedValues {
        value: d(value),
        pnl: d(value),
        ..AccumulatedValues::default()
    };
    GlobalAccumulator {
        asset: Asset::Eth,
        version: Version::new(version),
        maker: values,
        long: values,
        short: AccumulatedValues::default(),
    }
}

/// Size 1 opened at 2.0 with 0.002 price impact, settled at 2.05.
fn settled(side: PositionSide) -> (PositionPnl, MarketSnapshot) {
    let account = Address::new("0xa11ce".to_string());
    let fees = FeeTotals {
        price_impact: d("0.002"),
        ..FeeTotals::default()
    };
    let accumulation = AccountAccumulation {
        version: Version::new(10),
        magnitude: d("1"),
        net_deposits: Fixed6::ZERO,
        open_size: d("1"),
        open_notional: d("2"),
        open_price_impact_fees: d("0.002"),
        accumulated: AccumulatedValues::default(),
        fees,
    };
    let open = Checkpoint {
        kind: CheckpointKind::Open,
        account: account.clone(),
        asset: Asset::Eth,
        version: Version::new(10),
        block_number: 100,
        side,
        start_magnitude: Fixed6::ZERO,
        collateral: d("100"),
        open_size: d("1"),
        open_notional: d("2"),
        open_price_impact_fees: d("0.002"),
        fees,
        accumulation,
        trigger: None,
    };
    let position = match side {
        PositionSide::Long => PositionTriple::long(d("1")),
        PositionSide::Short => PositionTriple::short(d("1")),
        PositionSide::Maker => PositionTriple::maker(d("1")),
        PositionSide::None => PositionTriple::default(),
    };
    let snapshot = AccountSnapshot {
        account,
        asset: Asset::Eth,
        local: LocalState {
            collateral: d("100"),
            latest_version: Version::new(10),
        },
        position,
        next_position: position,
        pre: PositionTriple::default(),
        pending_positions: vec![],
        versions: vec![],
    };
    let market = market();
    let pnl = reconcile(&ReconcileInput {
        account: &snapshot,
        market: &market,
        checkpoints: &[open],
        latest_accumulation: Some(&accumulation),
        accumulators: &[accumulator(10, "0"), accumulator(20, "0.05")],
        pending_updates: &[],
    })
    .unwrap();
    (pnl, market)
}

#[test]
fn test_overlay_at_settled_price_matches_realtime() {
    let (pnl, market) = settled(PositionSide::Long);
    let live = live_overlay(&pnl, &market, d("2.05"));

    assert_eq!(pnl.realtime, d("0.048"));
    assert_eq!(live.price_delta, Fixed6::ZERO);
    assert_eq!(live.live_delta, Fixed6::ZERO);
    assert_eq!(live.live_pnl, pnl.realtime);
    assert_eq!(live.live_pnl_percent, pnl.realtime_percent);
}

#[test]
fn test_overlay_moves_long_and_short_in_opposite_directions() {
    let (long, market) = settled(PositionSide::Long);
    let live = live_overlay(&long, &market, d("2.15"));
    assert_eq!(live.live_delta, d("0.1"));
    assert_eq!(live.live_pnl, d("0.148"));
    // Denominator is the starting collateral of 100.
    assert_eq!(live.live_pnl_percent, d("0.00148"));

    let (short, market) = settled(PositionSide::Short);
    let live = live_overlay(&short, &market, d("2.15"));
    assert_eq!(live.live_delta, d("-0.1"));
    assert_eq!(live.live_pnl, short.realtime - d("0.1"));
}

#[test]
fn test_overlay_does_not_accumulate() {
    let (pnl, market) = settled(PositionSide::Long);

    let first = live_overlay(&pnl, &market, d("2.30"));
    let second = live_overlay(&pnl, &market, d("2.30"));
    assert_eq!(first, second);

    // A later tick replaces the earlier one rather than stacking on it.
    let back = live_overlay(&pnl, &market, d("2.05"));
    assert_eq!(back.live_pnl, pnl.realtime);
}

#[test]
fn test_maker_overlay_uses_net_exposure() {
    let (pnl, market) = settled(PositionSide::Maker);
    let live = live_overlay(&pnl, &market, d("2.15"));

    // 1 of 100 maker size absorbs 1% of the 20 long skew, so it is short 0.2.
    assert_eq!(live.live_delta, d("-0.02"));
}
