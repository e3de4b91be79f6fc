use pnl_reconciler::domain::{
    AccountAccumulation, AccountSnapshot, AccumulatedValues, Checkpoint, CheckpointKind,
    FeeTotals, GlobalAccumulator, GlobalState, LocalState, MarketParameter, MarketSnapshot,
    PositionTriple, RiskParameter, UpdateEvent,
};
use pnl_reconciler::engine::WindowKind;
use pnl_reconciler::{
    reconcile, Address, Asset, EngineError, Fixed6, IntegrityViolation, PositionPnl,
    PositionSide, ReconcileInput, Version,
};

fn d(s: &str) -> Fixed6 {
    Fixed6::from_decimal_string(s).unwrap()
}

fn addr() -> Address {
    Address::new("0xa11ce".to_string())
}

fn triple(side: PositionSide, size: &str) -> PositionTriple {
    match side {
        PositionSide::Maker => PositionTriple::maker(d(size)),
        PositionSide::Long => PositionTriple::long(d(size)),
        PositionSide::Short => PositionTriple::short(d(size)),
        PositionSide::None => PositionTriple::default(),
    }
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
        parameter: MarketParameter {
            settlement_fee: Fixed6::ZERO,
            oracle_granularity: 1,
            closed: false,
        },
    }
}

fn account(position: PositionTriple, collateral: &str, version: u64) -> AccountSnapshot {
    AccountSnapshot {
        account: addr(),
        asset: Asset::Eth,
        local: LocalState {
            collateral: d(collateral),
            latest_version: Version::new(version),
        },
        position,
        next_position: position,
        pre: PositionTriple::default(),
        pending_positions: vec![],
        versions: vec![],
    }
}

fn accumulator(version: u64, long_value: &str) -> GlobalAccumulator {
    let long = AccumulatedValues {
        value: d(long_value),
        pnl: d(long_value),
        ..AccumulatedValues::default()
    };
    GlobalAccumulator {
        asset: Asset::Eth,
        version: Version::new(version),
        maker: long,
        long,
        short: AccumulatedValues::default(),
    }
}

/// An open checkpoint with collateral 100 whose own fees are the price impact.
fn open_checkpoint(side: PositionSide, version: u64, size: &str, notional: &str, impact: &str) -> Checkpoint {
    let fees = FeeTotals {
        price_impact: d(impact),
        ..FeeTotals::default()
    };
    Checkpoint {
        kind: CheckpointKind::Open,
        account: addr(),
        asset: Asset::Eth,
        version: Version::new(version),
        block_number: version * 10,
        side,
        start_magnitude: Fixed6::ZERO,
        collateral: d("100"),
        open_size: d(size),
        open_notional: d(notional),
        open_price_impact_fees: d(impact),
        fees,
        accumulation: AccountAccumulation {
            version: Version::new(version),
            magnitude: d(size),
            net_deposits: Fixed6::ZERO,
            open_size: d(size),
            open_notional: d(notional),
            open_price_impact_fees: d(impact),
            accumulated: AccumulatedValues::default(),
            fees,
        },
        trigger: None,
    }
}

fn update(version: u64, long: &str, price: &str) -> UpdateEvent {
    UpdateEvent {
        version: Version::new(version),
        account: addr(),
        asset: Asset::Eth,
        new_maker: Fixed6::ZERO,
        new_long: d(long),
        new_short: Fixed6::ZERO,
        collateral: Fixed6::ZERO,
        price: d(price),
        price_impact_fee: Fixed6::ZERO,
        position_fee: Fixed6::ZERO,
        keeper_fee: Fixed6::ZERO,
        interface_fee: Fixed6::ZERO,
        order_fee: Fixed6::ZERO,
        protect: false,
        valid: true,
    }
}

struct Inputs {
    account: AccountSnapshot,
    market: MarketSnapshot,
    checkpoints: Vec<Checkpoint>,
    latest: Option<AccountAccumulation>,
    accumulators: Vec<GlobalAccumulator>,
    updates: Vec<UpdateEvent>,
}

impl Inputs {
    fn run(&self) -> Result<PositionPnl, EngineError> {
        reconcile(&ReconcileInput {
            account: &self.account,
            market: &self.market,
            checkpoints: &self.checkpoints,
            latest_accumulation: self.latest.as_ref(),
            accumulators: &self.accumulators,
            pending_updates: &self.updates,
        })
    }
}

/// Size 1.0 opened at 2.0 with 0.002 price impact; the long and maker accumulators move
/// 0.05 after the checkpoint.
fn opened(side: PositionSide) -> Inputs {
    let open = open_checkpoint(side, 10, "1", "2", "0.002");
    Inputs {
        account: account(triple(side, "1"), "100", 10),
        market: market(),
        latest: Some(open.accumulation),
        checkpoints: vec![open],
        accumulators: vec![accumulator(10, "0"), accumulator(20, "0.05")],
        updates: vec![],
    }
}

#[test]
fn test_concrete_open_long_scenario() {
    let pnl = opened(PositionSide::Long).run().unwrap();

    assert_eq!(pnl.window, WindowKind::Open);
    assert_eq!(pnl.average_entry_price, Fixed6::from_raw(2_002_000));
    assert_eq!(pnl.unrealized.value, Fixed6::from_raw(50_000));
    assert_eq!(pnl.unrealized.pnl, Fixed6::from_raw(50_000));
    assert_eq!(pnl.realized, AccumulatedValues::default());
    assert_eq!(pnl.fees.price_impact, Fixed6::from_raw(2_000));
    assert_eq!(pnl.pnl, Fixed6::from_raw(48_000));
    assert_eq!(pnl.start_collateral, d("100"));
    assert_eq!(pnl.end_version, Version::new(10));
}

#[test]
fn test_maker_keeps_price_impact_in_pnl() {
    let long = opened(PositionSide::Long).run().unwrap();
    let maker = opened(PositionSide::Maker).run().unwrap();

    assert_eq!(maker.unrealized, long.unrealized);
    assert_eq!(maker.pnl, maker.unrealized.pnl);
    assert_eq!(long.pnl, maker.pnl - d("0.002"));
    assert_eq!(long.value, maker.value - d("0.002"));
    assert_eq!(maker.average_entry_price, d("2"));
}

#[test]
fn test_short_entry_subtracts_price_impact() {
    let mut inputs = opened(PositionSide::Short);
    let pnl = inputs.run().unwrap();
    assert_eq!(pnl.average_entry_price, d("1.998"));
    // Short accumulator did not move.
    assert_eq!(pnl.unrealized.value, Fixed6::ZERO);
}

#[test]
fn test_unrealized_window_starts_at_realized_end_with_settled_size() {
    let mut inputs = opened(PositionSide::Long);
    inputs.account = account(PositionTriple::long(d("2")), "100", 15);
    inputs.account.next_position = PositionTriple::long(d("5"));
    inputs.accumulators = vec![
        accumulator(5, "0"),
        accumulator(10, "0.01"),
        accumulator(15, "0.03"),
        accumulator(20, "0.06"),
    ];

    let pnl = inputs.run().unwrap();
    // (0.06 - 0.01) * 2: anchored at version 10, not at the account's version 15,
    // and scaled by the settled size, not the pending one.
    assert_eq!(pnl.unrealized.value, d("0.1"));
    assert_eq!(pnl.end_version, Version::new(10));
}

#[test]
fn test_new_position_anchors_at_account_version() {
    let inputs = Inputs {
        account: account(PositionTriple::long(d("2")), "50", 15),
        market: market(),
        checkpoints: vec![],
        latest: None,
        accumulators: vec![
            accumulator(10, "0.01"),
            accumulator(15, "0.03"),
            accumulator(20, "0.06"),
        ],
        updates: vec![],
    };
    let pnl = inputs.run().unwrap();
    assert_eq!(pnl.window, WindowKind::New);
    assert_eq!(pnl.start_collateral, d("50"));
    assert_eq!(pnl.realized, AccumulatedValues::default());
    assert_eq!(pnl.unrealized.value, d("0.06"));
}

fn fresh_long(collateral: &str) -> PositionPnl {
    Inputs {
        account: account(PositionTriple::long(d("1")), collateral, 10),
        market: market(),
        checkpoints: vec![],
        latest: None,
        accumulators: vec![accumulator(10, "0"), accumulator(20, "0.05")],
        updates: vec![],
    }
    .run()
    .unwrap()
}

#[test]
fn test_small_collateral_percent_uses_unit_denominator() {
    for collateral in ["0", "0.5"] {
        let pnl = fresh_long(collateral);
        assert_eq!(pnl.realtime, d("0.05"));
        assert_eq!(pnl.realtime_percent_denominator, Fixed6::ONE);
        assert_eq!(pnl.realtime_percent, d("0.05"));
    }

    let pnl = fresh_long("4");
    assert_eq!(pnl.realtime_percent_denominator, d("4"));
    assert_eq!(pnl.realtime_percent, d("0.0125"));
}

#[test]
fn test_pending_tail_extends_entry_and_fees() {
    let mut inputs = opened(PositionSide::Long);
    let mut increase = update(25, "2", "3");
    increase.price_impact_fee = d("0.003");
    increase.keeper_fee = d("0.1");
    increase.interface_fee = d("0.05");
    let mut rejected = update(26, "4", "9");
    rejected.valid = false;
    rejected.keeper_fee = d("7");
    let indexed = update(5, "9", "9");
    // Newest first, as paged.
    inputs.updates = vec![rejected, increase, indexed];

    let pnl = inputs.run().unwrap();
    // (2 + 3 + 0.002 + 0.003) / 2
    assert_eq!(pnl.average_entry_price, d("2.5025"));
    assert_eq!(pnl.fees.keeper, d("0.1"));
    assert_eq!(pnl.fees.interface, d("0.05"));
    assert_eq!(pnl.fees.price_impact, d("0.005"));
}

#[test]
fn test_indexed_fees_are_not_double_counted() {
    let mut inputs = opened(PositionSide::Long);
    let open = &inputs.checkpoints[0];
    let mut latest = open.accumulation;
    latest.version = Version::new(18);
    latest.fees.keeper = d("0.4");
    latest.fees.price_impact = d("0.012");
    inputs.latest = Some(latest);
    inputs.accumulators = vec![accumulator(10, "0"), accumulator(18, "0"), accumulator(20, "0.05")];
    // Already folded into the accumulation at version 18.
    let mut folded = update(18, "1", "2");
    folded.keeper_fee = d("0.4");
    inputs.updates = vec![folded];

    let pnl = inputs.run().unwrap();
    // Own fees 0.002 + delta (0.012 - 0.002).
    assert_eq!(pnl.fees.price_impact, d("0.012"));
    assert_eq!(pnl.fees.keeper, d("0.4"));
    assert_eq!(pnl.end_version, Version::new(18));
}

fn closed_long(protect: bool) -> Inputs {
    let mut open = open_checkpoint(PositionSide::Long, 10, "2", "200", "0.2");
    open.fees = FeeTotals {
        keeper: d("0.5"),
        position: d("0.3"),
        price_impact: d("0.2"),
        interface: d("0.1"),
        order: Fixed6::ZERO,
    };
    open.accumulation.fees = open.fees;

    let close_fees = FeeTotals {
        keeper: d("0.5"),
        position: d("0.3"),
        price_impact: d("0.1"),
        interface: d("0.1"),
        order: d("0.05"),
    };
    let mut trigger = update(30, "0", "2.1");
    trigger.protect = protect;
    trigger.collateral = d("-110.85");

    let close = Checkpoint {
        kind: CheckpointKind::Close,
        version: Version::new(30),
        block_number: 300,
        start_magnitude: d("2"),
        collateral: d("110.85"),
        open_size: Fixed6::ZERO,
        open_notional: Fixed6::ZERO,
        open_price_impact_fees: Fixed6::ZERO,
        fees: close_fees,
        accumulation: AccountAccumulation {
            version: Version::new(30),
            magnitude: Fixed6::ZERO,
            accumulated: AccumulatedValues {
                value: d("13"),
                pnl: d("10"),
                funding: d("2"),
                interest: d("1"),
                position_fee: Fixed6::ZERO,
            },
            fees: open.fees + close_fees,
            ..open.accumulation
        },
        trigger: Some(trigger),
        ..open.clone()
    };

    Inputs {
        account: account(PositionTriple::default(), "110.85", 30),
        market: market(),
        latest: Some(close.accumulation),
        checkpoints: vec![close, open],
        accumulators: vec![accumulator(10, "0"), accumulator(30, "5")],
        updates: vec![],
    }
}

#[test]
fn test_closed_window_conserves_collateral() {
    let inputs = closed_long(false);
    let pnl = inputs.run().unwrap();

    assert_eq!(pnl.window, WindowKind::Closed);
    assert_eq!(pnl.side, PositionSide::Long);
    let collateral_change = inputs.account.local.collateral - pnl.start_collateral;
    assert_eq!(
        pnl.realized.pnl + pnl.realized.funding + pnl.realized.interest - pnl.fees.total(),
        collateral_change
    );
    assert_eq!(pnl.realtime, collateral_change);
    assert_eq!(pnl.unrealized, AccumulatedValues::default());
    assert_eq!(pnl.average_entry_price, d("100.1"));
    assert!(!pnl.liquidation);

    // 10.85 / (100 + 0.2 + 0.05)
    assert_eq!(pnl.realtime_percent_denominator, d("100.25"));
    assert_eq!(pnl.realtime_percent, d("0.108229"));
}

#[test]
fn test_liquidation_from_protected_close() {
    let pnl = closed_long(true).run().unwrap();
    assert!(pnl.liquidation);
    assert_eq!(pnl.liquidation_fee, d("110.85"));
}

#[test]
fn test_position_newer_than_history_is_new() {
    let mut inputs = closed_long(false);
    inputs.account = account(PositionTriple::long(d("1")), "80", 40);
    let pnl = inputs.run().unwrap();
    assert_eq!(pnl.window, WindowKind::New);
    assert_eq!(pnl.start_collateral, d("80"));
    assert_eq!(pnl.realized, AccumulatedValues::default());
}

#[test]
fn test_accumulator_regression_is_an_error() {
    let mut inputs = opened(PositionSide::Long);
    inputs.accumulators = vec![accumulator(20, "0.05"), accumulator(10, "0")];
    assert_eq!(
        inputs.run(),
        Err(EngineError::DataIntegrity(
            IntegrityViolation::AccumulatorRegression {
                earlier: Version::new(20),
                later: Version::new(10),
            }
        ))
    );
}

#[test]
fn test_missing_anchor_accumulator_is_an_error() {
    let mut inputs = opened(PositionSide::Long);
    inputs.accumulators = vec![accumulator(12, "0"), accumulator(20, "0.05")];
    assert_eq!(
        inputs.run(),
        Err(EngineError::DataIntegrity(IntegrityViolation::MissingAccumulator(
            Version::new(10)
        )))
    );
}

#[test]
fn test_fee_total_regression_is_an_error() {
    let mut inputs = opened(PositionSide::Long);
    let mut latest = inputs.checkpoints[0].accumulation;
    latest.version = Version::new(15);
    latest.fees.price_impact = d("0.001");
    inputs.latest = Some(latest);

    match inputs.run() {
        Err(EngineError::DataIntegrity(IntegrityViolation::CumulativeRegression { field, .. })) => {
            assert_eq!(field, "priceImpactFees")
        }
        other => panic!("Expected CumulativeRegression, got {:?}", other),
    }
}

#[test]
fn test_accumulation_before_checkpoint_is_an_error() {
    let mut inputs = opened(PositionSide::Long);
    let mut latest = inputs.checkpoints[0].accumulation;
    latest.version = Version::new(8);
    inputs.latest = Some(latest);
    assert!(matches!(
        inputs.run(),
        Err(EngineError::DataIntegrity(
            IntegrityViolation::AccumulationBeforeCheckpoint { .. }
        ))
    ));
}

#[test]
fn test_unpaired_open_is_an_error() {
    let mut inputs = opened(PositionSide::Long);
    inputs
        .checkpoints
        .push(open_checkpoint(PositionSide::Long, 5, "1", "2", "0"));
    assert!(matches!(
        inputs.run(),
        Err(EngineError::DataIntegrity(IntegrityViolation::UnpairedOpen { .. }))
    ));
}

#[test]
fn test_multi_sided_position_is_an_error() {
    let mut inputs = opened(PositionSide::Long);
    inputs.account.position = PositionTriple::new(d("1"), d("1"), Fixed6::ZERO);
    assert!(matches!(
        inputs.run(),
        Err(EngineError::DataIntegrity(IntegrityViolation::MultipleSides { .. }))
    ));
}

#[test]
fn test_reconcile_is_deterministic() {
    let inputs = closed_long(true);
    assert_eq!(inputs.run(), inputs.run());
}
