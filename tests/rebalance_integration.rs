//! Rebalance Pipeline Integration Tests
//!
//! End-to-end verification of the spread -> signal -> sizing -> emission
//! pipeline over scripted and generated market data:
//! 1. The EWA/EWC worked example, checked to fill precision
//! 2. Abort paths emit nothing through the order gateway
//! 3. Repeated cycles against the paper market converge on the target
//!
//! All tests are deterministic; no network, no clock dependence beyond
//! the scripted timestamps.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use cointrader::adapters::{PaperBroker, PaperMarket};
use cointrader::domain::{combine, compute_signal, size, WeightSet};
use cointrader::engine::{CycleOutcome, CyclePorts, RebalanceCycle, SkipReason};
use cointrader::ports::mocks::{RecordingBroker, ScriptedMarketData};
use cointrader::ports::{Bar, InstrumentId, Resolution};

// ============================================================================
// Test Fixtures
// ============================================================================

fn ts(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2013, 10, day, 0, 0, 0).unwrap()
}

fn bars(closes: &[(u32, Decimal)]) -> Vec<Bar> {
    closes.iter().map(|&(d, c)| Bar::new(ts(d), c)).collect()
}

fn ewa_ewc() -> WeightSet {
    WeightSet::new(vec![
        ("EWA".into(), dec!(1.198)),
        ("EWC".into(), dec!(-0.911)),
    ])
    .unwrap()
}

/// The worked EWA/EWC example: three aligned days plus a live snapshot
fn worked_example_market() -> ScriptedMarketData {
    ScriptedMarketData::new()
        .with_bars("EWA", bars(&[(7, dec!(10)), (8, dec!(11)), (9, dec!(12))]))
        .with_bars("EWC", bars(&[(7, dec!(20)), (8, dec!(19)), (9, dec!(18))]))
        .with_close("EWA", dec!(13))
        .with_close("EWC", dec!(17))
}

fn cycle_over(
    market: Arc<ScriptedMarketData>,
    broker: Arc<RecordingBroker>,
    unit_size: Decimal,
) -> RebalanceCycle {
    RebalanceCycle::new(
        ewa_ewc(),
        Duration::days(28),
        Resolution::Daily,
        unit_size,
        CyclePorts {
            history: market.clone(),
            feed: market.clone(),
            calendar: market,
            holdings: broker.clone(),
            gateway: broker,
        },
    )
}

// ============================================================================
// Worked example
// ============================================================================

#[tokio::test]
async fn test_worked_example_end_to_end() {
    let market = Arc::new(worked_example_market());
    let broker = Arc::new(RecordingBroker::new());
    let cycle = cycle_over(market, broker.clone(), dec!(1000));

    let outcome = cycle.run(ts(10)).await.unwrap();
    let (signal, orders) = match outcome {
        CycleOutcome::Rebalanced { signal, orders } => (signal, orders),
        other => panic!("expected rebalance, got {other:?}"),
    };

    // Combined series [-6.24, -4.131, -2.022]: mean -4.131, population
    // std 2.109 * sqrt(2/3); live spread 1.198*13 - 0.911*17 = 0.087.
    // The symmetric deviations make the z-score exactly sqrt(6).
    assert_eq!(signal.mean, dec!(-4.131));
    let z = signal.z_score.to_f64().unwrap();
    assert!((z - 6.0f64.sqrt()).abs() < 1e-9, "z = {z}");

    // Targets: 1000 * -z * weight; flat holdings make deltas equal targets
    let expected_ewa = -1000.0 * z * 1.198;
    let expected_ewc = -1000.0 * z * -0.911;
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].instrument, InstrumentId::new("EWA"));
    assert!((orders[0].quantity.to_f64().unwrap() - expected_ewa).abs() < 1e-6);
    assert_eq!(orders[1].instrument, InstrumentId::new("EWC"));
    assert!((orders[1].quantity.to_f64().unwrap() - expected_ewc).abs() < 1e-6);

    // Short EWA around -2934, long EWC around 2231
    assert!(orders[0].quantity < dec!(-2934) && orders[0].quantity > dec!(-2935));
    assert!(orders[1].quantity > dec!(2231) && orders[1].quantity < dec!(2232));

    // Orders reached the gateway after the per-instrument cancellations
    assert_eq!(
        broker.cancelled(),
        vec![InstrumentId::new("EWA"), InstrumentId::new("EWC")]
    );
    assert_eq!(broker.submitted().len(), 2);
}

#[tokio::test]
async fn test_worked_example_with_existing_holdings() {
    let market = Arc::new(worked_example_market());
    let broker = Arc::new(
        RecordingBroker::new()
            .with_holding("EWA", dec!(-1000))
            .with_holding("EWC", dec!(1000)),
    );
    let cycle = cycle_over(market, broker.clone(), dec!(1000));

    let outcome = cycle.run(ts(10)).await.unwrap();
    let orders = match outcome {
        CycleOutcome::Rebalanced { orders, .. } => orders,
        other => panic!("expected rebalance, got {other:?}"),
    };

    // delta = target - holding: EWA ~ -2934 - (-1000), EWC ~ 2231 - 1000
    assert!(orders[0].quantity < dec!(-1934) && orders[0].quantity > dec!(-1935));
    assert!(orders[1].quantity > dec!(1231) && orders[1].quantity < dec!(1232));
}

// ============================================================================
// Abort paths
// ============================================================================

#[tokio::test]
async fn test_degenerate_window_emits_nothing() {
    // Zero and one-bar windows both abort before any computation
    for day_counts in [&[][..], &[(9u32, dec!(12))][..]] {
        let ewc: Vec<(u32, Decimal)> = day_counts.iter().map(|&(d, _)| (d, dec!(18))).collect();
        let market = Arc::new(
            ScriptedMarketData::new()
                .with_bars("EWA", bars(day_counts))
                .with_bars("EWC", bars(&ewc))
                .with_close("EWA", dec!(13))
                .with_close("EWC", dec!(17)),
        );
        let broker = Arc::new(RecordingBroker::new());
        let cycle = cycle_over(market, broker.clone(), dec!(1000));

        let outcome = cycle.run(ts(10)).await.unwrap();
        assert_eq!(
            outcome,
            CycleOutcome::Skipped(SkipReason::WindowTooShort(day_counts.len()))
        );
        assert!(broker.submitted().is_empty());
    }
}

#[tokio::test]
async fn test_misalignment_aborts_whole_cycle() {
    // Instrument B's bucket 3 timestamp differs from A's; buckets 0-2 are
    // aligned but must not be used for a partial computation.
    let market = Arc::new(
        ScriptedMarketData::new()
            .with_bars(
                "EWA",
                bars(&[(6, dec!(9)), (7, dec!(10)), (8, dec!(11)), (9, dec!(12))]),
            )
            .with_bars(
                "EWC",
                bars(&[(6, dec!(21)), (7, dec!(20)), (8, dec!(19)), (10, dec!(18))]),
            )
            .with_close("EWA", dec!(13))
            .with_close("EWC", dec!(17)),
    );
    let broker = Arc::new(RecordingBroker::new());
    let cycle = cycle_over(market, broker.clone(), dec!(1000));

    let outcome = cycle.run(ts(11)).await.unwrap();
    assert_eq!(
        outcome,
        CycleOutcome::Skipped(SkipReason::TimestampMisalignment {
            bucket: 3,
            instrument: "EWC".into(),
        })
    );
    assert!(broker.submitted().is_empty());
}

#[tokio::test]
async fn test_closed_market_defers_everything() {
    let market = Arc::new(worked_example_market().with_market_closed());
    let broker = Arc::new(RecordingBroker::new());
    let cycle = cycle_over(market.clone(), broker.clone(), dec!(1000));

    let outcome = cycle.run(ts(10)).await.unwrap();
    assert!(matches!(
        outcome,
        CycleOutcome::Skipped(SkipReason::MarketClosed(_))
    ));
    assert!(broker.cancelled().is_empty());
    assert!(broker.submitted().is_empty());
    assert!(market.history_calls().is_empty());
}

// ============================================================================
// Domain pipeline without the engine
// ============================================================================

#[tokio::test]
async fn test_pipeline_matches_manual_computation() {
    let weights = ewa_ewc();
    let series = vec![dec!(-6.24), dec!(-4.131), dec!(-2.022)];

    let live: HashMap<InstrumentId, Decimal> =
        [("EWA".into(), dec!(13)), ("EWC".into(), dec!(17))]
            .into_iter()
            .collect();
    let current = combine(&live, &weights).unwrap();
    assert_eq!(current, dec!(0.087));

    let signal = compute_signal(&series, current).unwrap();
    let flat: HashMap<InstrumentId, Decimal> =
        [("EWA".into(), Decimal::ZERO), ("EWC".into(), Decimal::ZERO)]
            .into_iter()
            .collect();
    let deltas = size(signal.z_score, &weights, dec!(1000), &flat).unwrap();

    // Flipping the z-score flips every delta
    let flipped = size(-signal.z_score, &weights, dec!(1000), &flat).unwrap();
    for (d, f) in deltas.iter().zip(&flipped) {
        assert_eq!(d.quantity, -f.quantity);
    }
}

// ============================================================================
// Paper market round trips
// ============================================================================

#[tokio::test]
async fn test_paper_market_cycle_rebalances() {
    let weights = ewa_ewc();
    let market = Arc::new(PaperMarket::generate(&weights, 28, 7));
    let broker = Arc::new(PaperBroker::new(dec!(10000), market.clone()));
    let cycle = RebalanceCycle::new(
        weights,
        Duration::days(28),
        Resolution::Daily,
        dec!(1000),
        CyclePorts {
            history: market.clone(),
            feed: market.clone(),
            calendar: market,
            holdings: broker.clone(),
            gateway: broker.clone(),
        },
    );

    let outcome = cycle.run(Utc::now()).await.unwrap();
    match outcome {
        CycleOutcome::Rebalanced { signal, orders } => {
            assert!(signal.std_dev > Decimal::ZERO);
            // Fills mirror the emitted orders one to one
            assert_eq!(broker.fills().len(), orders.len());
            for order in &orders {
                assert_eq!(broker.holding(&order.instrument), order.quantity);
            }
        }
        // A seeded spread sitting exactly on its mean would emit nothing,
        // but seed 7 deviates; treat a skip as a failure to catch drift.
        other => panic!("expected rebalance, got {other:?}"),
    }
}

#[tokio::test]
async fn test_second_cycle_converges_to_target() {
    // Prices do not move between cycles, so the second pass computes the
    // same targets and finds the holdings already there: no new orders.
    let weights = ewa_ewc();
    let market = Arc::new(PaperMarket::generate(&weights, 28, 7));
    let broker = Arc::new(PaperBroker::new(dec!(10000), market.clone()));
    let cycle = RebalanceCycle::new(
        weights,
        Duration::days(28),
        Resolution::Daily,
        dec!(1000),
        CyclePorts {
            history: market.clone(),
            feed: market.clone(),
            calendar: market,
            holdings: broker.clone(),
            gateway: broker.clone(),
        },
    );

    let first = cycle.run(Utc::now()).await.unwrap();
    let first_orders = match first {
        CycleOutcome::Rebalanced { orders, .. } => orders,
        other => panic!("expected rebalance, got {other:?}"),
    };
    assert!(!first_orders.is_empty());

    let second = cycle.run(Utc::now()).await.unwrap();
    match second {
        CycleOutcome::Rebalanced { orders, .. } => assert!(orders.is_empty()),
        other => panic!("expected rebalance, got {other:?}"),
    }
    assert_eq!(broker.fills().len(), first_orders.len());
}
