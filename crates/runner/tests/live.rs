//! Live session tests
//!
//! Tokio time is paused, so dispatcher timers and the market feed advance as
//! soon as the runtime is idle. The algorithms read the system clock, so
//! horizons here never elapse on their own; sessions end on fills or on the
//! session time limit.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Duration;
use tempo_core::{Exchange, Security, Side};
use tempo_runner::{BacktestConfig, LiveSession, RandomWalkConfig, RunnerError, SessionConfig};
use tempo_twap::{AlgoError, AlgoState, ParamValue, names, param_map};

fn session() -> SessionConfig {
    let _ = env_logger::builder().is_test(true).try_init();
    SessionConfig {
        tick_interval_ms: 1000,
        seed: Some(3),
        backtests: Vec::new(),
    }
}

/// Flat market with no prints
fn still_market() -> RandomWalkConfig {
    let mut market = RandomWalkConfig::new(dec!(10.00));
    market.volatility_ticks = 0;
    market.trade_probability = 0.0;
    market
}

fn order(name: &str, quantity: Decimal, valid_seconds: i64, aggression: &str) -> BacktestConfig {
    let security = Security::new("SIM", dec!(0.01), dec!(100), Exchange::new("SIMX", "US"));
    BacktestConfig::new(name, security, Side::Buy, quantity, still_market()).with_params(
        param_map([
            (names::VALID_SECONDS, ParamValue::from(valid_seconds)),
            (names::AGGRESSION, ParamValue::from(aggression)),
        ]),
    )
}

#[tokio::test(start_paused = true)]
async fn test_orders_on_one_security_complete_independently() {
    let orders = vec![
        order("first", dec!(100), 60, "Highest"),
        order("second", dec!(100), 60, "Highest"),
    ];
    let report = LiveSession::new(&session(), orders)
        .with_max_duration(Duration::from_secs(120))
        .run()
        .await
        .unwrap();

    assert_eq!(report.instances.len(), 2);
    assert_ne!(report.instances[0].id, report.instances[1].id);
    for outcome in &report.instances {
        assert_eq!(outcome.final_state, AlgoState::Stopped, "{}", outcome.name);
        assert_eq!(outcome.symbol, "SIM");
    }
    // each instance filled its own target, neither stopped on the other's fills
    let stats = &report.books["SIM"];
    assert_eq!(stats.filled_qty, dec!(200));
    assert_eq!(stats.placed, 2);
}

#[tokio::test(start_paused = true)]
async fn test_session_time_limit_stops_instances() {
    let orders = vec![order("passive", dec!(1000), 600, "Low")];
    let report = LiveSession::new(&session(), orders)
        .with_max_duration(Duration::from_secs(5))
        .run()
        .await
        .unwrap();

    assert_eq!(report.instances[0].final_state, AlgoState::Stopped);
    let stats = &report.books["SIM"];
    assert_eq!(stats.filled_qty, Decimal::ZERO);
    // the passive clip was still resting when the session ended
    assert_eq!(stats.placed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_start_rejection_aborts_session() {
    let orders = vec![
        order("ok", dec!(1000), 600, "Low"),
        order("short", dec!(1000), 30, "Low"),
    ];
    let result = LiveSession::new(&session(), orders).run().await;
    assert!(matches!(
        result,
        Err(RunnerError::Algo(AlgoError::ShortHorizon { seconds: 30 }))
    ));
}
