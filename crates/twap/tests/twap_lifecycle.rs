//! TWAP lifecycle integration tests
//!
//! Drives a `TwapAlgo` against the paper venue with a simulated clock, the
//! way the runner does, but one callback at a time.

use chrono::{Duration, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempo_clock::{Clock, SimClock};
use tempo_core::{
    ChildOrder, Exchange, MarketSnapshot, ParentOrder, Quantity, Quote, Security, Side,
    SubscriptionId,
};
use tempo_paper::{PaperConfig, PaperVenue};
use tempo_ports::{Instrument, MarketDataError, MarketDataSource};
use tempo_twap::{
    AlgoContext, AlgoError, AlgoState, ParamMap, ParamValue, QuantityCurve, RandomPerturbation,
    TickDecision, TwapAlgo, names, param_map,
};

const SYMBOL: &str = "SIM";

struct Harness {
    clock: Arc<SimClock>,
    venue: Arc<PaperVenue>,
    security: Arc<Security>,
}

impl Harness {
    fn new(security: Security) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let clock = SimClock::new(Utc.with_ymd_and_hms(2024, 5, 6, 14, 0, 0).unwrap());
        let venue = Arc::new(PaperVenue::new(
            clock.clone(),
            PaperConfig {
                fill_on_touch: true,
                sources: Vec::new(),
            },
        ));
        venue.add_security(security.clone());
        Self {
            clock,
            venue,
            security: Arc::new(security),
        }
    }

    fn board_lot() -> Self {
        Self::new(Security::new(
            SYMBOL,
            dec!(0.01),
            dec!(100),
            Exchange::new("SIMX", "US"),
        ))
    }

    fn algo(&self) -> TwapAlgo {
        self.algo_with_id(1)
    }

    fn algo_with_id(&self, id: u64) -> TwapAlgo {
        let ctx = AlgoContext::new(self.clock.clone(), self.venue.clone(), self.venue.clone());
        TwapAlgo::new(id, ctx, RandomPerturbation::seeded(7))
    }

    fn parent(&self, side: Side, quantity: Quantity) -> ParentOrder {
        ParentOrder::new(self.security.clone(), "desk-1", side, quantity)
    }

    fn quote(&self, bid: Decimal, ask: Decimal) {
        self.venue
            .update_quote(
                &self.security.symbol,
                Quote {
                    bid_price: Some(bid),
                    bid_size: dec!(1000),
                    ask_price: Some(ask),
                    ask_size: dec!(1000),
                },
            )
            .unwrap();
    }

    fn trade(&self, price: Decimal, qty: Decimal) {
        self.venue
            .record_trade(&self.security.symbol, price, qty)
            .unwrap();
    }

    fn exposure(&self) -> Quantity {
        self.venue
            .book(&self.security.symbol)
            .unwrap()
            .total_exposure()
    }

    fn deliver_reports(&self, algo: &mut TwapAlgo) {
        for report in self.venue.drain_reports() {
            algo.on_execution(&report);
        }
    }
}

fn horizon(seconds: i64) -> ParamMap {
    param_map([(names::VALID_SECONDS, seconds)])
}

fn with(mut params: ParamMap, name: &str, value: impl Into<ParamValue>) -> ParamMap {
    params.insert(name.to_string(), value.into());
    params
}

fn placed(decision: &TickDecision) -> &ChildOrder {
    match decision {
        TickDecision::Placed(order) => order,
        other => panic!("expected a placed order, got {other:?}"),
    }
}

#[test]
fn test_valid_seconds_lower_bound() {
    let h = Harness::board_lot();

    let mut short = h.algo();
    let err = short
        .start(h.parent(Side::Buy, dec!(1000)), &horizon(59))
        .unwrap_err();
    assert_eq!(err, AlgoError::ShortHorizon { seconds: 59 });
    assert_eq!(err.to_string(), "Too short ValidSeconds, must be >= 60");
    assert_eq!(short.state(), AlgoState::Failed);

    let mut ok = h.algo();
    ok.start(h.parent(Side::Buy, dec!(1000)), &horizon(60))
        .unwrap();
    assert_eq!(ok.state(), AlgoState::Running);
    let span = ok.end_time().unwrap() - ok.start_time().unwrap();
    assert_eq!(span, Duration::seconds(60));
}

#[test]
fn test_missing_valid_seconds_rejected() {
    let h = Harness::board_lot();
    let mut algo = h.algo();
    let err = algo
        .start(h.parent(Side::Buy, dec!(1000)), &ParamMap::new())
        .unwrap_err();
    assert_eq!(err, AlgoError::ShortHorizon { seconds: 0 });
}

#[test]
fn test_unknown_aggression_fails_start() {
    let h = Harness::board_lot();
    let mut algo = h.algo();
    let params = with(horizon(600), names::AGGRESSION, "Extreme");

    let err = algo
        .start(h.parent(Side::Buy, dec!(1000)), &params)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid aggression, must be in (Low, Medium, High, Highest)"
    );
    assert_eq!(algo.state(), AlgoState::Failed);
    assert_eq!(algo.on_timer().decision, TickDecision::Inactive);
}

#[test]
fn test_min_size_required_without_lot_size() {
    let h = Harness::new(Security::new(
        SYMBOL,
        dec!(0.01),
        Decimal::ZERO,
        Exchange::new("OTC", "US"),
    ));

    let mut bare = h.algo();
    let err = bare
        .start(h.parent(Side::Buy, dec!(1000)), &horizon(600))
        .unwrap_err();
    assert_eq!(err, AlgoError::MinSizeRequired);

    let mut sized = h.algo();
    sized
        .start(
            h.parent(Side::Buy, dec!(1000)),
            &with(horizon(600), names::MIN_SIZE, 25),
        )
        .unwrap();
    assert_eq!(sized.params().min_size, Some(dec!(25)));
}

#[test]
fn test_non_positive_quantity_rejected() {
    let h = Harness::board_lot();
    let mut algo = h.algo();
    let err = algo
        .start(h.parent(Side::Buy, Decimal::ZERO), &horizon(600))
        .unwrap_err();
    assert_eq!(err, AlgoError::InvalidQuantity(Decimal::ZERO));
}

#[test]
fn test_unknown_source_fails_subscription() {
    let h = Harness::board_lot();
    let venue = Arc::new(PaperVenue::new(
        h.clock.clone(),
        PaperConfig {
            fill_on_touch: false,
            sources: vec!["primary".to_string()],
        },
    ));
    venue.add_security((*h.security).clone());
    let ctx = AlgoContext::new(h.clock.clone(), venue.clone(), venue);
    let mut algo = TwapAlgo::new(9, ctx, RandomPerturbation::seeded(1));

    let parent = h.parent(Side::Buy, dec!(1000)).with_source("backup");
    let err = algo.start(parent, &horizon(600)).unwrap_err();
    assert_eq!(
        err,
        AlgoError::Subscription(MarketDataError::UnknownSource("backup".to_string()))
    );
}

#[test]
fn test_empty_modify_keeps_parameters() {
    let h = Harness::board_lot();
    let mut algo = h.algo();
    let params = param_map([
        (names::VALID_SECONDS, ParamValue::from(600)),
        (names::PRICE, ParamValue::from(dec!(10.5))),
        (names::MAX_FLOOR, ParamValue::from(500)),
        (names::TILT, ParamValue::from(3)),
    ]);
    algo.start(h.parent(Side::Buy, dec!(10000)), &params)
        .unwrap();
    let before = algo.params().clone();

    algo.modify(&ParamMap::new()).unwrap();
    assert_eq!(algo.params(), &before);
}

#[test]
fn test_on_modify_keeps_running_after_error() {
    let h = Harness::board_lot();
    let mut algo = h.algo();
    algo.start(h.parent(Side::Buy, dec!(10000)), &horizon(600))
        .unwrap();

    algo.on_modify(&param_map([
        (names::PRICE, ParamValue::from(dec!(9.87))),
        (names::AGGRESSION, ParamValue::from("Reckless")),
    ]));
    assert_eq!(algo.state(), AlgoState::Running);
    // applied before the invalid field, no rollback
    assert_eq!(algo.params().price_limit, Some(dec!(9.87)));
}

#[test]
fn test_stop_is_final_and_idempotent() {
    let h = Harness::board_lot();
    let released = Arc::new(AtomicUsize::new(0));
    let source = Arc::new(TrackingSource {
        venue: h.venue.clone(),
        released: released.clone(),
    });
    let ctx = AlgoContext::new(h.clock.clone(), h.venue.clone(), source);
    let mut algo = TwapAlgo::new(3, ctx, RandomPerturbation::seeded(3));
    algo.start(h.parent(Side::Buy, dec!(1000)), &horizon(600))
        .unwrap();

    algo.stop();
    algo.stop();
    assert_eq!(algo.state(), AlgoState::Stopped);
    assert_eq!(released.load(Ordering::SeqCst), 1);

    let err = algo
        .modify(&param_map([(names::PRICE, dec!(10))]))
        .unwrap_err();
    assert_eq!(err, AlgoError::NotRunning(AlgoState::Stopped));

    let outcome = algo.on_timer();
    assert!(!outcome.rearm);
    assert_eq!(outcome.decision, TickDecision::Inactive);
}

#[test]
fn test_restart_rejected() {
    let h = Harness::board_lot();
    let mut algo = h.algo();
    algo.start(h.parent(Side::Buy, dec!(1000)), &horizon(600))
        .unwrap();
    let err = algo
        .start(h.parent(Side::Buy, dec!(1000)), &horizon(600))
        .unwrap_err();
    assert_eq!(err, AlgoError::AlreadyStarted(AlgoState::Running));
}

#[test]
fn test_expires_after_horizon() {
    let h = Harness::board_lot();
    h.quote(dec!(10.00), dec!(10.02));
    let mut algo = h.algo();
    algo.start(h.parent(Side::Buy, dec!(1000)), &horizon(60))
        .unwrap();

    h.clock.advance(Duration::seconds(60));
    assert!(algo.on_timer().rearm);

    h.clock.advance(Duration::seconds(1));
    let outcome = algo.on_timer();
    assert!(!outcome.rearm);
    assert_eq!(outcome.decision, TickDecision::Expired);
    assert_eq!(algo.state(), AlgoState::Stopped);
}

#[test]
fn test_buy_below_bid_is_repriced() {
    let h = Harness::board_lot();
    h.quote(dec!(10.00), dec!(10.02));
    let mut algo = h.algo();
    algo.start(h.parent(Side::Buy, dec!(10000)), &horizon(600))
        .unwrap();

    let first = algo.on_timer();
    let order = placed(&first.decision);
    assert_eq!(order.price, Some(dec!(10.00)));
    assert_eq!(order.quantity, dec!(100));

    // market moves away: the resting bid is now behind
    h.clock.advance(Duration::seconds(1));
    h.quote(dec!(10.01), dec!(10.03));
    assert_eq!(
        algo.on_timer().decision,
        TickDecision::Working { cancelled: 1 }
    );

    h.clock.advance(Duration::seconds(1));
    let replaced = algo.on_timer();
    assert_eq!(placed(&replaced.decision).price, Some(dec!(10.01)));

    // market drops below our price: still competitive, keep it
    h.clock.advance(Duration::seconds(1));
    h.quote(dec!(9.99), dec!(10.03));
    assert_eq!(
        algo.on_timer().decision,
        TickDecision::Working { cancelled: 0 }
    );
    assert_eq!(h.venue.book(SYMBOL).unwrap().active_orders().len(), 1);
}

#[test]
fn test_participation_cap_throttles() {
    let h = Harness::board_lot();
    h.quote(dec!(10.00), dec!(10.02));
    h.trade(dec!(10.01), dec!(5000));
    let mut algo = h.algo();
    let params = param_map([
        (names::VALID_SECONDS, ParamValue::from(600)),
        (names::AGGRESSION, ParamValue::from("Highest")),
        (names::MAX_POV, ParamValue::from(dec!(0.1))),
    ]);
    algo.start(h.parent(Side::Buy, dec!(10000)), &params)
        .unwrap();

    // market order fills at the ask; our own 100 is the only volume since start
    let first = algo.on_timer();
    assert!(placed(&first.decision).price.is_none());
    assert_eq!(h.venue.book(SYMBOL).unwrap().cum_qty(), dec!(100));

    h.clock.advance(Duration::seconds(60));
    assert_eq!(algo.on_timer().decision, TickDecision::Throttled);

    h.trade(dec!(10.01), dec!(2000));
    assert!(matches!(algo.on_timer().decision, TickDecision::Placed(_)));
}

#[test]
fn test_short_sale_not_below_last_trade() {
    let h = Harness::new(Security::new(
        SYMBOL,
        dec!(0.01),
        dec!(100),
        Exchange::new("SSE", "CN"),
    ));
    h.trade(dec!(10.013), dec!(1000));
    h.quote(dec!(10.00), dec!(10.02));
    let mut algo = h.algo();
    let params = with(horizon(600), names::AGGRESSION, "High");
    algo.start(h.parent(Side::Sell, dec!(1000)), &params)
        .unwrap();

    let outcome = algo.on_timer();
    assert_eq!(placed(&outcome.decision).price, Some(dec!(10.01)));
}

#[test]
fn test_skips_outside_trading_period() {
    let exchange = Exchange::new("SIMX", "US").with_trade_period(
        NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        NaiveTime::from_hms_opt(11, 30, 0).unwrap(),
    );
    let h = Harness::new(Security::new(SYMBOL, dec!(0.01), dec!(100), exchange));
    h.quote(dec!(10.00), dec!(10.02));
    let mut algo = h.algo();
    algo.start(h.parent(Side::Buy, dec!(1000)), &horizon(600))
        .unwrap();

    let outcome = algo.on_timer();
    assert!(outcome.rearm);
    assert_eq!(outcome.decision, TickDecision::OutsideTradingPeriod);
}

#[test]
fn test_low_tier_waits_without_prices() {
    let h = Harness::board_lot();
    let mut algo = h.algo();
    algo.start(h.parent(Side::Buy, dec!(1000)), &horizon(600))
        .unwrap();
    assert_eq!(algo.on_timer().decision, TickDecision::NoPrice);
}

#[test]
fn test_internal_cross_at_start() {
    let h = Harness::board_lot();
    h.quote(dec!(10.00), dec!(10.02));
    let mut algo = h.algo();
    let params = param_map([
        (names::VALID_SECONDS, ParamValue::from(600)),
        (names::PRICE, ParamValue::from(dec!(10.01))),
        (names::INTERNAL_CROSS, ParamValue::from("Yes")),
    ]);
    algo.start(h.parent(Side::Buy, dec!(5000)), &params)
        .unwrap();

    let stats = h.venue.book(SYMBOL).unwrap().stats();
    assert_eq!(stats.crossed_qty, dec!(5000));
    assert_eq!(stats.avg_fill_price, Some(dec!(10.01)));

    assert_eq!(algo.on_timer().decision, TickDecision::NothingDue);
    h.deliver_reports(&mut algo);
    assert_eq!(algo.state(), AlgoState::Stopped);
}

#[test]
fn test_end_to_end_follows_curve() {
    let h = Harness::board_lot();
    h.quote(dec!(10.00), dec!(10.02));
    let mut algo = h.algo();
    let params = with(horizon(600), names::MAX_FLOOR, 500);
    let target = dec!(10000);
    algo.start(h.parent(Side::Buy, target), &params).unwrap();
    let start = algo.start_time().unwrap();

    let mut clips = Vec::new();
    let first = algo.on_timer();
    clips.push(placed(&first.decision).quantity);
    h.trade(dec!(10.00), dec!(1000));
    h.deliver_reports(&mut algo);

    // skip ahead half way: the backlog is released in max-floor clips
    h.clock.advance(Duration::seconds(299));
    let halfway = algo.on_timer();
    assert_eq!(placed(&halfway.decision).quantity, dec!(500));

    while algo.state() == AlgoState::Running {
        if let TickDecision::Placed(order) = algo.on_timer().decision {
            clips.push(order.quantity);
        }
        h.trade(dec!(10.00), dec!(1000));
        h.deliver_reports(&mut algo);

        let elapsed = (h.clock.now() - start).num_seconds();
        if elapsed == 450 {
            let expected = QuantityCurve::expected(target, 451.0 / 601.0);
            let exposure = h.exposure();
            assert!(exposure >= expected, "{exposure} behind {expected}");
            assert!(exposure < expected + dec!(100), "{exposure} ahead of {expected}");
        }
        h.clock.advance(Duration::seconds(1));
    }

    assert_eq!(algo.state(), AlgoState::Stopped);
    assert_eq!(h.venue.book(SYMBOL).unwrap().cum_qty(), target);
    assert!(
        clips
            .iter()
            .all(|q| *q > Decimal::ZERO && *q <= dec!(500) && (*q % dec!(100)).is_zero())
    );
}

#[test]
fn test_market_callbacks_do_not_trade() {
    let h = Harness::board_lot();
    let mut algo = h.algo();
    algo.start(h.parent(Side::Buy, dec!(1000)), &horizon(600))
        .unwrap();
    let md = MarketSnapshot::new()
        .with_bbo(dec!(10.00), dec!(10.02))
        .with_last(dec!(10.01), dec!(100));
    algo.on_market_quote(&md);
    algo.on_market_trade(&md);
    assert!(h.venue.book(SYMBOL).unwrap().active_orders().is_empty());
}

#[test]
fn test_instances_on_one_security_are_accounted_separately() {
    let h = Harness::board_lot();
    h.quote(dec!(10.00), dec!(10.02));
    let mut first = h.algo_with_id(1);
    let mut second = h.algo_with_id(2);
    first
        .start(h.parent(Side::Buy, dec!(10000)), &horizon(600))
        .unwrap();
    second
        .start(h.parent(Side::Buy, dec!(10000)), &horizon(600))
        .unwrap();

    placed(&first.on_timer().decision);
    // the first instance's resting bid is not the second's working order
    let order = placed(&second.on_timer().decision).clone();
    assert_eq!(order.price, Some(dec!(10.00)));
    assert_eq!(h.venue.book(SYMBOL).unwrap().active_orders().len(), 2);
    assert_eq!(
        first.on_timer().decision,
        TickDecision::Working { cancelled: 0 }
    );

    let mut taker = h.algo_with_id(3);
    let mut idle = h.algo_with_id(4);
    taker
        .start(
            h.parent(Side::Buy, dec!(100)),
            &with(horizon(60), names::AGGRESSION, "Highest"),
        )
        .unwrap();
    idle.start(h.parent(Side::Buy, dec!(100)), &horizon(600))
        .unwrap();
    placed(&taker.on_timer().decision);

    // every report reaches every instance, but only the taker's fills count
    for report in h.venue.drain_reports() {
        taker.on_execution(&report);
        idle.on_execution(&report);
        first.on_execution(&report);
    }
    assert_eq!(taker.state(), AlgoState::Stopped);
    assert_eq!(idle.state(), AlgoState::Running);
    assert_eq!(first.state(), AlgoState::Running);
    assert_eq!(h.venue.book(SYMBOL).unwrap().cum_qty(), dec!(100));
}

/// Market-data source that counts subscription releases
struct TrackingSource {
    venue: Arc<PaperVenue>,
    released: Arc<AtomicUsize>,
}

struct TrackedInstrument {
    inner: Arc<dyn Instrument>,
    released: Arc<AtomicUsize>,
}

impl MarketDataSource for TrackingSource {
    fn subscribe(
        &self,
        security: &Security,
        source: Option<&str>,
    ) -> Result<Arc<dyn Instrument>, MarketDataError> {
        let inner = self.venue.subscribe(security, source)?;
        Ok(Arc::new(TrackedInstrument {
            inner,
            released: self.released.clone(),
        }))
    }
}

impl Instrument for TrackedInstrument {
    fn id(&self) -> SubscriptionId {
        self.inner.id()
    }

    fn security(&self) -> &Security {
        self.inner.security()
    }

    fn snapshot(&self) -> MarketSnapshot {
        self.inner.snapshot()
    }

    fn cum_qty(&self) -> Quantity {
        self.inner.cum_qty()
    }

    fn cum_cx_qty(&self) -> Quantity {
        self.inner.cum_cx_qty()
    }

    fn total_exposure(&self) -> Quantity {
        self.inner.total_exposure()
    }

    fn active_orders(&self) -> Vec<ChildOrder> {
        self.inner.active_orders()
    }

    fn release(&self) {
        self.released.fetch_add(1, Ordering::SeqCst);
        self.inner.release();
    }
}
