use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::values::Timestamp;

/// A continuous trading session in exchange-local time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradePeriod {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TradePeriod {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Whether a local time falls inside the period. Periods with `end < start`
    /// wrap over midnight.
    pub fn contains(&self, local: NaiveTime) -> bool {
        if self.start <= self.end {
            local >= self.start && local < self.end
        } else {
            local >= self.start || local < self.end
        }
    }
}

/// Exchange reference data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub name: String,
    /// ISO country code, e.g. "CN", "US"
    pub country: String,
    /// Whether quantities that are not lot multiples may be sent
    #[serde(default)]
    pub odd_lot_allowed: bool,
    /// Offset of exchange-local time from UTC, in seconds
    #[serde(default)]
    pub utc_offset_secs: i32,
    /// Continuous trading periods; empty means always tradable
    #[serde(default)]
    pub trade_periods: Vec<TradePeriod>,
}

impl Exchange {
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            odd_lot_allowed: false,
            utc_offset_secs: 0,
            trade_periods: Vec::new(),
        }
    }

    pub fn with_odd_lots(mut self, allowed: bool) -> Self {
        self.odd_lot_allowed = allowed;
        self
    }

    pub fn with_utc_offset(mut self, secs: i32) -> Self {
        self.utc_offset_secs = secs;
        self
    }

    pub fn with_trade_period(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.trade_periods.push(TradePeriod::new(start, end));
        self
    }

    /// Local wall-clock time at the exchange
    pub fn local_time(&self, now: Timestamp) -> NaiveTime {
        (now + Duration::seconds(i64::from(self.utc_offset_secs))).time()
    }

    pub fn is_in_trade_period(&self, now: Timestamp) -> bool {
        if self.trade_periods.is_empty() {
            return true;
        }
        let local = self.local_time(now);
        self.trade_periods.iter().any(|p| p.contains(local))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_empty_periods_always_open() {
        let ex = Exchange::new("SIM", "US");
        assert!(ex.is_in_trade_period(Utc::now()));
    }

    #[test]
    fn test_trade_period_with_offset() {
        // Shanghai morning session, UTC+8
        let ex = Exchange::new("SSE", "CN")
            .with_utc_offset(8 * 3600)
            .with_trade_period(hm(9, 30), hm(11, 30))
            .with_trade_period(hm(13, 0), hm(15, 0));

        let open = Utc.with_ymd_and_hms(2024, 3, 4, 2, 0, 0).unwrap(); // 10:00 local
        let lunch = Utc.with_ymd_and_hms(2024, 3, 4, 4, 0, 0).unwrap(); // 12:00 local
        let afternoon = Utc.with_ymd_and_hms(2024, 3, 4, 6, 59, 59).unwrap(); // 14:59:59

        assert!(ex.is_in_trade_period(open));
        assert!(!ex.is_in_trade_period(lunch));
        assert!(ex.is_in_trade_period(afternoon));
    }

    #[test]
    fn test_overnight_period() {
        let period = TradePeriod::new(hm(21, 0), hm(2, 30));
        assert!(period.contains(hm(23, 0)));
        assert!(period.contains(hm(1, 0)));
        assert!(!period.contains(hm(9, 0)));
    }
}
