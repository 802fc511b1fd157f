#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
pub use orbtrader::domain::bar::MinuteBar;
use orbtrader::domain::error::OrbError;
use orbtrader::domain::signal::Signal;
use orbtrader::domain::snapshot::{CoarseSnapshot, CompanyProfile, FineSnapshot};
use orbtrader::ports::market_data_port::MarketDataPort;
use orbtrader::ports::signal_port::SignalSink;
use orbtrader::ports::snapshot_port::SnapshotPort;
use std::cell::Cell;
use std::collections::HashMap;

pub struct MockMarketData {
    pub bars: HashMap<String, Vec<MinuteBar>>,
    pub errors: HashMap<String, String>,
    pub history_calls: Cell<usize>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self {
            bars: HashMap::new(),
            errors: HashMap::new(),
            history_calls: Cell::new(0),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<MinuteBar>) -> Self {
        self.bars.entry(symbol.to_string()).or_default().extend(bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl MarketDataPort for MockMarketData {
    fn history(
        &self,
        symbols: &[String],
        start: NaiveDateTime,
        end: NaiveDateTime,
        _extended_hours: bool,
    ) -> Result<HashMap<String, Vec<MinuteBar>>, OrbError> {
        self.history_calls.set(self.history_calls.get() + 1);
        let mut out = HashMap::new();
        for symbol in symbols {
            if let Some(reason) = self.errors.get(symbol) {
                return Err(OrbError::Data {
                    reason: reason.clone(),
                });
            }
            let mut window: Vec<MinuteBar> = self
                .bars
                .get(symbol)
                .map(|bars| {
                    bars.iter()
                        .filter(|b| b.time >= start && b.time < end)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            window.sort_by_key(|b| b.time);
            if !window.is_empty() {
                out.insert(symbol.clone(), window);
            }
        }
        Ok(out)
    }

    fn current_bar(
        &self,
        symbol: &str,
        time: NaiveDateTime,
    ) -> Result<Option<MinuteBar>, OrbError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(OrbError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .bars
            .get(symbol)
            .and_then(|bars| bars.iter().find(|b| b.time == time).cloned()))
    }
}

pub struct MockSnapshots {
    pub coarse: HashMap<NaiveDate, Vec<CoarseSnapshot>>,
    /// Symbol -> market cap; `None` is a profile without a cap.
    pub caps: HashMap<String, Option<f64>>,
    pub fail_fine: bool,
}

impl MockSnapshots {
    pub fn new() -> Self {
        Self {
            coarse: HashMap::new(),
            caps: HashMap::new(),
            fail_fine: false,
        }
    }

    pub fn with_coarse(mut self, date: NaiveDate, rows: Vec<CoarseSnapshot>) -> Self {
        self.coarse.insert(date, rows);
        self
    }

    pub fn with_cap(mut self, symbol: &str, cap: Option<f64>) -> Self {
        self.caps.insert(symbol.to_string(), cap);
        self
    }
}

impl SnapshotPort for MockSnapshots {
    fn coarse(&self, date: NaiveDate) -> Result<Vec<CoarseSnapshot>, OrbError> {
        self.coarse.get(&date).cloned().ok_or(OrbError::Snapshot {
            kind: "coarse".into(),
            date: date.to_string(),
        })
    }

    fn fine(&self, date: NaiveDate, symbols: &[String]) -> Result<Vec<FineSnapshot>, OrbError> {
        if self.fail_fine {
            return Err(OrbError::Snapshot {
                kind: "fine".into(),
                date: date.to_string(),
            });
        }
        Ok(symbols
            .iter()
            .map(|s| FineSnapshot {
                symbol: s.clone(),
                profile: self
                    .caps
                    .get(s)
                    .map(|&market_cap| CompanyProfile { market_cap }),
            })
            .collect())
    }

    fn sessions(&self) -> Result<Vec<NaiveDate>, OrbError> {
        let mut dates: Vec<NaiveDate> = self.coarse.keys().copied().collect();
        dates.sort();
        Ok(dates)
    }
}

/// Rejects every signal.
pub struct FailingSink;

impl SignalSink for FailingSink {
    fn emit(&mut self, _signal: &Signal) -> Result<(), OrbError> {
        Err(OrbError::Sink {
            reason: "disk full".into(),
        })
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(day: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
    day.and_hms_opt(h, m, 0).unwrap()
}

pub fn coarse(symbol: &str, price: f64, adjusted_prior_close: f64) -> CoarseSnapshot {
    CoarseSnapshot {
        symbol: symbol.to_string(),
        price,
        adjusted_prior_close,
    }
}

pub fn make_bar(symbol: &str, time: NaiveDateTime, close: f64, volume: i64) -> MinuteBar {
    MinuteBar {
        symbol: symbol.to_string(),
        time,
        open: close,
        high: close,
        low: close,
        close,
        volume,
    }
}

/// `count` one-minute bars from `start`, all spanning `[low, high]` and
/// closing mid-range. The first bar carries `first_volume`.
pub fn range_bars(
    symbol: &str,
    start: NaiveDateTime,
    count: i64,
    low: f64,
    high: f64,
    first_volume: i64,
) -> Vec<MinuteBar> {
    (0..count)
        .map(|i| MinuteBar {
            symbol: symbol.to_string(),
            time: start + chrono::Duration::minutes(i),
            open: (low + high) / 2.0,
            high,
            low,
            close: (low + high) / 2.0,
            volume: if i == 0 { first_volume } else { 10_000 },
        })
        .collect()
}
