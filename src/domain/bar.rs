//! Intraday price bar representation.

use chrono::{Duration, NaiveDateTime};

/// One minute of trading for a single symbol. `time` is the bar open,
/// exchange-local.
#[derive(Debug, Clone, PartialEq)]
pub struct MinuteBar {
    pub symbol: String,
    pub time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl MinuteBar {
    pub fn end_time(&self) -> NaiveDateTime {
        self.time + Duration::minutes(1)
    }
}
