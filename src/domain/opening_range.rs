//! Opening-range breakout tracking.
//!
//! Each tracked symbol moves through `RangePending -> RangeSet -> Signaled`
//! within a session. The range is recorded once from a history window, every
//! bar after that is checked against it, and the first close outside the
//! range emits the symbol's only signal for the session.

use crate::domain::bar::MinuteBar;
use crate::domain::signal::{Direction, Signal};
use crate::ports::market_data_port::MarketDataPort;
use chrono::{Duration, NaiveDateTime};
use std::collections::HashMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct RangeConfig {
    pub range_window: Duration,
}

impl Default for RangeConfig {
    fn default() -> Self {
        RangeConfig {
            range_window: Duration::minutes(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeState {
    RangePending,
    RangeSet,
    Signaled,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpeningRangeRecord {
    pub low: Option<f64>,
    pub high: Option<f64>,
    pub fired: bool,
}

impl OpeningRangeRecord {
    pub fn state(&self) -> RangeState {
        match (self.low, self.high, self.fired) {
            (_, _, true) => RangeState::Signaled,
            (Some(_), Some(_), false) => RangeState::RangeSet,
            _ => RangeState::RangePending,
        }
    }

    fn breakout(&self, close: f64) -> Option<Direction> {
        let (low, high) = (self.low?, self.high?);
        if close > high {
            Some(Direction::Up)
        } else if close < low {
            Some(Direction::Down)
        } else {
            None
        }
    }
}

/// Universe membership delta delivered to the tracker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecurityChanges {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl SecurityChanges {
    pub fn between(previous: &[String], next: &[String]) -> Self {
        SecurityChanges {
            added: next
                .iter()
                .filter(|s| !previous.contains(s))
                .cloned()
                .collect(),
            removed: previous
                .iter()
                .filter(|s| !next.contains(s))
                .cloned()
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone)]
struct TrackedSymbol {
    symbol: String,
    record: OpeningRangeRecord,
}

/// Owns one [`OpeningRangeRecord`] per tracked symbol, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct OpeningRangeTracker {
    config: RangeConfig,
    tracked: Vec<TrackedSymbol>,
}

impl OpeningRangeTracker {
    pub fn new(config: RangeConfig) -> Self {
        Self {
            config,
            tracked: Vec::new(),
        }
    }

    pub fn config(&self) -> &RangeConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.tracked.iter().map(|t| t.symbol.as_str())
    }

    pub fn record(&self, symbol: &str) -> Option<&OpeningRangeRecord> {
        self.tracked
            .iter()
            .find(|t| t.symbol == symbol)
            .map(|t| &t.record)
    }

    /// Start tracking added symbols and forget removed ones. Re-adding a
    /// symbol that is already tracked clears its record in place.
    pub fn on_securities_changed(&mut self, changes: &SecurityChanges) {
        for symbol in &changes.added {
            match self.tracked.iter_mut().find(|t| &t.symbol == symbol) {
                Some(t) => t.record = OpeningRangeRecord::default(),
                None => self.tracked.push(TrackedSymbol {
                    symbol: symbol.clone(),
                    record: OpeningRangeRecord::default(),
                }),
            }
        }
        self.tracked.retain(|t| !changes.removed.contains(&t.symbol));
    }

    /// Record low/high over `[window_end - range_window, window_end)` for every
    /// tracked symbol the data port returns bars for. Returns how many records
    /// received a range. Symbols without bars stay pending; windows are not
    /// checked for completeness.
    pub fn compute_opening_range(
        &mut self,
        data: &dyn MarketDataPort,
        window_end: NaiveDateTime,
    ) -> usize {
        if self.tracked.is_empty() {
            return 0;
        }

        let symbols: Vec<String> = self.tracked.iter().map(|t| t.symbol.clone()).collect();
        let start = window_end - self.config.range_window;
        let history = match data.history(&symbols, start, window_end, false) {
            Ok(h) => h,
            Err(e) => {
                warn!(error = %e, "opening range history unavailable");
                return 0;
            }
        };
        if history.values().all(Vec::is_empty) {
            warn!(%start, %window_end, "opening range history empty");
            return 0;
        }

        let mut recorded = 0;
        for tracked in &mut self.tracked {
            let Some(bars) = history.get(&tracked.symbol).filter(|b| !b.is_empty()) else {
                debug!(symbol = %tracked.symbol, "no bars in opening range window");
                continue;
            };
            let low = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
            let high = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
            tracked.record.low = Some(low);
            tracked.record.high = Some(high);
            recorded += 1;
            info!(symbol = %tracked.symbol, low, high, bars = bars.len(), "opening range set");
        }
        recorded
    }

    /// Check each ranged, unsignaled symbol's bar against its range. Output
    /// follows insertion order; a symbol signals at most once per session.
    pub fn evaluate(&mut self, bars: &HashMap<String, MinuteBar>) -> Vec<Signal> {
        let mut signals = Vec::new();
        for tracked in &mut self.tracked {
            if tracked.record.state() != RangeState::RangeSet {
                continue;
            }
            let Some(bar) = bars.get(&tracked.symbol) else {
                continue;
            };
            let Some(direction) = tracked.record.breakout(bar.close) else {
                continue;
            };

            tracked.record.fired = true;
            info!(symbol = %tracked.symbol, %direction, close = bar.close, "breakout");
            signals.push(Signal {
                symbol: tracked.symbol.clone(),
                direction,
                horizon: self.config.range_window,
                generated_at: bar.time,
                close: bar.close,
            });
        }
        signals
    }

    /// Return every tracked symbol to `RangePending`. Idempotent.
    pub fn reset_session(&mut self) {
        for tracked in &mut self.tracked {
            tracked.record = OpeningRangeRecord::default();
        }
    }
}
