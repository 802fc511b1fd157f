//! Single-session replay driver.
//!
//! Plays the platform's role for one trading day: reset, universe ticks up to
//! the freeze cutoff, opening-range capture, then per-minute evaluation until
//! the close. Calls into the selector and tracker never overlap.

use crate::domain::bar::MinuteBar;
use crate::domain::error::OrbError;
use crate::domain::opening_range::{OpeningRangeTracker, SecurityChanges};
use crate::domain::signal::Signal;
use crate::domain::snapshot::CoarseSnapshot;
use crate::domain::universe::UniverseSelector;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::signal_port::SignalSink;
use crate::ports::snapshot_port::SnapshotPort;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSchedule {
    /// Wall-clock reset time for a live host. `Session::run_day` replays a
    /// whole day and always resets at its start, whatever this is set to.
    pub reset_at: NaiveTime,
    pub scan_start: NaiveTime,
    pub record_range_at: NaiveTime,
    pub session_close: NaiveTime,
}

impl Default for SessionSchedule {
    fn default() -> Self {
        SessionSchedule {
            reset_at: NaiveTime::from_hms_opt(0, 1, 0).unwrap_or_default(),
            scan_start: NaiveTime::from_hms_opt(9, 31, 0).unwrap_or_default(),
            record_range_at: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default(),
            session_close: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub date: NaiveDate,
    pub universe: Vec<String>,
    pub ranges_set: usize,
    pub signals: Vec<Signal>,
}

pub struct Session {
    pub selector: UniverseSelector,
    pub tracker: OpeningRangeTracker,
    pub schedule: SessionSchedule,
}

impl Session {
    pub fn new(
        selector: UniverseSelector,
        tracker: OpeningRangeTracker,
        schedule: SessionSchedule,
    ) -> Self {
        Self {
            selector,
            tracker,
            schedule,
        }
    }

    /// Symbols the tracker currently follows.
    pub fn universe(&self) -> Vec<String> {
        self.tracker.symbols().map(str::to_string).collect()
    }

    /// Replay `date`. Only a missing coarse snapshot or a failing sink abort
    /// the day; per-symbol data gaps degrade silently.
    pub fn run_day(
        &mut self,
        date: NaiveDate,
        snapshots: &dyn SnapshotPort,
        data: &dyn MarketDataPort,
        sink: &mut dyn SignalSink,
    ) -> Result<SessionReport, OrbError> {
        info!(%date, at = %self.schedule.reset_at, "session reset");
        self.selector.reset();
        self.tracker.reset_session();

        let coarse = snapshots.coarse(date)?;
        self.select_universe(date, &coarse, snapshots, data);
        let universe = self.universe();
        info!(%date, symbols = ?universe, "universe frozen");

        let range_end = date.and_time(self.schedule.record_range_at);
        let ranges_set = self.tracker.compute_opening_range(data, range_end);

        let mut signals = Vec::new();
        for now in minutes(range_end, date.and_time(self.schedule.session_close)) {
            let bars = self.current_bars(data, now);
            for signal in self.tracker.evaluate(&bars) {
                sink.emit(&signal)?;
                signals.push(signal);
            }
        }

        Ok(SessionReport {
            date,
            universe,
            ranges_set,
            signals,
        })
    }

    /// Coarse + fine selection every minute from `scan_start` through the
    /// freeze cutoff, pushing membership changes into the tracker.
    fn select_universe(
        &mut self,
        date: NaiveDate,
        coarse: &[CoarseSnapshot],
        snapshots: &dyn SnapshotPort,
        data: &dyn MarketDataPort,
    ) {
        let cutoff = date.and_time(self.selector.config().freeze_cutoff);
        let scan_start = date.and_time(self.schedule.scan_start);

        for now in minutes(scan_start, cutoff + Duration::minutes(1)) {
            let survivors = self.selector.coarse_filter(now, coarse, data);
            let fine = match snapshots.fine(date, &survivors) {
                Ok(f) => f,
                Err(e) => {
                    warn!(%date, error = %e, "fine snapshot unavailable");
                    Vec::new()
                }
            };
            let selected = self.selector.fine_filter(&fine);
            let changes = SecurityChanges::between(&self.universe(), &selected);
            if !changes.is_empty() {
                info!(%now, added = ?changes.added, removed = ?changes.removed, "universe changed");
                self.tracker.on_securities_changed(&changes);
            }
        }
    }

    fn current_bars(
        &self,
        data: &dyn MarketDataPort,
        now: NaiveDateTime,
    ) -> HashMap<String, MinuteBar> {
        self.tracker
            .symbols()
            .filter_map(|symbol| match data.current_bar(symbol, now) {
                Ok(bar) => bar.map(|b| (symbol.to_string(), b)),
                Err(e) => {
                    warn!(symbol, %now, error = %e, "current bar unavailable");
                    None
                }
            })
            .collect()
    }
}

/// Minute steps over `[start, end)`.
fn minutes(start: NaiveDateTime, end: NaiveDateTime) -> impl Iterator<Item = NaiveDateTime> {
    std::iter::successors(Some(start), |t| Some(*t + Duration::minutes(1)))
        .take_while(move |t| *t < end)
}
