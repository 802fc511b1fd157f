//! Premarket gap universe selection.
//!
//! Narrows the daily coarse snapshot to a handful of gappers with real
//! opening volume, then drops anything below the market-cap floor. The coarse
//! result freezes at a fixed wall-clock cutoff and stays fixed until the next
//! session's [`UniverseSelector::reset`].

use crate::domain::snapshot::{CoarseSnapshot, FineSnapshot};
use crate::ports::market_data_port::MarketDataPort;
use chrono::{Duration, NaiveDateTime, NaiveTime};
use std::cmp::Ordering;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct UniverseConfig {
    pub min_first_minute_volume: i64,
    pub min_market_cap: f64,
    pub min_premarket_change: f64,
    pub max_symbols: usize,
    pub freeze_cutoff: NaiveTime,
    pub market_open: NaiveTime,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        UniverseConfig {
            min_first_minute_volume: 500_000,
            min_market_cap: 3e6,
            min_premarket_change: 0.10,
            max_symbols: 5,
            freeze_cutoff: NaiveTime::from_hms_opt(9, 32, 0).unwrap_or_default(),
            market_open: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default(),
        }
    }
}

/// A coarse survivor before sorting.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub symbol: String,
    pub gap_fraction: f64,
}

#[derive(Debug, Clone)]
pub struct UniverseSelector {
    config: UniverseConfig,
    frozen: Vec<String>,
}

impl UniverseSelector {
    pub fn new(config: UniverseConfig) -> Self {
        Self {
            config,
            frozen: Vec::new(),
        }
    }

    pub fn config(&self) -> &UniverseConfig {
        &self.config
    }

    /// The most recent coarse result; immutable once the cutoff has passed.
    pub fn frozen(&self) -> &[String] {
        &self.frozen
    }

    pub fn is_frozen(&self, now: NaiveDateTime) -> bool {
        now.time() >= self.config.freeze_cutoff
    }

    /// Coarse selection by first-minute volume and premarket gap.
    ///
    /// At or after the freeze cutoff this returns the stored list without
    /// touching `data`. Before it, every call recomputes from `snapshot`.
    pub fn coarse_filter(
        &mut self,
        now: NaiveDateTime,
        snapshot: &[CoarseSnapshot],
        data: &dyn MarketDataPort,
    ) -> Vec<String> {
        if self.is_frozen(now) {
            return self.frozen.clone();
        }

        let first_minute = now.date().and_time(self.config.market_open);
        let mut candidates = Vec::new();

        for row in snapshot {
            let volume = match first_minute_volume(data, &row.symbol, first_minute) {
                Some(v) => v,
                None => {
                    debug!(symbol = %row.symbol, "excluded: no first-minute bar");
                    continue;
                }
            };
            if volume < self.config.min_first_minute_volume {
                debug!(symbol = %row.symbol, volume, "excluded: first-minute volume");
                continue;
            }

            let gap_fraction = row.gap_fraction();
            if gap_fraction < self.config.min_premarket_change {
                debug!(symbol = %row.symbol, gap_fraction, "excluded: premarket change");
                continue;
            }

            candidates.push(Candidate {
                symbol: row.symbol.clone(),
                gap_fraction,
            });
        }

        self.frozen = rank_candidates(candidates, self.config.max_symbols);
        self.frozen.clone()
    }

    /// Market-cap filter over fundamentals. Input order is preserved.
    pub fn fine_filter(&self, fine: &[FineSnapshot]) -> Vec<String> {
        fine.iter()
            .filter(|f| match f.market_cap() {
                Some(cap) => cap >= self.config.min_market_cap,
                None => {
                    debug!(symbol = %f.symbol, "excluded: no market cap");
                    false
                }
            })
            .map(|f| f.symbol.clone())
            .collect()
    }

    /// Un-freeze ahead of the next session.
    pub fn reset(&mut self) {
        self.frozen.clear();
    }
}

/// Sort by gap descending (stable, so ties keep snapshot order) and keep the
/// first `max_symbols`.
pub fn rank_candidates(mut candidates: Vec<Candidate>, max_symbols: usize) -> Vec<String> {
    candidates.sort_by(|a, b| {
        b.gap_fraction
            .partial_cmp(&a.gap_fraction)
            .unwrap_or(Ordering::Equal)
    });
    candidates
        .into_iter()
        .take(max_symbols)
        .map(|c| c.symbol)
        .collect()
}

fn first_minute_volume(
    data: &dyn MarketDataPort,
    symbol: &str,
    first_minute: NaiveDateTime,
) -> Option<i64> {
    let symbols = [symbol.to_string()];
    let history = data
        .history(&symbols, first_minute, first_minute + Duration::minutes(1), false)
        .map_err(|e| debug!(symbol, error = %e, "first-minute history unavailable"))
        .ok()?;
    history
        .get(symbol)
        .and_then(|bars| bars.first())
        .map(|bar| bar.volume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::MinuteBar;
    use crate::domain::error::OrbError;
    use crate::domain::snapshot::CompanyProfile;
    use chrono::NaiveDate;
    use std::cell::Cell;
    use std::collections::HashMap;

    struct VolumeOnly {
        volumes: HashMap<String, i64>,
        calls: Cell<usize>,
    }

    impl VolumeOnly {
        fn new(volumes: &[(&str, i64)]) -> Self {
            Self {
                volumes: volumes
                    .iter()
                    .map(|(s, v)| (s.to_string(), *v))
                    .collect(),
                calls: Cell::new(0),
            }
        }
    }

    impl MarketDataPort for VolumeOnly {
        fn history(
            &self,
            symbols: &[String],
            start: NaiveDateTime,
            _end: NaiveDateTime,
            _extended_hours: bool,
        ) -> Result<HashMap<String, Vec<MinuteBar>>, OrbError> {
            self.calls.set(self.calls.get() + 1);
            let mut out = HashMap::new();
            for s in symbols {
                if let Some(&volume) = self.volumes.get(s) {
                    out.insert(
                        s.clone(),
                        vec![MinuteBar {
                            symbol: s.clone(),
                            time: start,
                            open: 10.0,
                            high: 10.5,
                            low: 9.5,
                            close: 10.0,
                            volume,
                        }],
                    );
                }
            }
            Ok(out)
        }

        fn current_bar(
            &self,
            _symbol: &str,
            _time: NaiveDateTime,
        ) -> Result<Option<MinuteBar>, OrbError> {
            Ok(None)
        }
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn row(symbol: &str, price: f64, prior: f64) -> CoarseSnapshot {
        CoarseSnapshot {
            symbol: symbol.into(),
            price,
            adjusted_prior_close: prior,
        }
    }

    #[test]
    fn coarse_keeps_gappers_with_volume() {
        let data = VolumeOnly::new(&[("AAA", 600_000), ("BBB", 600_000)]);
        let mut selector = UniverseSelector::new(UniverseConfig::default());
        let snapshot = vec![row("AAA", 12.0, 10.0), row("BBB", 10.5, 10.0)];

        let result = selector.coarse_filter(at(9, 31), &snapshot, &data);
        assert_eq!(result, vec!["AAA"]);
        assert_eq!(selector.frozen(), &["AAA".to_string()]);
    }

    #[test]
    fn coarse_excludes_low_volume() {
        let data = VolumeOnly::new(&[("AAA", 499_999)]);
        let mut selector = UniverseSelector::new(UniverseConfig::default());
        let result = selector.coarse_filter(at(9, 31), &[row("AAA", 15.0, 10.0)], &data);
        assert!(result.is_empty());
    }

    #[test]
    fn coarse_excludes_missing_history() {
        let data = VolumeOnly::new(&[]);
        let mut selector = UniverseSelector::new(UniverseConfig::default());
        let result = selector.coarse_filter(at(9, 31), &[row("AAA", 15.0, 10.0)], &data);
        assert!(result.is_empty());
    }

    #[test]
    fn coarse_zero_prior_close_is_zero_gap() {
        let data = VolumeOnly::new(&[("ZERO", 1_000_000)]);
        let mut selector = UniverseSelector::new(UniverseConfig::default());
        let result = selector.coarse_filter(at(9, 31), &[row("ZERO", 5.0, 0.0)], &data);
        assert!(result.is_empty());

        let mut permissive = UniverseSelector::new(UniverseConfig {
            min_premarket_change: 0.0,
            ..UniverseConfig::default()
        });
        let result = permissive.coarse_filter(at(9, 31), &[row("ZERO", 5.0, 0.0)], &data);
        assert_eq!(result, vec!["ZERO"]);
    }

    #[test]
    fn coarse_sorts_and_truncates() {
        let data = VolumeOnly::new(&[
            ("A", 1_000_000),
            ("B", 1_000_000),
            ("C", 1_000_000),
            ("D", 1_000_000),
        ]);
        let mut selector = UniverseSelector::new(UniverseConfig {
            max_symbols: 3,
            ..UniverseConfig::default()
        });
        let snapshot = vec![
            row("A", 11.0, 10.0),
            row("B", 14.0, 10.0),
            row("C", 12.0, 10.0),
            row("D", 13.0, 10.0),
        ];
        let result = selector.coarse_filter(at(9, 31), &snapshot, &data);
        assert_eq!(result, vec!["B", "D", "C"]);
    }

    #[test]
    fn coarse_ties_keep_snapshot_order() {
        let data = VolumeOnly::new(&[("X", 1_000_000), ("Y", 1_000_000), ("Z", 1_000_000)]);
        let mut selector = UniverseSelector::new(UniverseConfig::default());
        let snapshot = vec![row("X", 12.0, 10.0), row("Y", 13.0, 10.0), row("Z", 12.0, 10.0)];
        let result = selector.coarse_filter(at(9, 31), &snapshot, &data);
        assert_eq!(result, vec!["Y", "X", "Z"]);
    }

    #[test]
    fn coarse_frozen_after_cutoff() {
        let data = VolumeOnly::new(&[("AAA", 600_000), ("NEW", 9_000_000)]);
        let mut selector = UniverseSelector::new(UniverseConfig::default());
        selector.coarse_filter(at(9, 31), &[row("AAA", 12.0, 10.0)], &data);
        let calls_before = data.calls.get();

        let later = selector.coarse_filter(at(9, 32), &[row("NEW", 50.0, 10.0)], &data);
        assert_eq!(later, vec!["AAA"]);
        let much_later = selector.coarse_filter(at(15, 0), &[], &data);
        assert_eq!(much_later, vec!["AAA"]);
        assert_eq!(data.calls.get(), calls_before);
    }

    #[test]
    fn coarse_recomputes_before_cutoff() {
        let data = VolumeOnly::new(&[("AAA", 600_000), ("BBB", 600_000)]);
        let mut selector = UniverseSelector::new(UniverseConfig::default());
        selector.coarse_filter(at(9, 30), &[row("AAA", 12.0, 10.0)], &data);
        let result = selector.coarse_filter(at(9, 31), &[row("BBB", 12.0, 10.0)], &data);
        assert_eq!(result, vec!["BBB"]);
    }

    #[test]
    fn reset_clears_frozen() {
        let data = VolumeOnly::new(&[("AAA", 600_000)]);
        let mut selector = UniverseSelector::new(UniverseConfig::default());
        selector.coarse_filter(at(9, 31), &[row("AAA", 12.0, 10.0)], &data);
        selector.reset();
        assert!(selector.frozen().is_empty());
        assert!(selector.coarse_filter(at(9, 45), &[], &data).is_empty());
    }

    #[test]
    fn fine_filters_by_market_cap_in_order() {
        let selector = UniverseSelector::new(UniverseConfig::default());
        let fine = vec![
            FineSnapshot {
                symbol: "BIG".into(),
                profile: Some(CompanyProfile {
                    market_cap: Some(5e9),
                }),
            },
            FineSnapshot {
                symbol: "TINY".into(),
                profile: Some(CompanyProfile {
                    market_cap: Some(1e6),
                }),
            },
            FineSnapshot {
                symbol: "NOPROFILE".into(),
                profile: None,
            },
            FineSnapshot {
                symbol: "NOCAP".into(),
                profile: Some(CompanyProfile { market_cap: None }),
            },
            FineSnapshot {
                symbol: "EDGE".into(),
                profile: Some(CompanyProfile {
                    market_cap: Some(3e6),
                }),
            },
        ];
        assert_eq!(selector.fine_filter(&fine), vec!["BIG", "EDGE"]);
    }
}
