//! CSV directory adapter for minute bars and daily snapshots.
//!
//! Layout under `base_path`:
//!
//! ```text
//! bars/<SYMBOL>.csv        datetime,open,high,low,close,volume
//! coarse/<YYYY-MM-DD>.csv  symbol,price,adjusted_prior_close
//! fine/<YYYY-MM-DD>.csv    symbol,market_cap
//! ```
//!
//! An empty `market_cap` cell means the profile exists without a market cap;
//! a symbol missing from the fine file has no profile at all.

use crate::domain::bar::MinuteBar;
use crate::domain::error::OrbError;
use crate::domain::snapshot::{CoarseSnapshot, CompanyProfile, FineSnapshot};
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::snapshot_port::SnapshotPort;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub struct CsvAdapter {
    base_path: PathBuf,
    market_open: NaiveTime,
    session_close: NaiveTime,
    bars: RefCell<HashMap<String, Vec<MinuteBar>>>,
}

impl CsvAdapter {
    /// `market_open`/`session_close` bound the regular session; bars outside
    /// it count as extended hours.
    pub fn new(base_path: PathBuf, market_open: NaiveTime, session_close: NaiveTime) -> Self {
        Self {
            base_path,
            market_open,
            session_close,
            bars: RefCell::new(HashMap::new()),
        }
    }

    fn bars_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join("bars").join(format!("{}.csv", symbol))
    }

    fn snapshot_path(&self, kind: &str, date: NaiveDate) -> PathBuf {
        self.base_path
            .join(kind)
            .join(format!("{}.csv", date.format("%Y-%m-%d")))
    }

    fn is_regular_hours(&self, time: NaiveDateTime) -> bool {
        let t = time.time();
        t >= self.market_open && t < self.session_close
    }

    /// Parse `bars/<symbol>.csv` into the cache on first use. A missing file
    /// caches as an empty series.
    fn ensure_loaded(&self, symbol: &str) -> Result<(), OrbError> {
        if self.bars.borrow().contains_key(symbol) {
            return Ok(());
        }

        let path = self.bars_path(symbol);
        let bars = if path.exists() {
            parse_bars(symbol, &read(&path)?)?
        } else {
            Vec::new()
        };
        self.bars.borrow_mut().insert(symbol.to_string(), bars);
        Ok(())
    }
}

impl MarketDataPort for CsvAdapter {
    fn history(
        &self,
        symbols: &[String],
        start: NaiveDateTime,
        end: NaiveDateTime,
        extended_hours: bool,
    ) -> Result<HashMap<String, Vec<MinuteBar>>, OrbError> {
        let mut out = HashMap::new();
        for symbol in symbols {
            self.ensure_loaded(symbol)?;
            let cache = self.bars.borrow();
            let bars = cache.get(symbol).map(Vec::as_slice).unwrap_or_default();

            let lo = bars.partition_point(|b| b.time < start);
            let hi = bars.partition_point(|b| b.time < end);
            let window: Vec<MinuteBar> = bars[lo..hi.max(lo)]
                .iter()
                .filter(|b| extended_hours || self.is_regular_hours(b.time))
                .cloned()
                .collect();
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
        self.ensure_loaded(symbol)?;
        let cache = self.bars.borrow();
        let bars = cache.get(symbol).map(Vec::as_slice).unwrap_or_default();
        Ok(bars
            .binary_search_by_key(&time, |b| b.time)
            .ok()
            .map(|i| bars[i].clone()))
    }
}

impl SnapshotPort for CsvAdapter {
    fn coarse(&self, date: NaiveDate) -> Result<Vec<CoarseSnapshot>, OrbError> {
        let path = self.snapshot_path("coarse", date);
        if !path.exists() {
            return Err(OrbError::Snapshot {
                kind: "coarse".into(),
                date: date.to_string(),
            });
        }
        let content = read(&path)?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut rows = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| OrbError::Data {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            rows.push(CoarseSnapshot {
                symbol: field(&record, 0, "symbol")?.to_string(),
                price: parse_f64(&record, 1, "price")?,
                adjusted_prior_close: parse_f64(&record, 2, "adjusted_prior_close")?,
            });
        }
        Ok(rows)
    }

    fn fine(&self, date: NaiveDate, symbols: &[String]) -> Result<Vec<FineSnapshot>, OrbError> {
        let path = self.snapshot_path("fine", date);
        let mut profiles: HashMap<String, CompanyProfile> = HashMap::new();

        if path.exists() {
            let content = read(&path)?;
            let mut rdr = csv::Reader::from_reader(content.as_bytes());
            for result in rdr.records() {
                let record = result.map_err(|e| OrbError::Data {
                    reason: format!("CSV parse error in {}: {}", path.display(), e),
                })?;
                let symbol = field(&record, 0, "symbol")?.to_string();
                let market_cap = match record.get(1).map(str::trim) {
                    None | Some("") => None,
                    Some(_) => Some(parse_f64(&record, 1, "market_cap")?),
                };
                profiles.insert(symbol, CompanyProfile { market_cap });
            }
        }

        Ok(symbols
            .iter()
            .map(|s| FineSnapshot {
                symbol: s.clone(),
                profile: profiles.get(s).cloned(),
            })
            .collect())
    }

    fn sessions(&self) -> Result<Vec<NaiveDate>, OrbError> {
        let dir = self.base_path.join("coarse");
        let entries = fs::read_dir(&dir).map_err(|e| OrbError::Data {
            reason: format!("failed to read directory {}: {}", dir.display(), e),
        })?;

        let mut dates = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| OrbError::Data {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(".csv") {
                if let Ok(date) = NaiveDate::parse_from_str(stem, "%Y-%m-%d") {
                    dates.push(date);
                }
            }
        }
        dates.sort();
        Ok(dates)
    }
}

fn read(path: &Path) -> Result<String, OrbError> {
    fs::read_to_string(path).map_err(|e| OrbError::Data {
        reason: format!("failed to read {}: {}", path.display(), e),
    })
}

fn field<'a>(record: &'a csv::StringRecord, idx: usize, name: &str) -> Result<&'a str, OrbError> {
    record.get(idx).map(str::trim).ok_or_else(|| OrbError::Data {
        reason: format!("missing {} column", name),
    })
}

fn parse_f64(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64, OrbError> {
    field(record, idx, name)?
        .parse()
        .map_err(|e| OrbError::Data {
            reason: format!("invalid {} value: {}", name, e),
        })
}

fn parse_bars(symbol: &str, content: &str) -> Result<Vec<MinuteBar>, OrbError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut bars = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| OrbError::Data {
            reason: format!("CSV parse error: {}", e),
        })?;
        let time = NaiveDateTime::parse_from_str(field(&record, 0, "datetime")?, DATETIME_FORMAT)
            .map_err(|e| OrbError::Data {
                reason: format!("invalid datetime format: {}", e),
            })?;
        let volume: i64 = field(&record, 5, "volume")?
            .parse()
            .map_err(|e| OrbError::Data {
                reason: format!("invalid volume value: {}", e),
            })?;

        bars.push(MinuteBar {
            symbol: symbol.to_string(),
            time,
            open: parse_f64(&record, 1, "open")?,
            high: parse_f64(&record, 2, "high")?,
            low: parse_f64(&record, 3, "low")?,
            close: parse_f64(&record, 4, "close")?,
            volume,
        });
    }

    bars.sort_by_key(|b| b.time);
    Ok(bars)
}
