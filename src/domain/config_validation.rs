//! Configuration validation.
//!
//! The selector and tracker assume sane thresholds; everything read from a
//! config file passes through here before a session is built.

use crate::domain::error::OrbError;
use crate::domain::opening_range::RangeConfig;
use crate::domain::session::SessionSchedule;
use crate::domain::universe::UniverseConfig;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveTime;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), OrbError> {
    validate_volume(config)?;
    validate_market_cap(config)?;
    validate_max_symbols(config)?;
    validate_universe_times(config)?;
    validate_range_minutes(config)?;
    validate_session_times(config)?;
    validate_schedule_order(config)?;
    validate_take_profit(config)?;
    Ok(())
}

/// Parse an `HH:MM` (or `HH:MM:SS`) time.
pub fn parse_time(value: &str, section: &str, key: &str) -> Result<NaiveTime, OrbError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| OrbError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("invalid time {value:?}, expected HH:MM"),
        })
}

/// Read an optional time, falling back to `default` when the key is absent.
pub fn time_or(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: NaiveTime,
) -> Result<NaiveTime, OrbError> {
    match config.get_string(section, key) {
        Some(s) => parse_time(&s, section, key),
        None => Ok(default),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> OrbError {
    OrbError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_volume(config: &dyn ConfigPort) -> Result<(), OrbError> {
    if config.get_int("universe", "min_first_minute_volume", 0) < 0 {
        return Err(invalid(
            "universe",
            "min_first_minute_volume",
            "min_first_minute_volume must be non-negative",
        ));
    }
    Ok(())
}

fn validate_market_cap(config: &dyn ConfigPort) -> Result<(), OrbError> {
    if config.get_double("universe", "min_market_cap", 0.0) < 0.0 {
        return Err(invalid(
            "universe",
            "min_market_cap",
            "min_market_cap must be non-negative",
        ));
    }
    Ok(())
}

pub fn validate_max_symbols(config: &dyn ConfigPort) -> Result<(), OrbError> {
    if config.get_int("universe", "max_symbols", 1) < 1 {
        return Err(invalid(
            "universe",
            "max_symbols",
            "max_symbols must be at least 1",
        ));
    }
    Ok(())
}

fn validate_universe_times(config: &dyn ConfigPort) -> Result<(), OrbError> {
    let defaults = UniverseConfig::default();
    let open = time_or(config, "universe", "market_open", defaults.market_open)?;
    let cutoff = time_or(config, "universe", "freeze_cutoff", defaults.freeze_cutoff)?;
    if cutoff <= open {
        return Err(invalid(
            "universe",
            "freeze_cutoff",
            "freeze_cutoff must be after market_open",
        ));
    }
    Ok(())
}

pub fn validate_range_minutes(config: &dyn ConfigPort) -> Result<(), OrbError> {
    if config.get_int("opening_range", "range_minutes", 1) < 1 {
        return Err(invalid(
            "opening_range",
            "range_minutes",
            "range_minutes must be at least 1",
        ));
    }
    Ok(())
}

fn validate_session_times(config: &dyn ConfigPort) -> Result<(), OrbError> {
    for key in ["reset_at", "scan_start", "record_range_at", "session_close"] {
        time_or(config, "session", key, NaiveTime::default())?;
    }
    Ok(())
}

/// Universe ticks must start before the cutoff, and the range is recorded
/// after the universe freezes and before the close.
fn validate_schedule_order(config: &dyn ConfigPort) -> Result<(), OrbError> {
    let universe = UniverseConfig::default();
    let schedule = SessionSchedule::default();
    let range_minutes = config.get_int(
        "opening_range",
        "range_minutes",
        RangeConfig::default().range_window.num_minutes(),
    );

    let open = time_or(config, "universe", "market_open", universe.market_open)?;
    let cutoff = time_or(config, "universe", "freeze_cutoff", universe.freeze_cutoff)?;
    let scan_start = time_or(config, "session", "scan_start", schedule.scan_start)?;
    let range_end = open + chrono::Duration::minutes(range_minutes);
    let record = time_or(config, "session", "record_range_at", range_end)?;
    let close = time_or(config, "session", "session_close", schedule.session_close)?;

    if scan_start >= cutoff {
        return Err(invalid(
            "session",
            "scan_start",
            "scan_start must be before freeze_cutoff",
        ));
    }
    if record < cutoff {
        return Err(invalid(
            "session",
            "record_range_at",
            "record_range_at must not be before freeze_cutoff",
        ));
    }
    if record >= close {
        return Err(invalid(
            "session",
            "record_range_at",
            "record_range_at must be before session_close",
        ));
    }
    Ok(())
}

pub fn validate_take_profit(config: &dyn ConfigPort) -> Result<(), OrbError> {
    let target = config.get_double("take_profit", "target_pct", 0.07);
    if target <= 0.0 {
        return Err(invalid(
            "take_profit",
            "target_pct",
            "target_pct must be positive",
        ));
    }
    let fraction = config.get_double("take_profit", "fraction", 0.5);
    if fraction <= 0.0 || fraction > 1.0 {
        return Err(invalid(
            "take_profit",
            "fraction",
            "fraction must be between 0 and 1",
        ));
    }
    Ok(())
}
