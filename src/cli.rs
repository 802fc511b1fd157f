//! CLI definition and dispatch.

use chrono::{Duration, NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_signal_sink::CsvSignalSink;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{
    time_or, validate_config, validate_max_symbols, validate_range_minutes, validate_take_profit,
};
use crate::domain::error::OrbError;
use crate::domain::opening_range::{OpeningRangeTracker, RangeConfig};
use crate::domain::session::{Session, SessionSchedule};
use crate::domain::take_profit::TakeProfitConfig;
use crate::domain::universe::{UniverseConfig, UniverseSelector};
use crate::logging;
use crate::ports::config_port::ConfigPort;
use crate::ports::signal_port::SignalSink;
use crate::ports::snapshot_port::SnapshotPort;

#[derive(Parser, Debug)]
#[command(name = "orbtrader", about = "Opening-range breakout signal engine")]
pub struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay sessions and write breakout signals
    Run {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Single session (YYYY-MM-DD); all sessions in the data dir otherwise
        #[arg(long)]
        date: Option<String>,
    },
    /// Print the frozen universe for one session
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        date: String,
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    if let Err(e) = logging::setup_logging(cli.verbose) {
        eprintln!("warning: logging not initialized: {e}");
    }

    match cli.command {
        Command::Run {
            config,
            data,
            output,
            date,
        } => run_sessions(&config, data.as_ref(), output.as_ref(), date.as_deref()),
        Command::Scan { config, date, data } => run_scan(&config, &date, data.as_ref()),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = OrbError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn fail(e: OrbError) -> ExitCode {
    eprintln!("error: {e}");
    (&e).into()
}

/// Load and validate, reporting failures the same way for every command.
fn load_validated(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    eprintln!("Loading config from {}", path.display());
    let adapter = load_config(path)?;
    validate_config(&adapter).map_err(fail)?;
    Ok(adapter)
}

fn run_sessions(
    config_path: &PathBuf,
    data_override: Option<&PathBuf>,
    output_override: Option<&PathBuf>,
    date: Option<&str>,
) -> ExitCode {
    let adapter = match load_validated(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let (universe, range, schedule) = match build_engine_configs(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let data_dir = match resolve_data_dir(data_override, &adapter) {
        Ok(d) => d,
        Err(e) => return fail(e),
    };
    let csv = CsvAdapter::new(data_dir, universe.market_open, schedule.session_close);

    let dates = match resolve_dates(date, &csv) {
        Ok(d) => d,
        Err(e) => return fail(e),
    };
    if dates.is_empty() {
        eprintln!("No sessions found");
        return ExitCode::SUCCESS;
    }

    let mut session = Session::new(
        UniverseSelector::new(universe),
        OpeningRangeTracker::new(range),
        schedule,
    );

    let output = output_override
        .cloned()
        .or_else(|| adapter.get_string("output", "signals").map(PathBuf::from));

    let result = match output {
        Some(path) => {
            eprintln!("Writing signals to {}", path.display());
            CsvSignalSink::create(&path)
                .and_then(|mut sink| replay(&mut session, &dates, &csv, &mut sink))
        }
        None => CsvSignalSink::from_writer(std::io::stdout())
            .and_then(|mut sink| replay(&mut session, &dates, &csv, &mut sink)),
    };

    match result {
        Ok(total) => {
            eprintln!("\n{} sessions replayed, {} signals", dates.len(), total);
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn replay(
    session: &mut Session,
    dates: &[NaiveDate],
    csv: &CsvAdapter,
    sink: &mut dyn SignalSink,
) -> Result<usize, OrbError> {
    let mut total = 0;
    for &date in dates {
        let report = session.run_day(date, csv, csv, sink)?;
        eprintln!(
            "{}: universe [{}], {} ranges set, {} signals",
            report.date,
            report.universe.join(", "),
            report.ranges_set,
            report.signals.len()
        );
        total += report.signals.len();
    }
    Ok(total)
}

fn run_scan(config_path: &PathBuf, date: &str, data_override: Option<&PathBuf>) -> ExitCode {
    let adapter = match load_validated(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let date = match parse_date(date) {
        Ok(d) => d,
        Err(e) => return fail(e),
    };
    let (universe, _, schedule) = match build_engine_configs(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let data_dir = match resolve_data_dir(data_override, &adapter) {
        Ok(d) => d,
        Err(e) => return fail(e),
    };
    let csv = CsvAdapter::new(data_dir, universe.market_open, schedule.session_close);

    let coarse = match csv.coarse(date) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    eprintln!("Scanning {} symbols for {}", coarse.len(), date);

    // Last tick that still recomputes; the selection is frozen from here on.
    let before_cutoff = date.and_time(universe.freeze_cutoff) - Duration::minutes(1);
    let mut selector = UniverseSelector::new(universe);
    let survivors = selector.coarse_filter(before_cutoff, &coarse, &csv);
    let fine = match csv.fine(date, &survivors) {
        Ok(f) => f,
        Err(e) => return fail(e),
    };
    let selected = selector.fine_filter(&fine);

    if selected.is_empty() {
        eprintln!("No symbols selected");
    } else {
        for symbol in &selected {
            println!("{}", symbol);
        }
        eprintln!(
            "{} selected ({} passed coarse)",
            selected.len(),
            survivors.len()
        );
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_validated(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let (universe, range, schedule) = match build_engine_configs(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let take_profit = match build_take_profit_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    eprintln!("\nUniverse:");
    eprintln!(
        "  min first-minute volume: {}",
        universe.min_first_minute_volume
    );
    eprintln!("  min market cap:          {}", universe.min_market_cap);
    eprintln!(
        "  min premarket change:    {:.2}%",
        universe.min_premarket_change * 100.0
    );
    eprintln!("  max symbols:             {}", universe.max_symbols);
    eprintln!(
        "  market open / freeze:    {} / {}",
        universe.market_open, universe.freeze_cutoff
    );

    eprintln!("\nOpening range:");
    eprintln!("  window: {} minutes", range.range_window.num_minutes());

    eprintln!("\nSession:");
    eprintln!("  reset:        {}", schedule.reset_at);
    eprintln!("  scan start:   {}", schedule.scan_start);
    eprintln!("  record range: {}", schedule.record_range_at);
    eprintln!("  close:        {}", schedule.session_close);

    eprintln!("\nTake profit:");
    eprintln!(
        "  {:.0}% of fill at +{:.2}%",
        take_profit.fraction * 100.0,
        take_profit.target_pct * 100.0
    );

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn build_engine_configs(
    adapter: &dyn ConfigPort,
) -> Result<(UniverseConfig, RangeConfig, SessionSchedule), OrbError> {
    let universe = build_universe_config(adapter)?;
    let range = build_range_config(adapter)?;
    let schedule = build_schedule(adapter, &universe, &range)?;
    Ok((universe, range, schedule))
}

pub fn build_universe_config(adapter: &dyn ConfigPort) -> Result<UniverseConfig, OrbError> {
    let defaults = UniverseConfig::default();
    validate_max_symbols(adapter)?;
    let max_symbols =
        adapter.get_int("universe", "max_symbols", defaults.max_symbols as i64) as usize;

    Ok(UniverseConfig {
        min_first_minute_volume: adapter.get_int(
            "universe",
            "min_first_minute_volume",
            defaults.min_first_minute_volume,
        ),
        min_market_cap: adapter.get_double("universe", "min_market_cap", defaults.min_market_cap),
        min_premarket_change: adapter.get_double(
            "universe",
            "min_premarket_change",
            defaults.min_premarket_change,
        ),
        max_symbols,
        freeze_cutoff: time_or(adapter, "universe", "freeze_cutoff", defaults.freeze_cutoff)?,
        market_open: time_or(adapter, "universe", "market_open", defaults.market_open)?,
    })
}

pub fn build_range_config(adapter: &dyn ConfigPort) -> Result<RangeConfig, OrbError> {
    let defaults = RangeConfig::default();
    validate_range_minutes(adapter)?;
    let minutes = adapter.get_int(
        "opening_range",
        "range_minutes",
        defaults.range_window.num_minutes(),
    );
    Ok(RangeConfig {
        range_window: Duration::minutes(minutes),
    })
}

/// `record_range_at` defaults to the end of the opening-range window.
pub fn build_schedule(
    adapter: &dyn ConfigPort,
    universe: &UniverseConfig,
    range: &RangeConfig,
) -> Result<SessionSchedule, OrbError> {
    let defaults = SessionSchedule::default();
    let range_end: NaiveTime = universe.market_open + range.range_window;

    Ok(SessionSchedule {
        reset_at: time_or(adapter, "session", "reset_at", defaults.reset_at)?,
        scan_start: time_or(adapter, "session", "scan_start", defaults.scan_start)?,
        record_range_at: time_or(adapter, "session", "record_range_at", range_end)?,
        session_close: time_or(adapter, "session", "session_close", defaults.session_close)?,
    })
}

pub fn build_take_profit_config(adapter: &dyn ConfigPort) -> Result<TakeProfitConfig, OrbError> {
    let defaults = TakeProfitConfig::default();
    validate_take_profit(adapter)?;
    Ok(TakeProfitConfig {
        target_pct: adapter.get_double("take_profit", "target_pct", defaults.target_pct),
        fraction: adapter.get_double("take_profit", "fraction", defaults.fraction),
    })
}

/// `--data` wins over `[data] path`.
pub fn resolve_data_dir(
    data_override: Option<&PathBuf>,
    config: &dyn ConfigPort,
) -> Result<PathBuf, OrbError> {
    if let Some(dir) = data_override {
        return Ok(dir.clone());
    }
    config
        .get_string("data", "path")
        .map(PathBuf::from)
        .ok_or_else(|| OrbError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })
}

fn resolve_dates(
    date: Option<&str>,
    snapshots: &dyn SnapshotPort,
) -> Result<Vec<NaiveDate>, OrbError> {
    match date {
        Some(d) => Ok(vec![parse_date(d)?]),
        None => snapshots.sessions(),
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, OrbError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| OrbError::ConfigInvalid {
        section: "cli".into(),
        key: "date".into(),
        reason: format!("invalid date {value:?} (expected YYYY-MM-DD)"),
    })
}
