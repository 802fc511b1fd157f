//! CSV signal sink.

use crate::domain::error::OrbError;
use crate::domain::signal::Signal;
use crate::ports::signal_port::SignalSink;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const HEADER: [&str; 5] = [
    "generated_at",
    "symbol",
    "direction",
    "close",
    "horizon_minutes",
];

/// Appends one row per signal, flushing after each so a crashed replay
/// still leaves every emitted signal on disk.
pub struct CsvSignalSink<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvSignalSink<File> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, OrbError> {
        let file = File::create(path.as_ref()).map_err(|e| OrbError::Sink {
            reason: format!("failed to create {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_writer(file)
    }
}

impl<W: Write> CsvSignalSink<W> {
    pub fn from_writer(inner: W) -> Result<Self, OrbError> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(HEADER).map_err(sink_error)?;
        Ok(Self { writer })
    }

    pub fn into_inner(self) -> Result<W, OrbError> {
        self.writer.into_inner().map_err(|e| OrbError::Sink {
            reason: e.to_string(),
        })
    }
}

impl<W: Write> SignalSink for CsvSignalSink<W> {
    fn emit(&mut self, signal: &Signal) -> Result<(), OrbError> {
        self.writer
            .write_record([
                signal.generated_at.format("%Y-%m-%d %H:%M").to_string(),
                signal.symbol.clone(),
                signal.direction.to_string(),
                signal.close.to_string(),
                signal.horizon.num_minutes().to_string(),
            ])
            .map_err(sink_error)?;
        self.writer.flush().map_err(|e| OrbError::Sink {
            reason: e.to_string(),
        })
    }
}

fn sink_error(e: csv::Error) -> OrbError {
    OrbError::Sink {
        reason: e.to_string(),
    }
}
