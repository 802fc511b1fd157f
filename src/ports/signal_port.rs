//! Signal sink port trait.

use crate::domain::error::OrbError;
use crate::domain::signal::Signal;

/// Receives breakout signals for downstream sizing/execution.
pub trait SignalSink {
    fn emit(&mut self, signal: &Signal) -> Result<(), OrbError>;
}

impl SignalSink for Vec<Signal> {
    fn emit(&mut self, signal: &Signal) -> Result<(), OrbError> {
        self.push(signal.clone());
        Ok(())
    }
}
