//! Daily snapshot feed port trait.

use crate::domain::error::OrbError;
use crate::domain::snapshot::{CoarseSnapshot, FineSnapshot};
use chrono::NaiveDate;

pub trait SnapshotPort {
    fn coarse(&self, date: NaiveDate) -> Result<Vec<CoarseSnapshot>, OrbError>;

    /// Fundamentals for `symbols`, in the order requested. A symbol without
    /// fundamentals is returned with `profile: None`.
    fn fine(&self, date: NaiveDate, symbols: &[String]) -> Result<Vec<FineSnapshot>, OrbError>;

    /// Session dates with a coarse snapshot available, ascending.
    fn sessions(&self) -> Result<Vec<NaiveDate>, OrbError>;
}
