//! Market data access port trait.

use crate::domain::bar::MinuteBar;
use crate::domain::error::OrbError;
use chrono::NaiveDateTime;
use std::collections::HashMap;

pub trait MarketDataPort {
    /// Minute bars with `start <= time < end` for each requested symbol,
    /// ascending by time. Symbols with no bars may be absent from the map.
    /// With `extended_hours == false` only regular-session bars are returned.
    fn history(
        &self,
        symbols: &[String],
        start: NaiveDateTime,
        end: NaiveDateTime,
        extended_hours: bool,
    ) -> Result<HashMap<String, Vec<MinuteBar>>, OrbError>;

    /// The bar opening at `time`, if one traded.
    fn current_bar(&self, symbol: &str, time: NaiveDateTime)
    -> Result<Option<MinuteBar>, OrbError>;
}
