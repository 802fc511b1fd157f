//! Directional breakout signals.

use chrono::{Duration, NaiveDateTime};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// A breakout recommendation, valid for `horizon` after `generated_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub symbol: String,
    pub direction: Direction,
    pub horizon: Duration,
    pub generated_at: NaiveDateTime,
    pub close: f64,
}

impl Signal {
    pub fn expires_at(&self) -> NaiveDateTime {
        self.generated_at + self.horizon
    }
}
