//! Secondary profit-taking order placed after an entry fill.
//!
//! An entry fill produces a limit order for part of the filled quantity at a
//! fixed percentage above the fill price. The trailing stop that manages the
//! rest of the position lives with the execution platform.
//!
//! The host calls [`take_profit_for_fill`] from its fill handler; signal
//! replay itself never places orders.

use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct TakeProfitConfig {
    /// Limit offset above the fill price, as a fraction (0.07 = +7%).
    pub target_pct: f64,
    /// Share of the filled quantity to take off at the target.
    pub fraction: f64,
}

impl Default for TakeProfitConfig {
    fn default() -> Self {
        TakeProfitConfig {
            target_pct: 0.07,
            fraction: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub symbol: String,
    /// Signed filled quantity; positive for buys.
    pub quantity: i64,
    pub price: f64,
    pub time: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TakeProfitOrder {
    pub symbol: String,
    pub quantity: i64,
    pub limit_price: f64,
}

/// Build the take-profit limit for an entry fill.
///
/// Only buy fills count as entries; sells (including the take-profit's own
/// fill) return `None`, as does a fill too small to split.
pub fn take_profit_for_fill(fill: &Fill, config: &TakeProfitConfig) -> Option<TakeProfitOrder> {
    if fill.quantity <= 0 {
        return None;
    }

    let quantity = (fill.quantity.unsigned_abs() as f64 * config.fraction).floor() as i64;
    if quantity == 0 {
        return None;
    }

    Some(TakeProfitOrder {
        symbol: fill.symbol.clone(),
        quantity: -fill.quantity.signum() * quantity,
        limit_price: fill.price * (1.0 + config.target_pct),
    })
}
