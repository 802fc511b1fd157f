//! Core domain types and logic.

pub mod bar;
pub mod snapshot;
pub mod signal;
pub mod universe;
pub mod opening_range;
pub mod take_profit;
pub mod session;
pub mod config_validation;
pub mod error;
