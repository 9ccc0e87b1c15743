//! dipfill — evaluates a "buy the intraday dip" limit-order strategy against
//! daily OHLC bars and charts the per-day profit percentages.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
