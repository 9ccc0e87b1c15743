//! Per-day strategy evaluation.
//!
//! The strategy places a limit buy a fixed percentage below the day's open.
//! If the day's range reaches that price the order fills, and the position
//! is closed at the day's close. The day's outcome is the percentage return
//! of that round trip.

use crate::domain::bar::DailyBar;

/// Default distance of the limit buy below the open, in percent.
pub const DEFAULT_LIMIT_DISCOUNT_PCT: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyParams {
    /// Limit price = open * (1 - limit_discount_pct / 100).
    pub limit_discount_pct: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            limit_discount_pct: DEFAULT_LIMIT_DISCOUNT_PCT,
        }
    }
}

impl StrategyParams {
    pub fn limit_price(&self, open: f64) -> f64 {
        open * (1.0 - self.limit_discount_pct / 100.0)
    }
}

/// Outcome of applying the strategy to one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    /// The limit order filled; percentage return from limit price to close.
    Filled(f64),
    /// The limit price was outside the day's low-high range.
    NotFilled,
    /// The limit price was zero or not finite, so no return is defined.
    Degenerate,
}

impl Evaluation {
    pub fn profit_percent(&self) -> Option<f64> {
        match self {
            Evaluation::Filled(p) => Some(*p),
            Evaluation::NotFilled | Evaluation::Degenerate => None,
        }
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, Evaluation::Filled(_))
    }
}

pub fn evaluate(params: &StrategyParams, open: f64, high: f64, low: f64, close: f64) -> Evaluation {
    let buying_price = params.limit_price(open);
    if buying_price == 0.0 || !buying_price.is_finite() {
        return Evaluation::Degenerate;
    }

    if low <= buying_price && buying_price <= high {
        let profit = (close - buying_price) * 100.0 / buying_price;
        if profit.is_finite() {
            Evaluation::Filled(profit)
        } else {
            Evaluation::Degenerate
        }
    } else {
        Evaluation::NotFilled
    }
}

pub fn evaluate_bar(params: &StrategyParams, bar: &DailyBar) -> Evaluation {
    evaluate(params, bar.open, bar.high, bar.low, bar.close)
}
