//! Outcome aggregation over a bar series.
//!
//! Evaluates every bar, drops days without a fill, and splits the remaining
//! days into gain and loss views. Break-even days are kept in the traded view
//! but belong to neither side.

use chrono::NaiveDate;

use crate::domain::bar::DailyBar;
use crate::domain::evaluator::{evaluate_bar, Evaluation, StrategyParams};

/// Date-aligned, order-preserving series of profit percentages.
///
/// Dates and values are only ever appended as pairs, so `dates()[i]` always
/// belongs to `values()[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesView {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl SeriesView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, date: NaiveDate, value: f64) {
        self.dates.push(date);
        self.values.push(value);
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// Arithmetic mean, or `None` for an empty view.
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    /// Pairs for which `predicate(value)` holds, in order.
    pub fn filter(&self, predicate: impl Fn(f64) -> bool) -> SeriesView {
        let mut out = SeriesView::new();
        for (date, value) in self.iter() {
            if predicate(value) {
                out.push(date, value);
            }
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    /// Every filled day.
    pub traded: SeriesView,
    /// Filled days with profit > 0.
    pub gains: SeriesView,
    /// Filled days with profit < 0.
    pub losses: SeriesView,
    pub total_days: usize,
    pub not_filled_days: usize,
    pub degenerate_days: usize,
}

impl Outcome {
    pub fn overall_mean(&self) -> Option<f64> {
        self.traded.mean()
    }

    pub fn gain_mean(&self) -> Option<f64> {
        self.gains.mean()
    }

    pub fn loss_mean(&self) -> Option<f64> {
        self.losses.mean()
    }

    /// Filled days that closed exactly at the limit price.
    pub fn breakeven_days(&self) -> usize {
        self.traded.len() - self.gains.len() - self.losses.len()
    }

    /// Share of filled days that were gains.
    pub fn win_ratio(&self) -> Option<f64> {
        if self.traded.is_empty() {
            return None;
        }
        Some(self.gains.len() as f64 / self.traded.len() as f64)
    }
}

pub fn aggregate(params: &StrategyParams, bars: &[DailyBar]) -> Outcome {
    let mut outcome = Outcome {
        total_days: bars.len(),
        ..Outcome::default()
    };

    for bar in bars {
        match evaluate_bar(params, bar) {
            Evaluation::Filled(profit) => outcome.traded.push(bar.date, profit),
            Evaluation::NotFilled => outcome.not_filled_days += 1,
            Evaluation::Degenerate => {
                log::debug!("{}: zero limit price, day excluded", bar.date);
                outcome.degenerate_days += 1;
            }
        }
    }

    outcome.gains = outcome.traded.filter(|p| p > 0.0);
    outcome.losses = outcome.traded.filter(|p| p < 0.0);
    outcome
}
