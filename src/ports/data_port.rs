//! Bar series access port trait.

use crate::domain::bar::DailyBar;
use crate::domain::error::DipfillError;

/// Source of the daily bar series for the single instrument under test.
pub trait BarSource {
    /// All bars in source order. Any malformed row fails the whole load.
    fn load_bars(&self) -> Result<Vec<DailyBar>, DipfillError>;

    /// Human-readable origin of the bars, used in log and summary output.
    fn describe(&self) -> String;
}
