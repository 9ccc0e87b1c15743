//! Chart rendering port trait.

use std::path::Path;

use crate::domain::aggregator::Outcome;
use crate::domain::error::DipfillError;
use crate::domain::run_config::ChartConfig;

/// Port for turning an aggregated outcome into a visual report.
pub trait ChartRenderer {
    fn write(
        &self,
        outcome: &Outcome,
        chart: &ChartConfig,
        output_path: &Path,
    ) -> Result<(), DipfillError>;
}
