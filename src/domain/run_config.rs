//! Run configuration: where the bars come from, the strategy parameter, and
//! how the chart is laid out.

use std::path::PathBuf;

use crate::domain::evaluator::StrategyParams;

pub const DEFAULT_DATE_FORMAT: &str = "%m-%d-%Y";
pub const DEFAULT_OUTPUT_PATH: &str = "profits.svg";

#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub path: Option<PathBuf>,
    pub delimiter: u8,
    pub date_format: String,
    /// Reject bars violating low <= open, close <= high instead of passing
    /// them through to evaluation.
    pub strict_bars: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: None,
            delimiter: b',',
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            strict_bars: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartConfig {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub y_min: f64,
    pub y_max: f64,
    pub width: f64,
    pub height: f64,
    /// Faint watermark text drawn inside the plot area.
    pub annotation: Option<String>,
    pub output_path: PathBuf,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            title: "Trading Simulation".to_string(),
            x_label: "Dates".to_string(),
            y_label: "Profits".to_string(),
            y_min: -4.0,
            y_max: 5.0,
            width: 1600.0,
            height: 700.0,
            annotation: None,
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub strategy_name: String,
    pub params: StrategyParams,
    pub data: DataConfig,
    pub chart: ChartConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            strategy_name: "Intraday dip buy".to_string(),
            params: StrategyParams::default(),
            data: DataConfig::default(),
            chart: ChartConfig::default(),
        }
    }
}
