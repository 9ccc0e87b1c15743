//! Delimited-file bar source.
//!
//! Rows carry no header and are read by position:
//! `index, date, <ignored>, open, high, low, close`. Extra trailing columns
//! are ignored. Lines starting with `#` are comments.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::domain::bar::DailyBar;
use crate::domain::error::DipfillError;
use crate::domain::run_config::DataConfig;
use crate::ports::data_port::BarSource;

const DATE_COL: usize = 1;
const OPEN_COL: usize = 3;
const HIGH_COL: usize = 4;
const LOW_COL: usize = 5;
const CLOSE_COL: usize = 6;
const MIN_COLUMNS: usize = CLOSE_COL + 1;

pub struct CsvBarSource {
    path: PathBuf,
    delimiter: u8,
    date_format: String,
    strict_bars: bool,
}

impl CsvBarSource {
    pub fn new(path: PathBuf) -> Self {
        Self::with_options(path, &DataConfig::default())
    }

    pub fn with_options(path: PathBuf, options: &DataConfig) -> Self {
        Self {
            path,
            delimiter: options.delimiter,
            date_format: options.date_format.clone(),
            strict_bars: options.strict_bars,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn path_str(&self) -> String {
        self.path.display().to_string()
    }

    fn field<'r>(
        &self,
        record: &'r csv::StringRecord,
        line: u64,
        index: usize,
        name: &'static str,
    ) -> Result<&'r str, DipfillError> {
        record.get(index).ok_or_else(|| DipfillError::MalformedRow {
            path: self.path_str(),
            line,
            reason: format!("missing {name} column"),
        })
    }

    fn parse_price(
        &self,
        record: &csv::StringRecord,
        line: u64,
        index: usize,
        name: &'static str,
    ) -> Result<f64, DipfillError> {
        let raw = self.field(record, line, index, name)?;
        raw.parse::<f64>().map_err(|e| DipfillError::InvalidField {
            path: self.path_str(),
            line,
            field: name,
            value: raw.to_string(),
            reason: e.to_string(),
        })
    }

    fn parse_record(&self, record: &csv::StringRecord) -> Result<DailyBar, DipfillError> {
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.len() < MIN_COLUMNS {
            return Err(DipfillError::MalformedRow {
                path: self.path_str(),
                line,
                reason: format!(
                    "expected at least {} columns, found {}",
                    MIN_COLUMNS,
                    record.len()
                ),
            });
        }

        let date_str = self.field(record, line, DATE_COL, "date")?;
        let date = NaiveDate::parse_from_str(date_str, &self.date_format).map_err(|e| {
            DipfillError::InvalidField {
                path: self.path_str(),
                line,
                field: "date",
                value: date_str.to_string(),
                reason: format!("{} (expected format {})", e, self.date_format),
            }
        })?;

        let bar = DailyBar {
            date,
            open: self.parse_price(record, line, OPEN_COL, "open")?,
            high: self.parse_price(record, line, HIGH_COL, "high")?,
            low: self.parse_price(record, line, LOW_COL, "low")?,
            close: self.parse_price(record, line, CLOSE_COL, "close")?,
        };

        if !bar.is_consistent() {
            if self.strict_bars {
                return Err(DipfillError::InconsistentBar {
                    path: self.path_str(),
                    line,
                });
            }
            log::warn!(
                "{} line {}: bar for {} is outside its own low-high range",
                self.path_str(),
                line,
                bar.date
            );
        }

        Ok(bar)
    }
}

impl BarSource for CsvBarSource {
    fn load_bars(&self) -> Result<Vec<DailyBar>, DipfillError> {
        // The reader owns the file handle and closes it when dropped, on
        // success or on the first bad row.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(self.delimiter)
            .comment(Some(b'#'))
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| DipfillError::DataSource {
                path: self.path_str(),
                reason: e.to_string(),
            })?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| DipfillError::MalformedRow {
                path: self.path_str(),
                line: e.position().map(|p| p.line()).unwrap_or(0),
                reason: format!("CSV parse error: {}", e),
            })?;

            // a line holding only whitespace trims down to one empty field
            if record.iter().all(str::is_empty) {
                continue;
            }

            bars.push(self.parse_record(&record)?);
        }

        log::info!("loaded {} bars from {}", bars.len(), self.path_str());
        Ok(bars)
    }

    fn describe(&self) -> String {
        self.path_str()
    }
}
