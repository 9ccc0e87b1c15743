#![allow(dead_code)]

use chrono::NaiveDate;
use dipfill::domain::error::DipfillError;
pub use dipfill::domain::bar::DailyBar;
use dipfill::ports::data_port::BarSource;
use std::cell::Cell;
use std::io::Write;

pub struct MockBarSource {
    pub bars: Vec<DailyBar>,
    pub error: Option<String>,
    pub loads: Cell<usize>,
}

impl MockBarSource {
    pub fn new(bars: Vec<DailyBar>) -> Self {
        Self {
            bars,
            error: None,
            loads: Cell::new(0),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            bars: Vec::new(),
            error: Some(reason.to_string()),
            loads: Cell::new(0),
        }
    }
}

impl BarSource for MockBarSource {
    fn load_bars(&self) -> Result<Vec<DailyBar>, DipfillError> {
        self.loads.set(self.loads.get() + 1);
        if let Some(reason) = &self.error {
            return Err(DipfillError::InvalidField {
                path: "mock".into(),
                line: 3,
                field: "date",
                value: "13-45-2021".into(),
                reason: reason.clone(),
            });
        }
        Ok(self.bars.clone())
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date_str: &str, open: f64, high: f64, low: f64, close: f64) -> DailyBar {
    DailyBar::new(
        NaiveDate::parse_from_str(date_str, "%m-%d-%Y").unwrap(),
        open,
        high,
        low,
        close,
    )
}

/// The two-day example: one gain day, one loss day, both filled at 9.8.
pub fn example_bars() -> Vec<DailyBar> {
    vec![
        make_bar("01-04-2021", 10.0, 10.5, 9.5, 10.2),
        make_bar("01-05-2021", 10.0, 9.9, 9.0, 9.5),
    ]
}

pub fn example_csv() -> &'static str {
    "0,01-04-2021,TWD,10.0,10.5,9.5,10.2\n\
     1,01-05-2021,TWD,10.0,9.9,9.0,9.5\n"
}

/// Three weeks of bars mixing gains, losses, missed fills and a zero open.
pub fn mixed_csv() -> &'static str {
    "0,01-04-2021,TWD,10.0,10.5,9.5,10.2\n\
     1,01-05-2021,TWD,10.0,9.9,9.0,9.5\n\
     2,01-06-2021,TWD,10.0,10.8,9.9,10.6\n\
     3,01-07-2021,TWD,10.0,10.0,9.6,9.7\n\
     4,01-08-2021,TWD,0.0,0.0,0.0,0.0\n\
     5,01-11-2021,TWD,20.0,20.5,19.5,20.1\n\
     6,01-12-2021,TWD,20.0,20.2,19.0,19.2\n\
     7,01-13-2021,TWD,20.0,19.0,18.0,18.5\n\
     8,01-14-2021,TWD,50.0,51.0,48.5,50.5\n\
     9,01-15-2021,TWD,50.0,50.0,48.0,49.0\n"
}

pub fn write_temp(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
