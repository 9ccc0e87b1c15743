//! Domain error types.

/// Top-level error type for dipfill.
///
/// Only structural problems are errors. A day whose limit order would not
/// have filled, or whose limit price is degenerate, is an evaluation outcome
/// and never surfaces here.
#[derive(Debug, thiserror::Error)]
pub enum DipfillError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("cannot read {path}: {reason}")]
    DataSource { path: String, reason: String },

    #[error("{path} line {line}: {reason}")]
    MalformedRow {
        path: String,
        line: u64,
        reason: String,
    },

    #[error("{path} line {line}: invalid {field} {value:?}: {reason}")]
    InvalidField {
        path: String,
        line: u64,
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{path} line {line}: inconsistent bar (expected low <= open, close <= high)")]
    InconsistentBar { path: String, line: u64 },

    /// Building the chart or writing it to disk failed.
    #[error("chart render error: {reason}")]
    Render { reason: String },
}

impl DipfillError {
    /// True for errors raised while reading the bar series.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            DipfillError::DataSource { .. }
                | DipfillError::MalformedRow { .. }
                | DipfillError::InvalidField { .. }
                | DipfillError::InconsistentBar { .. }
        )
    }
}

impl From<&DipfillError> for std::process::ExitCode {
    fn from(err: &DipfillError) -> Self {
        let code: u8 = match err {
            DipfillError::ConfigParse { .. }
            | DipfillError::ConfigMissing { .. }
            | DipfillError::ConfigInvalid { .. } => 2,
            DipfillError::DataSource { .. }
            | DipfillError::MalformedRow { .. }
            | DipfillError::InvalidField { .. }
            | DipfillError::InconsistentBar { .. } => 3,
            DipfillError::Render { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_field_names_line_and_value() {
        let err = DipfillError::InvalidField {
            path: "prices.csv".into(),
            line: 7,
            field: "date",
            value: "2021-01-04".into(),
            reason: "input contains invalid characters".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("prices.csv line 7"));
        assert!(msg.contains("invalid date \"2021-01-04\""));
    }

    #[test]
    fn load_errors_are_classified() {
        let load = DipfillError::MalformedRow {
            path: "p.csv".into(),
            line: 1,
            reason: "expected 7 columns, found 3".into(),
        };
        assert!(load.is_load_error());

        let config = DipfillError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        };
        assert!(!config.is_load_error());
    }

    #[test]
    fn exit_codes_by_class() {
        use std::process::ExitCode;

        let cases = [
            (
                DipfillError::ConfigInvalid {
                    section: "chart".into(),
                    key: "y_min".into(),
                    reason: "bad".into(),
                },
                ExitCode::from(2),
            ),
            (
                DipfillError::DataSource {
                    path: "x.csv".into(),
                    reason: "not found".into(),
                },
                ExitCode::from(3),
            ),
            (
                DipfillError::Render {
                    reason: "no space".into(),
                },
                ExitCode::from(4),
            ),
        ];
        for (err, expected) in &cases {
            assert_eq!(format!("{:?}", ExitCode::from(err)), format!("{:?}", expected));
        }
    }
}
