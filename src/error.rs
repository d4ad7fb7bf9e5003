use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("cannot read {path}: {reason}")]
    Unreadable { path: String, reason: String },
    #[error("unsupported input format for {path}: please input a .csv file ({reason})")]
    UnsupportedFormat { path: String, reason: String },
    #[error("malformed record in {path} at line {line}: {reason}")]
    Malformed {
        path: String,
        line: u64,
        reason: String,
    },
    #[error("{table} table has no column named '{column}'")]
    MissingColumn { table: &'static str, column: String },
}

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("stopped by user after {processed} of {total} rows")]
    Stopped { processed: usize, total: usize },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv export error: {0}")]
    Csv(String),
}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        Self::Csv(e.to_string())
    }
}
