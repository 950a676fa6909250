// Every variant aborts the run; none is recovered locally.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("data source not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("malformed record at line {line}: {message}")]
    MalformedRecord { line: u64, message: String },

    #[error("required field `{field}` is missing or empty at line {line}")]
    InvalidField { field: &'static str, line: u64 },

    #[error("cannot coerce `{value}` in field `{field}` at line {line} to a number")]
    Coercion {
        field: &'static str,
        line: u64,
        value: String,
    },

    #[error("unsupported chart type: {kind}")]
    UnsupportedChart { kind: String },

    #[error("failed to render chart `{chart}`: {message}")]
    Render { chart: String, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
