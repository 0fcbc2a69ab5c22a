use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Sheet '{sheet}' not found in {source_name}")]
    SheetNotFound { source_name: String, sheet: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Malformed subtable: {0}")]
    Format(String),

    #[error("Lookup error: {0}")]
    Lookup(String),

    #[error("Non-numeric cell at row {row}, column {column}: '{value}'")]
    CellType {
        row: usize,
        column: usize,
        value: String,
    },

    #[error("Daily sample must hold {expected} values, got {actual}")]
    SampleLength { expected: usize, actual: usize },

    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration load error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl From<calamine::Error> for ProcessingError {
    fn from(err: calamine::Error) -> Self {
        ProcessingError::Workbook(err.to_string())
    }
}
