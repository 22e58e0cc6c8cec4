use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(String),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Workbook {0} has no worksheet with data")]
    EmptyWorkbook(String),

    #[error("Unsupported data file format: {0}")]
    UnsupportedFormat(String),

    #[error("Required column missing: {0}")]
    MissingColumn(String),

    #[error("Malformed ORDERDATE at row {row}: {value:?}")]
    MalformedDate { row: usize, value: String },

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<polars::error::PolarsError> for DashboardError {
    fn from(err: polars::error::PolarsError) -> Self {
        DashboardError::Polars(err.to_string())
    }
}

impl From<calamine::Error> for DashboardError {
    fn from(err: calamine::Error) -> Self {
        DashboardError::Workbook(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
