use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Empty aggregation: {0}")]
    EmptyAggregation(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Fmt(#[from] std::fmt::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DashError {
    pub fn missing_column(name: &str) -> Self {
        DashError::SchemaMismatch(format!("missing column '{name}'"))
    }
}
