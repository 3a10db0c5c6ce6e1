use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(
        "shape mismatch: expected {expected_rows}x{expected_cols} matrix, got {actual_rows} rows (row widths {actual_cols:?})"
    )]
    ShapeMismatch {
        expected_rows: usize,
        expected_cols: usize,
        actual_rows: usize,
        actual_cols: Vec<usize>,
    },

    #[error("invalid sort key: {0} (expected followers, engagement or performanceScore)")]
    InvalidSortKey(String),

    #[error("unknown {kind}: {value}")]
    UnknownToken { kind: &'static str, value: String },

    #[error("data source error: {0}")]
    Source(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    pub fn unknown_token(kind: &'static str, value: &str) -> Self {
        DashboardError::UnknownToken {
            kind,
            value: value.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
