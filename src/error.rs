//! Error types shared by the whole calculation core.
use crate::validation::ValidationError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LcaError {
    /// The calculation setup was rejected before any matrix work began.
    #[error("Invalid calculation setup: {}", join_issues(.0))]
    Validation(Vec<ValidationError>),
    /// The product system references records that do not exist.
    #[error("Structural error: {msg}")]
    Structural { msg: String },
    #[error("Matrix is singular or numerically degenerate ({rows}x{cols})")]
    SingularMatrix { rows: usize, cols: usize },
    #[error("Dimension mismatch: {msg}")]
    DimensionMismatch { msg: String },
    #[error("Numeric error: {0}")]
    Numeric(String),
    #[error("Matrix file error: {0}")]
    MatrixFormat(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Calculation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, LcaError>;

impl LcaError {
    pub fn structural(msg: impl Into<String>) -> Self {
        Self::Structural { msg: msg.into() }
    }

    pub fn mismatch(msg: impl Into<String>) -> Self {
        Self::DimensionMismatch { msg: msg.into() }
    }
}

impl From<std::io::Error> for LcaError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

fn join_issues(issues: &[ValidationError]) -> String {
    issues.iter().map(|i| i.message.as_str()).collect::<Vec<_>>().join("; ")
}
