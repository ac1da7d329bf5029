use std::path::PathBuf;

pub use crate::model::{
    ControlPoint, GroundPair, MeasureType, Measurement, MeasurementStatus, MeasurementTable,
    PointTable,
};

/// Common error type for loading and deriving control-network views.
#[derive(thiserror::Error, Debug)]
pub enum CnetError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("invalid input: {message} (available columns: {available:?})")]
    InvalidInput {
        message: String,
        available: Vec<String>,
    },
    #[error(
        "coordinate conversion failed for every image (attempted: {attempted:?}, unresolved serials: {unresolved:?})"
    )]
    Conversion {
        attempted: Vec<PathBuf>,
        unresolved: Vec<String>,
    },
    #[error("reader failure for {}: {message}", .path.display())]
    Reader { path: PathBuf, message: String },
    #[error("external tool failure: {0}")]
    Tool(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type CnetResult<T> = Result<T, CnetError>;

impl CnetError {
    pub fn invalid_input(message: impl Into<String>, available: &[String]) -> Self {
        CnetError::InvalidInput {
            message: message.into(),
            available: available.to_vec(),
        }
    }
}
