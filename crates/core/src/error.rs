//! Error types for catchflow

use thiserror::Error;

/// Main error type for catchflow operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Unknown hydrologic model: {0:?}")]
    UnknownModel(String),

    #[error("Unresolved pit at ({row}, {col}): no lower neighbor and not an outlet")]
    UnresolvedPit { row: usize, col: usize },

    #[error("Partition error: {0}")]
    Partition(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for catchflow operations
pub type Result<T> = std::result::Result<T, Error>;
