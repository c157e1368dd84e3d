//! Error handling for ETo processing operations.
//!
//! Only configuration problems are errors. Data-quality degradations are
//! resolved with fallbacks and undefined numeric results are `None`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Config file decode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Reference column '{column}' not found for station {station}")]
    MissingReferenceColumn { column: String, station: String },

    #[error("Station {station} is missing required metadata: {field}")]
    MissingStationMetadata { station: String, field: String },

    #[error("Unknown station: {name}")]
    UnknownStation { name: String },

    #[error("Required column '{column}' not found")]
    MissingColumn { column: String },

    #[error("Input not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Invalid table format in file: {path} - {reason}")]
    InvalidFormat { path: PathBuf, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl EtoError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtoError>;
