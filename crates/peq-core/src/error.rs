//! Error types for the EQ core
//!
//! Design errors are raised on the audio thread, so their variants carry
//! only static text and plain numbers.

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum PeqError {
    #[error("Invalid parameter: {what} = {value}")]
    InvalidParameter { what: &'static str, value: f64 },

    #[error("Numeric degeneracy: {what} produced non-finite coefficients")]
    NumericDegeneracy { what: &'static str },

    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(f64),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias
pub type PeqResult<T> = Result<T, PeqError>;
