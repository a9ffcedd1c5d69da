use std::io;
use thiserror::Error;

use crate::services::ServiceError;

/// Application-wide error type for the inference pipeline and its artifacts.
#[derive(Debug, Error)]
pub enum AppError {
    /// The classifier produced a tag that the intent taxonomy does not know.
    /// Taxonomy and classifier are out of sync; never retried.
    #[error("Unknown intent: '{0}' is not present in the taxonomy")]
    UnknownIntent(String),

    /// The model artifact does not fit the vocabulary or class list, or
    /// inference itself failed.
    #[error("Model error: {0}")]
    Model(String),

    /// Represents standard input/output errors (artifact loading, terminal I/O).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Represents data validation errors (malformed artifacts, invalid records).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Represents configuration-related errors (e.g. unparseable environment variables).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors from an external collaborator that were not recovered locally.
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        match self {
            AppError::UnknownIntent(s) => AppError::UnknownIntent(s.clone()),
            AppError::Model(s) => AppError::Model(s.clone()),
            AppError::Io(e) => AppError::Io(io::Error::new(e.kind(), e.to_string())),
            AppError::Validation(s) => AppError::Validation(s.clone()),
            AppError::Config(s) => AppError::Config(s.clone()),
            AppError::Service(e) => AppError::Service(e.clone()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON error: {}", err))
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Config(format!("URL parse error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Service(ServiceError::from(err))
    }
}

impl From<ndarray::ShapeError> for AppError {
    fn from(err: ndarray::ShapeError) -> Self {
        AppError::Model(format!("Shape error: {}", err))
    }
}
