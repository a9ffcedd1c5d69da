//! # Services
//!
//! External collaborators of the inference pipeline. The core only talks to
//! the traits in [`traits`]; the concrete clients live next to them.
//!
//! ## Components
//! - `traits`: `EntityRecognizer`, `KnowledgeSource`, `Translator`
//! - `gazetteer`: local rule/gazetteer entity recognizer
//! - `wikipedia`: knowledge lookup against the Wikipedia REST API
//! - `translator`: LibreTranslate-compatible HTTP translator
//! - `retry`: bounded timeout + single retry for transient failures

pub mod gazetteer;
pub mod retry;
pub mod traits;
pub mod translator;
pub mod wikipedia;

use serde::Serialize;

pub use gazetteer::GazetteerRecognizer;
pub use retry::{call_with_retry, CallPolicy};
pub use traits::{EntityRecognizer, KnowledgeEntry, KnowledgeSource, Translator};
pub use translator::HttpTranslator;
pub use wikipedia::WikipediaClient;

/// Errors raised by external collaborators.
#[derive(Debug, thiserror::Error, Serialize, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The service could not be reached at all.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    /// The call did not complete within its deadline.
    #[error("Service call timed out: {0}")]
    Timeout(String),
    /// The service answered with a non-success HTTP status.
    #[error("Service returned HTTP {0}")]
    Status(u16),
    /// The service answered, but not with what we expected.
    #[error("Unexpected service response: {0}")]
    Protocol(String),
}

impl ServiceError {
    /// Whether a second attempt has a reasonable chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            ServiceError::Unavailable(_) | ServiceError::Timeout(_) => true,
            ServiceError::Status(code) => *code == 429 || *code >= 500,
            ServiceError::Protocol(_) => false,
        }
    }
}

impl From<tokio::time::error::Elapsed> for ServiceError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        ServiceError::Timeout(err.to_string())
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ServiceError::Timeout(err.to_string())
        } else if err.is_decode() {
            ServiceError::Protocol(err.to_string())
        } else if let Some(status) = err.status() {
            ServiceError::Status(status.as_u16())
        } else {
            ServiceError::Unavailable(err.to_string())
        }
    }
}
