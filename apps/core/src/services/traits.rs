use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ServiceError;
use crate::brain::entities::EntitySpan;

/// A page summary returned by a knowledge source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Plain-text summary of the subject.
    pub summary: String,
    /// Canonical reference link for the subject.
    pub url: String,
}

/// Defines the public interface for a named-entity recognizer.
///
/// Implementations report byte spans into the text they were given. Detection
/// runs on the caller's thread and must not block on I/O.
pub trait EntityRecognizer: Send + Sync {
    /// Detects person, place, organization and number spans in `text`.
    fn detect_entities(&self, text: &str) -> Result<Vec<EntitySpan>, ServiceError>;
}

/// Defines the public interface for an encyclopedia-style knowledge lookup.
#[async_trait]
pub trait KnowledgeSource: Send + Sync + 'static {
    /// Looks up `subject`. `Ok(None)` means the source has no page for it.
    async fn lookup(&self, subject: &str) -> Result<Option<KnowledgeEntry>, ServiceError>;
}

/// Defines the public interface for a language detection and translation service.
#[async_trait]
pub trait Translator: Send + Sync + 'static {
    /// Returns the ISO 639-1 code of the language `text` is written in.
    async fn detect(&self, text: &str) -> Result<String, ServiceError>;

    /// Translates `text` into `target_lang` (ISO 639-1).
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, ServiceError>;
}
