//! Context Packet - trace of one pass through the inference pipeline.
//!
//! Records every intermediate result so a caller can log or inspect how an
//! input was classified.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::intent::{ClassificationResult, IntentScore};

/// Complete context packet from Brain analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextPacket {
    /// Correlates log lines of one request
    pub request_id: Uuid,

    /// English text the pipeline ran on
    pub query: String,

    /// Query after entity generalization
    pub generalized: String,

    /// Normalized lemmas, in input order
    pub tokens: Vec<String>,

    /// Vocabulary terms present in the input
    pub matches: Vec<String>,

    /// Accepted intents, best first
    pub classification: ClassificationResult,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,

    /// Timestamp of analysis
    pub timestamp: DateTime<Utc>,
}

impl ContextPacket {
    /// Create a new empty context packet
    pub fn new(query: String) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            generalized: String::new(),
            query,
            tokens: vec![],
            matches: vec![],
            classification: ClassificationResult::empty(),
            processing_time_ms: 0,
            timestamp: Utc::now(),
        }
    }

    pub fn top_intent(&self) -> Option<&IntentScore> {
        self.classification.top()
    }

    /// Get a summary for logging
    pub fn summary(&self) -> String {
        let intent = match self.top_intent() {
            Some(top) => format!("{} ({:.0}%)", top.tag, top.confidence * 100.0),
            None => "none".to_string(),
        };
        format!(
            "Intent: {}, Candidates: {}, Matched terms: {}, Tokens: {}, Time: {}ms",
            intent,
            self.classification.len(),
            self.matches.len(),
            self.tokens.len(),
            self.processing_time_ms
        )
    }
}
