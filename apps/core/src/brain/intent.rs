//! Intent classification over bag-of-words feature vectors.
//!
//! The classifier delegates scoring to a pretrained [`IntentModel`] and keeps
//! the intents whose confidence clears the acceptance threshold, best first.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::vectorizer::FeatureVector;
use crate::error::AppError;

/// Minimum confidence (exclusive) for an intent to be reported.
pub const DEFAULT_THRESHOLD: f32 = 0.25;

/// Tag of an intent in the taxonomy, e.g. `"greeting"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntentTag(String);

impl IntentTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IntentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IntentTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// One accepted intent and the model's confidence in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentScore {
    pub tag: IntentTag,
    /// Model probability (0.0 - 1.0)
    pub confidence: f32,
}

impl IntentScore {
    pub fn new(tag: impl Into<IntentTag>, confidence: f32) -> Self {
        Self {
            tag: tag.into(),
            confidence,
        }
    }
}

/// Accepted intents, sorted by descending confidence. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    scores: Vec<IntentScore>,
}

impl ClassificationResult {
    /// Builds a result from already-accepted scores, sorting them. Equal
    /// confidences keep their input order.
    pub fn from_scores(mut scores: Vec<IntentScore>) -> Self {
        scores.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        Self { scores }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn top(&self) -> Option<&IntentScore> {
        self.scores.first()
    }

    pub fn scores(&self) -> &[IntentScore] {
        &self.scores
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }
}

/// Defines the public interface for a pretrained intent model.
///
/// `predict` returns one probability per class, aligned by index with the
/// class list the model was trained against.
pub trait IntentModel: Send + Sync {
    /// Expected feature vector length.
    fn input_width(&self) -> usize;

    fn predict(&self, features: &FeatureVector) -> Result<Vec<f32>, AppError>;
}

/// Thresholded, ranked classification on top of an [`IntentModel`].
#[derive(Clone)]
pub struct IntentClassifier {
    model: Arc<dyn IntentModel>,
    classes: Vec<IntentTag>,
    threshold: f32,
}

impl IntentClassifier {
    pub fn new(model: Arc<dyn IntentModel>, classes: Vec<IntentTag>) -> Self {
        Self {
            model,
            classes,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn classes(&self) -> &[IntentTag] {
        &self.classes
    }

    pub fn input_width(&self) -> usize {
        self.model.input_width()
    }

    /// Scores `features` and keeps intents with confidence strictly above the
    /// threshold. An empty result is a normal outcome, not an error.
    pub fn classify(&self, features: &FeatureVector) -> Result<ClassificationResult, AppError> {
        if features.len() != self.model.input_width() {
            return Err(AppError::Model(format!(
                "feature vector has {} dimensions, model expects {}",
                features.len(),
                self.model.input_width()
            )));
        }

        let probabilities = self.model.predict(features)?;
        if probabilities.len() != self.classes.len() {
            return Err(AppError::Model(format!(
                "model returned {} probabilities for {} classes",
                probabilities.len(),
                self.classes.len()
            )));
        }

        // NaN compares false and is dropped here.
        let accepted = self
            .classes
            .iter()
            .zip(probabilities)
            .filter(|(_, p)| *p > self.threshold)
            .map(|(tag, p)| IntentScore::new(tag.clone(), p))
            .collect();

        let result = ClassificationResult::from_scores(accepted);
        debug!(
            "Classified into {} intent(s), top: {:?}",
            result.len(),
            result.top().map(|s| (s.tag.as_str(), s.confidence))
        );
        Ok(result)
    }
}
