//! Brain Analyzer - runs the inference pipeline for one input.
//!
//! Entity generalization, normalization, bag-of-words encoding and intent
//! classification, in that order. All state is read-only after construction.

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

use super::context_packet::ContextPacket;
use super::entities::EntityGeneralizer;
use super::intent::IntentClassifier;
use super::normalizer::Normalizer;
use super::vectorizer::{encode, Vocabulary};
use crate::error::AppError;
use crate::services::GazetteerRecognizer;

/// Main Brain analyzer that orchestrates all analysis components
#[derive(Clone)]
pub struct BrainAnalyzer {
    generalizer: EntityGeneralizer,
    normalizer: Normalizer,
    vocabulary: Arc<Vocabulary>,
    classifier: IntentClassifier,
}

impl BrainAnalyzer {
    /// Assembles an analyzer, checking that the model consumes vectors of the
    /// vocabulary's length.
    pub fn new(
        generalizer: EntityGeneralizer,
        normalizer: Normalizer,
        vocabulary: Arc<Vocabulary>,
        classifier: IntentClassifier,
    ) -> Result<Self, AppError> {
        if vocabulary.len() != classifier.input_width() {
            return Err(AppError::Model(format!(
                "vocabulary has {} terms but the model expects {} inputs",
                vocabulary.len(),
                classifier.input_width()
            )));
        }
        Ok(Self {
            generalizer,
            normalizer,
            vocabulary,
            classifier,
        })
    }

    /// Gazetteer entity recognition and a normalizer that knows every
    /// vocabulary term as a lemma.
    pub fn with_defaults(
        vocabulary: Arc<Vocabulary>,
        classifier: IntentClassifier,
    ) -> Result<Self, AppError> {
        let generalizer = EntityGeneralizer::new(Arc::new(GazetteerRecognizer::new()));
        let normalizer = Normalizer::for_vocabulary(vocabulary.terms());
        Self::new(generalizer, normalizer, vocabulary, classifier)
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    /// Generalize then normalize: the token sequence the vectorizer sees.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        self.normalizer.normalize(&self.generalizer.generalize(text))
    }

    /// Analyze a query and produce a context packet
    #[instrument(skip(self, query))]
    pub fn analyze(&self, query: &str) -> Result<ContextPacket, AppError> {
        let start = Instant::now();
        let mut packet = ContextPacket::new(query.to_string());

        packet.generalized = self.generalizer.generalize(query);
        packet.tokens = self.normalizer.normalize(&packet.generalized);

        let encoding = encode(&packet.tokens, &self.vocabulary);
        debug!("Found in bag: {:?}", encoding.matches);
        packet.matches = encoding.matches;

        packet.classification = self.classifier.classify(&encoding.vector)?;

        packet.processing_time_ms = start.elapsed().as_millis() as u64;
        packet.timestamp = Utc::now();

        info!(request_id = %packet.request_id, "{}", packet.summary());
        Ok(packet)
    }
}
