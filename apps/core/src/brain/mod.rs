//! # Brain Module
//!
//! Text-to-intent inference pipeline for the chatbot.
//! Turns raw English input into a ranked list of intents, then into a reply.
//!
//! ## Components
//! - `entities`: Entity generalization (named entities -> fixed exemplars)
//! - `lexicon`: Part-of-speech tagging and lemmatization
//! - `normalizer`: Tokenization and lemma sequences
//! - `vectorizer`: Bag-of-words encoding over the vocabulary
//! - `intent`: Thresholded intent classification
//! - `model`: Dense network inference
//! - `response`: Template selection, augmentation and fallback
//! - `context_packet`: Per-request trace
//! - `analyzer`: Main orchestrator

pub mod analyzer;
pub mod context_packet;
pub mod entities;
pub mod intent;
pub mod lexicon;
pub mod model;
pub mod normalizer;
pub mod response;
pub mod vectorizer;

// Re-export main types for convenience
pub use analyzer::BrainAnalyzer;
pub use context_packet::ContextPacket;
pub use entities::{EntityCategory, EntityGeneralizer, EntitySpan};
pub use intent::{ClassificationResult, IntentClassifier, IntentModel, IntentScore, IntentTag};
pub use lexicon::{Lemmatizer, LexiconTagger, PartOfSpeech, PosTagger, RuleLemmatizer};
pub use model::{DenseNetwork, ExclusiveModel, SerializedModel};
pub use normalizer::Normalizer;
pub use response::{AugmentationTable, IntentRecord, IntentTaxonomy, Reply, ResponseSelector};
pub use vectorizer::{encode, Encoding, FeatureVector, Vocabulary};
