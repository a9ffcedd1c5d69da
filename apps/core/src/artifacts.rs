//! Loading of the trained artifacts from the data directory.
//!
//! - `words.json`: vocabulary, a JSON array of lemmas
//! - `classes.json`: intent tags, aligned with the model's outputs
//! - `intents.json`: `{"intents": [{"tag", "patterns", "responses"}]}`
//! - `model.json`: dense network weights

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::brain::intent::{IntentModel, IntentTag};
use crate::brain::model::DenseNetwork;
use crate::brain::response::{IntentRecord, IntentTaxonomy};
use crate::brain::vectorizer::Vocabulary;
use crate::error::AppError;

pub const WORDS_FILE: &str = "words.json";
pub const CLASSES_FILE: &str = "classes.json";
pub const INTENTS_FILE: &str = "intents.json";
pub const MODEL_FILE: &str = "model.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentDocument {
    pub intents: Vec<IntentRecord>,
}

/// Everything the pipeline needs, checked for mutual consistency.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub vocabulary: Vocabulary,
    pub classes: Vec<IntentTag>,
    pub taxonomy: IntentTaxonomy,
    pub model: DenseNetwork,
}

impl Artifacts {
    /// Loads all four artifacts from `dir`.
    ///
    /// # Errors
    /// `AppError::Io` for unreadable files, `AppError::Validation` for
    /// malformed content and `AppError::Model` when the network does not fit
    /// the vocabulary or the class list.
    pub fn load(dir: &Path) -> Result<Self, AppError> {
        let vocabulary = load_vocabulary(&dir.join(WORDS_FILE))?;
        let classes = load_classes(&dir.join(CLASSES_FILE))?;
        let taxonomy = load_taxonomy(&dir.join(INTENTS_FILE))?;
        let model = load_model(&dir.join(MODEL_FILE))?;

        let artifacts = Self {
            vocabulary,
            classes,
            taxonomy,
            model,
        };
        artifacts.check_consistency()?;

        info!(
            "Loaded artifacts from {}: {} terms, {} classes, {} intents",
            dir.display(),
            artifacts.vocabulary.len(),
            artifacts.classes.len(),
            artifacts.taxonomy.len()
        );
        Ok(artifacts)
    }

    fn check_consistency(&self) -> Result<(), AppError> {
        if self.model.input_width() != self.vocabulary.len() {
            return Err(AppError::Model(format!(
                "model expects {} inputs but the vocabulary has {} terms",
                self.model.input_width(),
                self.vocabulary.len()
            )));
        }
        if self.model.output_width() != self.classes.len() {
            return Err(AppError::Model(format!(
                "model produces {} outputs but there are {} classes",
                self.model.output_width(),
                self.classes.len()
            )));
        }
        // Surfaced as UnknownIntent if the classifier ever picks one of these.
        for class in self.classes.iter().filter(|c| !self.taxonomy.contains(c)) {
            warn!("Class '{}' has no entry in {}", class, INTENTS_FILE);
        }
        Ok(())
    }
}

pub fn load_vocabulary(path: &Path) -> Result<Vocabulary, AppError> {
    let terms: Vec<String> = read_json(path)?;
    if terms.is_empty() {
        return Err(AppError::Validation(format!("{} is empty", path.display())));
    }
    Ok(Vocabulary::new(terms))
}

pub fn load_classes(path: &Path) -> Result<Vec<IntentTag>, AppError> {
    let classes: Vec<IntentTag> = read_json(path)?;
    if classes.is_empty() {
        return Err(AppError::Validation(format!("{} is empty", path.display())));
    }
    let mut seen = HashSet::new();
    if let Some(duplicate) = classes.iter().find(|c| !seen.insert(*c)) {
        return Err(AppError::Validation(format!(
            "{} lists '{}' twice",
            path.display(),
            duplicate
        )));
    }
    Ok(classes)
}

pub fn load_taxonomy(path: &Path) -> Result<IntentTaxonomy, AppError> {
    let document: IntentDocument = read_json(path)?;
    IntentTaxonomy::from_records(document.intents)
}

pub fn load_model(path: &Path) -> Result<DenseNetwork, AppError> {
    DenseNetwork::from_json(&read_to_string(path)?)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    serde_json::from_str(&read_to_string(path)?)
        .map_err(|e| AppError::Validation(format!("{}: {}", path.display(), e)))
}

fn read_to_string(path: &Path) -> Result<String, AppError> {
    fs::read_to_string(path)
        .map_err(|e| AppError::Io(io::Error::new(e.kind(), format!("{}: {}", path.display(), e))))
}
