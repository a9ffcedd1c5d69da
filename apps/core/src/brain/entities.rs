//! Entity generalization.
//!
//! Replaces named entities with one fixed exemplar per category so that any
//! person, place, organization or number lands on a vocabulary term the
//! classifier was trained on.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::services::EntityRecognizer;

/// Entity categories the generalizer knows how to replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityCategory {
    Person,
    /// Geopolitical entities: countries, cities, regions.
    Place,
    Organization,
    /// Cardinal numbers, written with digits or words.
    Number,
}

impl EntityCategory {
    /// The canonical stand-in substituted for every span of this category.
    pub fn exemplar(&self) -> &'static str {
        match self {
            EntityCategory::Person => "John",
            EntityCategory::Place => "Canada",
            EntityCategory::Organization => "Microsoft",
            EntityCategory::Number => "three",
        }
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityCategory::Person => "PERSON",
            EntityCategory::Place => "PLACE",
            EntityCategory::Organization => "ORGANIZATION",
            EntityCategory::Number => "NUMBER",
        };
        f.write_str(label)
    }
}

/// A detected entity: byte range `start..end` into the recognizer's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub start: usize,
    pub end: usize,
    pub category: EntityCategory,
}

impl EntitySpan {
    pub fn new(start: usize, end: usize, category: EntityCategory) -> Self {
        Self {
            start,
            end,
            category,
        }
    }
}

/// Substitutes entity spans with their category exemplar.
#[derive(Clone, Default)]
pub struct EntityGeneralizer {
    recognizer: Option<Arc<dyn EntityRecognizer>>,
}

impl EntityGeneralizer {
    pub fn new(recognizer: Arc<dyn EntityRecognizer>) -> Self {
        Self {
            recognizer: Some(recognizer),
        }
    }

    /// A generalizer with no recognizer: every input passes through unchanged.
    pub fn disabled() -> Self {
        Self { recognizer: None }
    }

    /// Replaces each entity span with its exemplar; other tokens pass through
    /// and everything is re-joined with single spaces.
    ///
    /// Never fails: if the recognizer is missing or errors, `text` is returned
    /// untouched.
    pub fn generalize(&self, text: &str) -> String {
        let Some(recognizer) = self.recognizer.as_ref() else {
            return text.to_string();
        };

        let spans = match recognizer.detect_entities(text) {
            Ok(spans) => valid_spans(text, spans),
            Err(e) => {
                warn!("Entity detection unavailable, passing text through: {}", e);
                return text.to_string();
            }
        };

        let mut tokens: Vec<&str> = Vec::new();
        let mut cursor = 0;
        for span in &spans {
            debug!(
                "Generalizing {} '{}' -> '{}'",
                span.category,
                &text[span.start..span.end],
                span.category.exemplar()
            );
            tokens.extend(text[cursor..span.start].split_whitespace());
            tokens.push(span.category.exemplar());
            cursor = span.end;
        }
        tokens.extend(text[cursor..].split_whitespace());

        tokens.join(" ")
    }
}

/// Orders spans and drops the ones that cannot be applied to `text`.
fn valid_spans(text: &str, mut spans: Vec<EntitySpan>) -> Vec<EntitySpan> {
    spans.sort_by_key(|span| (span.start, span.end));

    let mut kept: Vec<EntitySpan> = Vec::with_capacity(spans.len());
    let mut last_end = 0;
    for span in spans {
        let in_bounds = span.start < span.end
            && span.end <= text.len()
            && text.is_char_boundary(span.start)
            && text.is_char_boundary(span.end);
        if !in_bounds {
            warn!("Dropping out-of-bounds entity span {:?}", span);
            continue;
        }
        if span.start < last_end {
            warn!("Dropping overlapping entity span {:?}", span);
            continue;
        }
        last_end = span.end;
        kept.push(span);
    }
    kept
}
