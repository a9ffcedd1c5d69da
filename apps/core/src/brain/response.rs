//! Response selection: template choice, knowledge augmentation, fallback.

use std::collections::HashMap;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use validator::Validate;

use super::intent::{ClassificationResult, IntentTag};
use crate::error::AppError;
use crate::services::{call_with_retry, CallPolicy, KnowledgeEntry, KnowledgeSource};

/// Intent answered when nothing clears the classification threshold.
pub const DEFAULT_FALLBACK_TAG: &str = "noanswer";

/// Reply used when the fallback intent is missing from the taxonomy.
pub const FALLBACK_MESSAGE: &str = "Sorry, I didn't quite understand that. Could you tell me a bit more?";

/// Characters of the knowledge summary kept in the augmentation block.
pub const DEFAULT_SUMMARY_CHARS: usize = 120;

const AUGMENTATION_HEADER: &str = "\n\nHere is a summary and link:\n";

/// One entry of the intents artifact.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IntentRecord {
    #[validate(length(min = 1))]
    pub tag: String,
    /// Training sentences. Not used at inference time.
    #[serde(default)]
    pub patterns: Vec<String>,
    #[validate(length(min = 1))]
    pub responses: Vec<String>,
}

/// Intent tag -> response templates. Every tag has at least one template.
#[derive(Debug, Clone, Default)]
pub struct IntentTaxonomy {
    responses: HashMap<IntentTag, Vec<String>>,
    order: Vec<IntentTag>,
}

impl IntentTaxonomy {
    /// Validates the records and builds the taxonomy. Empty tags, empty
    /// response lists and duplicate tags are rejected.
    pub fn from_records(records: Vec<IntentRecord>) -> Result<Self, AppError> {
        let mut taxonomy = Self::default();
        for record in records {
            record.validate().map_err(|e| {
                AppError::Validation(format!("intent '{}': {}", record.tag, e))
            })?;
            let tag = IntentTag::new(record.tag);
            if taxonomy.responses.contains_key(&tag) {
                return Err(AppError::Validation(format!("duplicate intent tag '{}'", tag)));
            }
            taxonomy.order.push(tag.clone());
            taxonomy.responses.insert(tag, record.responses);
        }
        Ok(taxonomy)
    }

    pub fn templates(&self, tag: &IntentTag) -> Option<&[String]> {
        self.responses.get(tag).map(Vec::as_slice)
    }

    pub fn contains(&self, tag: &IntentTag) -> bool {
        self.responses.contains_key(tag)
    }

    /// Tags in artifact order.
    pub fn tags(&self) -> &[IntentTag] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Intents whose replies get a knowledge-source summary, and the subject
/// looked up for each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AugmentationTable {
    subjects: HashMap<IntentTag, String>,
}

impl Default for AugmentationTable {
    fn default() -> Self {
        Self::empty()
            .with("major_depression", "depression")
            .with("anxiety", "anxiety")
            .with("positive disorganization", "schizophrenia")
    }
}

impl AugmentationTable {
    pub fn empty() -> Self {
        Self {
            subjects: HashMap::new(),
        }
    }

    pub fn with(mut self, tag: impl Into<IntentTag>, subject: impl Into<String>) -> Self {
        self.subjects.insert(tag.into(), subject.into());
        self
    }

    pub fn subject_for(&self, tag: &IntentTag) -> Option<&str> {
        self.subjects.get(tag).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

/// A reply and how it was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    /// Intent the template came from; `None` for the built-in fallback message.
    pub intent: Option<IntentTag>,
    /// Classifier confidence; `None` on the fallback path.
    pub confidence: Option<f32>,
    /// Knowledge entry appended to `text`, if any.
    pub augmentation: Option<KnowledgeEntry>,
    pub fallback: bool,
}

/// Picks reply templates for classification results.
#[derive(Clone)]
pub struct ResponseSelector {
    taxonomy: Arc<IntentTaxonomy>,
    augmentations: AugmentationTable,
    knowledge: Option<Arc<dyn KnowledgeSource>>,
    policy: CallPolicy,
    summary_chars: usize,
    fallback_tag: IntentTag,
}

impl ResponseSelector {
    pub fn new(taxonomy: Arc<IntentTaxonomy>) -> Self {
        Self {
            taxonomy,
            augmentations: AugmentationTable::default(),
            knowledge: None,
            policy: CallPolicy::default(),
            summary_chars: DEFAULT_SUMMARY_CHARS,
            fallback_tag: IntentTag::new(DEFAULT_FALLBACK_TAG),
        }
    }

    pub fn with_knowledge(mut self, source: Arc<dyn KnowledgeSource>) -> Self {
        self.knowledge = Some(source);
        self
    }

    pub fn with_augmentations(mut self, table: AugmentationTable) -> Self {
        self.augmentations = table;
        self
    }

    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_summary_chars(mut self, chars: usize) -> Self {
        self.summary_chars = chars;
        self
    }

    pub fn with_fallback_tag(mut self, tag: impl Into<IntentTag>) -> Self {
        self.fallback_tag = tag.into();
        self
    }

    pub fn taxonomy(&self) -> &IntentTaxonomy {
        &self.taxonomy
    }

    /// Answers the top-ranked intent of `result` with a random template.
    ///
    /// # Errors
    /// `AppError::UnknownIntent` if the top intent is not in the taxonomy.
    /// Knowledge lookup failures never surface; the block is just omitted.
    pub async fn select(&self, result: &ClassificationResult) -> Result<Reply, AppError> {
        let reply = self.base_reply(result, &mut rand::thread_rng())?;
        Ok(self.augment(reply).await)
    }

    /// [`select`](Self::select) with a caller-supplied random source.
    pub async fn select_with_rng<R: Rng + ?Sized>(
        &self,
        result: &ClassificationResult,
        rng: &mut R,
    ) -> Result<Reply, AppError> {
        let reply = self.base_reply(result, rng)?;
        Ok(self.augment(reply).await)
    }

    fn base_reply<R: Rng + ?Sized>(
        &self,
        result: &ClassificationResult,
        rng: &mut R,
    ) -> Result<Reply, AppError> {
        let Some(top) = result.top() else {
            return Ok(self.fallback_reply(rng));
        };

        let templates = self
            .taxonomy
            .templates(&top.tag)
            .ok_or_else(|| AppError::UnknownIntent(top.tag.to_string()))?;
        let text = templates.choose(rng).cloned().ok_or_else(|| {
            AppError::Validation(format!("intent '{}' has no responses", top.tag))
        })?;

        Ok(Reply {
            text,
            intent: Some(top.tag.clone()),
            confidence: Some(top.confidence),
            augmentation: None,
            fallback: false,
        })
    }

    fn fallback_reply<R: Rng + ?Sized>(&self, rng: &mut R) -> Reply {
        let template = self
            .taxonomy
            .templates(&self.fallback_tag)
            .and_then(|templates| templates.choose(rng));

        match template {
            Some(text) => {
                info!("No intent above threshold, answering with '{}'", self.fallback_tag);
                Reply {
                    text: text.clone(),
                    intent: Some(self.fallback_tag.clone()),
                    confidence: None,
                    augmentation: None,
                    fallback: true,
                }
            }
            None => {
                info!(
                    "No intent above threshold and no '{}' intent, using built-in message",
                    self.fallback_tag
                );
                Reply {
                    text: FALLBACK_MESSAGE.to_string(),
                    intent: None,
                    confidence: None,
                    augmentation: None,
                    fallback: true,
                }
            }
        }
    }

    async fn augment(&self, mut reply: Reply) -> Reply {
        if reply.fallback {
            return reply;
        }
        let Some(subject) = reply
            .intent
            .as_ref()
            .and_then(|tag| self.augmentations.subject_for(tag))
        else {
            return reply;
        };
        let Some(source) = self.knowledge.as_ref() else {
            debug!("No knowledge source configured, skipping '{}'", subject);
            return reply;
        };

        let lookup = call_with_retry(self.policy, "knowledge lookup", || {
            let source = Arc::clone(source);
            let subject = subject.to_string();
            async move { source.lookup(&subject).await }
        })
        .await;

        match lookup {
            Ok(Some(entry)) => {
                let prefix: String = entry.summary.chars().take(self.summary_chars).collect();
                reply.text = format!("{}{}{}\n{}", reply.text, AUGMENTATION_HEADER, prefix, entry.url);
                reply.augmentation = Some(entry);
            }
            Ok(None) => info!("No knowledge entry for '{}'", subject),
            Err(e) => warn!("Knowledge lookup for '{}' failed, replying without it: {}", subject, e),
        }
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::intent::IntentScore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(tag: &str, responses: &[&str]) -> IntentRecord {
        IntentRecord {
            tag: tag.to_string(),
            patterns: vec![],
            responses: responses.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_taxonomy_rejects_empty_responses() {
        let err = IntentTaxonomy::from_records(vec![record("greeting", &[])]).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_taxonomy_rejects_empty_tag() {
        let err = IntentTaxonomy::from_records(vec![record("", &["hi"])]).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_taxonomy_rejects_duplicates() {
        let err = IntentTaxonomy::from_records(vec![
            record("greeting", &["hi"]),
            record("greeting", &["hello"]),
        ])
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_taxonomy_keeps_artifact_order() {
        let taxonomy = IntentTaxonomy::from_records(vec![
            record("b", &["x"]),
            record("a", &["y"]),
        ])
        .unwrap();
        let tags: Vec<&str> = taxonomy.tags().iter().map(IntentTag::as_str).collect();
        assert_eq!(tags, vec!["b", "a"]);
    }

    #[test]
    fn test_default_augmentation_table() {
        let table = AugmentationTable::default();
        assert_eq!(table.len(), 3);
        assert_eq!(table.subject_for(&"major_depression".into()), Some("depression"));
        assert_eq!(table.subject_for(&"anxiety".into()), Some("anxiety"));
        assert_eq!(
            table.subject_for(&"positive disorganization".into()),
            Some("schizophrenia")
        );
        assert_eq!(table.subject_for(&"greeting".into()), None);
    }

    #[tokio::test]
    async fn test_template_is_drawn_from_top_intent() {
        let taxonomy = IntentTaxonomy::from_records(vec![
            record("greeting", &["Hi there", "Hello"]),
            record("small_talk", &["Nice weather"]),
        ])
        .unwrap();
        let selector = ResponseSelector::new(Arc::new(taxonomy));
        let result = ClassificationResult::from_scores(vec![
            IntentScore::new("greeting", 0.81),
            IntentScore::new("small_talk", 0.30),
        ]);

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let reply = selector.select_with_rng(&result, &mut rng).await.unwrap();
            assert!(reply.text == "Hi there" || reply.text == "Hello");
            assert_eq!(reply.intent, Some(IntentTag::new("greeting")));
            assert_eq!(reply.confidence, Some(0.81));
            assert!(!reply.fallback);
        }
    }

    #[tokio::test]
    async fn test_unknown_top_intent() {
        let taxonomy = IntentTaxonomy::from_records(vec![record("small_talk", &["ok"])]).unwrap();
        let selector = ResponseSelector::new(Arc::new(taxonomy));
        let result = ClassificationResult::from_scores(vec![IntentScore::new("greeting", 0.81)]);

        let err = selector.select(&result).await.unwrap_err();
        assert!(matches!(err, AppError::UnknownIntent(tag) if tag == "greeting"));
    }

    #[tokio::test]
    async fn test_fallback_intent_when_present() {
        let taxonomy = IntentTaxonomy::from_records(vec![
            record("noanswer", &["Sorry, can't understand you"]),
            record("greeting", &["Hi"]),
        ])
        .unwrap();
        let selector = ResponseSelector::new(Arc::new(taxonomy));

        let reply = selector.select(&ClassificationResult::empty()).await.unwrap();
        assert!(reply.fallback);
        assert_eq!(reply.text, "Sorry, can't understand you");
        assert_eq!(reply.intent, Some(IntentTag::new("noanswer")));
    }

    #[tokio::test]
    async fn test_builtin_fallback_message() {
        let taxonomy = IntentTaxonomy::from_records(vec![record("greeting", &["Hi"])]).unwrap();
        let selector = ResponseSelector::new(Arc::new(taxonomy)).with_fallback_tag("unknown");

        let reply = selector.select(&ClassificationResult::empty()).await.unwrap();
        assert!(reply.fallback);
        assert_eq!(reply.text, FALLBACK_MESSAGE);
        assert_eq!(reply.intent, None);
    }

    #[tokio::test]
    async fn test_whitelisted_intent_without_source_is_plain() {
        let taxonomy =
            IntentTaxonomy::from_records(vec![record("anxiety", &["Breathe slowly"])]).unwrap();
        let selector = ResponseSelector::new(Arc::new(taxonomy));
        let result = ClassificationResult::from_scores(vec![IntentScore::new("anxiety", 0.9)]);

        let reply = selector.select(&result).await.unwrap();
        assert_eq!(reply.text, "Breathe slowly");
        assert!(reply.augmentation.is_none());
    }
}
