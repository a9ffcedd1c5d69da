//! Top-level conversation handler.
//!
//! Non-English input is translated to English, run through the brain, and
//! the reply translated back. Translation problems degrade to English rather
//! than failing the turn.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::artifacts::Artifacts;
use crate::brain::{BrainAnalyzer, ContextPacket, IntentClassifier, Reply, ResponseSelector};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::services::{call_with_retry, CallPolicy, HttpTranslator, Translator, WikipediaClient};

/// Language the brain operates in.
pub const PIPELINE_LANGUAGE: &str = "en";

/// Everything produced while answering one message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Detected language of the user's message
    pub language: String,
    pub packet: ContextPacket,
    pub reply: Reply,
}

pub struct Chatbot {
    analyzer: BrainAnalyzer,
    selector: ResponseSelector,
    translator: Option<Arc<dyn Translator>>,
    policy: CallPolicy,
}

impl Chatbot {
    pub fn new(analyzer: BrainAnalyzer, selector: ResponseSelector) -> Self {
        Self {
            analyzer,
            selector,
            translator: None,
            policy: CallPolicy::default(),
        }
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Loads the artifacts from `config.data_dir` and wires the HTTP
    /// collaborators.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let artifacts = Artifacts::load(&config.data_dir)?;
        let policy = CallPolicy::with_timeout(config.lookup_timeout());

        let classifier = IntentClassifier::new(Arc::new(artifacts.model), artifacts.classes)
            .with_threshold(config.threshold);
        let analyzer = BrainAnalyzer::with_defaults(Arc::new(artifacts.vocabulary), classifier)?;

        let wikipedia = WikipediaClient::new(&config.wikipedia_url, config.lookup_timeout())?;
        let selector = ResponseSelector::new(Arc::new(artifacts.taxonomy))
            .with_knowledge(Arc::new(wikipedia))
            .with_policy(policy)
            .with_summary_chars(config.summary_chars)
            .with_fallback_tag(config.fallback_tag.as_str());

        let mut chatbot = Self::new(analyzer, selector).with_policy(policy);
        if let Some(url) = config.translate_url.as_deref() {
            info!("Translation enabled via {}", url);
            let translator =
                HttpTranslator::new(url, config.translate_api_key.clone(), config.lookup_timeout())?;
            chatbot = chatbot.with_translator(Arc::new(translator));
        }
        Ok(chatbot)
    }

    /// Answers `message` and returns only the reply text.
    pub async fn respond(&self, message: &str) -> Result<String, AppError> {
        Ok(self.handle(message).await?.reply.text)
    }

    /// Answers `message`, keeping the pipeline trace.
    ///
    /// # Errors
    /// Only pipeline errors surface (`UnknownIntent`, `Model`). Translation
    /// and knowledge lookup failures are recovered locally.
    #[instrument(skip(self, message))]
    pub async fn handle(&self, message: &str) -> Result<Turn, AppError> {
        let language = self.detect_language(message).await;
        let foreign = !language.eq_ignore_ascii_case(PIPELINE_LANGUAGE);

        let english = if foreign {
            self.translate(message, PIPELINE_LANGUAGE)
                .await
                .unwrap_or_else(|| message.to_string())
        } else {
            message.to_string()
        };

        let packet = self.analyzer.analyze(&english)?;
        let mut reply = self.selector.select(&packet.classification).await?;

        if foreign {
            if let Some(translated) = self.translate(&reply.text, &language).await {
                reply.text = translated;
            }
        }

        Ok(Turn {
            language,
            packet,
            reply,
        })
    }

    async fn detect_language(&self, text: &str) -> String {
        let Some(translator) = self.translator.as_ref() else {
            return PIPELINE_LANGUAGE.to_string();
        };
        let detected = call_with_retry(self.policy, "language detection", || {
            let translator = Arc::clone(translator);
            let text = text.to_string();
            async move { translator.detect(&text).await }
        })
        .await;

        match detected {
            Ok(language) => language,
            Err(e) => {
                warn!("Language detection failed, assuming English: {}", e);
                PIPELINE_LANGUAGE.to_string()
            }
        }
    }

    /// `None` when translation is unavailable; the caller keeps the original.
    async fn translate(&self, text: &str, target: &str) -> Option<String> {
        let translator = self.translator.as_ref()?;
        let translated = call_with_retry(self.policy, "translation", || {
            let translator = Arc::clone(translator);
            let text = text.to_string();
            let target = target.to_string();
            async move { translator.translate(&text, &target).await }
        })
        .await;

        match translated {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Translation to '{}' failed, keeping original text: {}", target, e);
                None
            }
        }
    }
}
