//! Integration Tests
//!
//! End-to-end conversations: artifacts on disk, the full brain, response
//! selection against a mocked Wikipedia, and translation degrade paths.

use crate::artifacts::{Artifacts, CLASSES_FILE, INTENTS_FILE, MODEL_FILE, WORDS_FILE};
use crate::brain::{BrainAnalyzer, IntentClassifier, IntentTag};
use crate::chatbot::Chatbot;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::services::{CallPolicy, ServiceError, Translator};
use async_trait::async_trait;
use serde_json::json;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::{tempdir, TempDir};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Test Fixtures
// ============================================================================

const VOCABULARY: [&str; 5] = ["hello", "hi", "sad", "depressed", "john"];
const CLASSES: [&str; 3] = ["greeting", "sad", "major_depression"];
/// Class voted for by each vocabulary term.
const VOTES: [usize; 5] = [0, 0, 1, 2, 0];

const GREETING_REPLY: &str = "Hi there. How are you feeling today?";
const SAD_REPLY: &str = "I'm sorry to hear that. I'm here for you.";
const DEPRESSION_REPLY: &str = "It helps to talk about it.";
const NOANSWER_REPLY: &str = "Sorry, can't understand you";

fn write_json(dir: &Path, name: &str, value: serde_json::Value) {
    std::fs::write(dir.join(name), value.to_string()).expect("Failed to write artifact");
}

fn write_artifacts(dir: &Path) {
    write_json(dir, WORDS_FILE, json!(VOCABULARY));
    write_json(dir, CLASSES_FILE, json!(CLASSES));
    write_json(
        dir,
        INTENTS_FILE,
        json!({ "intents": [
            { "tag": "greeting", "patterns": ["Hi", "Hello"], "responses": [GREETING_REPLY] },
            { "tag": "sad", "patterns": ["I am sad"], "responses": [SAD_REPLY] },
            { "tag": "major_depression", "patterns": ["I feel depressed"], "responses": [DEPRESSION_REPLY] },
            { "tag": "noanswer", "patterns": [], "responses": [NOANSWER_REPLY] }
        ]}),
    );

    let weights: Vec<Vec<f32>> = VOTES
        .iter()
        .map(|&c| (0..CLASSES.len()).map(|j| if j == c { 4.0 } else { 0.0 }).collect())
        .collect();
    write_json(
        dir,
        MODEL_FILE,
        json!({ "layers": [
            { "weights": weights, "bias": [0.0, 0.0, 0.0], "activation": "softmax" }
        ]}),
    );
}

async fn wikipedia() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page/summary/depression"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "extract": "Depression is a mental state of low mood and aversion to activity.",
            "content_urls": { "desktop": { "page": "https://en.wikipedia.org/wiki/Depression" } }
        })))
        .mount(&server)
        .await;
    server
}

/// Chatbot over fresh artifacts. Threshold 0.5 so unmatched input (1/3 per
/// class) falls through to the fallback intent.
async fn chatbot(server: &MockServer) -> (Chatbot, TempDir) {
    let dir = tempdir().expect("Failed to create temp dir");
    write_artifacts(dir.path());
    let config = AppConfig {
        data_dir: dir.path().to_path_buf(),
        threshold: 0.5,
        wikipedia_url: server.uri(),
        lookup_timeout_ms: 500,
        ..AppConfig::default()
    };
    let chatbot = Chatbot::from_config(&config).expect("Failed to build chatbot");
    (chatbot, dir)
}

/// Translator with scripted answers that records every call.
struct ScriptedTranslator {
    detected: Result<String, ServiceError>,
    inbound: Result<String, ServiceError>,
    outbound: Result<String, ServiceError>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedTranslator {
    fn spanish() -> Self {
        Self {
            detected: Ok("es".to_string()),
            inbound: Ok("Hello".to_string()),
            outbound: Ok("Hola. ¿Cómo te sientes hoy?".to_string()),
            calls: Mutex::new(vec![]),
        }
    }

    fn translations(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for ScriptedTranslator {
    async fn detect(&self, _text: &str) -> Result<String, ServiceError> {
        self.detected.clone()
    }

    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, ServiceError> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), target_lang.to_string()));
        if target_lang == "en" {
            self.inbound.clone()
        } else {
            self.outbound.clone()
        }
    }
}

async fn translated_chatbot(server: &MockServer, translator: Arc<ScriptedTranslator>) -> (Chatbot, TempDir) {
    let (chatbot, dir) = chatbot(server).await;
    let chatbot = chatbot
        .with_translator(translator)
        .with_policy(CallPolicy::with_timeout(Duration::from_millis(200)));
    (chatbot, dir)
}

// ============================================================================
// English Conversations
// ============================================================================

#[cfg(test)]
mod conversation_tests {
    use super::*;

    #[tokio::test]
    async fn test_greeting_round_trip() {
        let server = wikipedia().await;
        let (chatbot, _dir) = chatbot(&server).await;

        let turn = chatbot.handle("Hello!").await.unwrap();
        assert_eq!(turn.language, "en");
        assert_eq!(turn.reply.text, GREETING_REPLY);
        assert_eq!(turn.reply.intent, Some(IntentTag::new("greeting")));
        assert_eq!(turn.packet.matches, vec!["hello"]);
    }

    #[tokio::test]
    async fn test_entities_are_generalized_before_classification() {
        let server = wikipedia().await;
        let (chatbot, _dir) = chatbot(&server).await;

        // "Sarah" becomes "John", which votes for greeting.
        let turn = chatbot.handle("Sarah").await.unwrap();
        assert_eq!(turn.packet.generalized, "John");
        assert_eq!(turn.reply.text, GREETING_REPLY);
    }

    #[tokio::test]
    async fn test_depression_reply_is_augmented() {
        let server = wikipedia().await;
        let (chatbot, _dir) = chatbot(&server).await;

        let reply = chatbot.respond("I have been feeling depressed").await.unwrap();
        assert_eq!(
            reply,
            "It helps to talk about it.\n\nHere is a summary and link:\n\
             Depression is a mental state of low mood and aversion to activity.\n\
             https://en.wikipedia.org/wiki/Depression"
        );
    }

    #[tokio::test]
    async fn test_wikipedia_down_still_answers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;
        let (chatbot, _dir) = chatbot(&server).await;

        let reply = chatbot.respond("so depressed").await.unwrap();
        assert_eq!(reply, DEPRESSION_REPLY);
    }

    #[tokio::test]
    async fn test_unmatched_input_gets_fallback() {
        let server = wikipedia().await;
        let (chatbot, _dir) = chatbot(&server).await;

        let turn = chatbot.handle("qwerty asdf").await.unwrap();
        assert!(turn.packet.classification.is_empty());
        assert!(turn.reply.fallback);
        assert_eq!(turn.reply.text, NOANSWER_REPLY);
    }

    #[tokio::test]
    async fn test_concurrent_turns_share_one_chatbot() {
        let server = wikipedia().await;
        let (chatbot, _dir) = chatbot(&server).await;
        let chatbot = Arc::new(chatbot);

        let handles: Vec<_> = ["hi", "I am sad", "hello", "sad sad"]
            .into_iter()
            .map(|message| {
                let chatbot = Arc::clone(&chatbot);
                tokio::spawn(async move { chatbot.respond(message).await })
            })
            .collect();

        let mut replies = Vec::new();
        for handle in handles {
            replies.push(handle.await.unwrap().unwrap());
        }
        assert_eq!(replies, vec![GREETING_REPLY, SAD_REPLY, GREETING_REPLY, SAD_REPLY]);
    }
}

// ============================================================================
// Translation
// ============================================================================

#[cfg(test)]
mod translation_tests {
    use super::*;

    #[tokio::test]
    async fn test_foreign_message_is_translated_both_ways() {
        let server = wikipedia().await;
        let translator = Arc::new(ScriptedTranslator::spanish());
        let (chatbot, _dir) = translated_chatbot(&server, translator.clone()).await;

        let turn = chatbot.handle("Hola").await.unwrap();
        assert_eq!(turn.language, "es");
        assert_eq!(turn.packet.query, "Hello");
        assert_eq!(turn.reply.text, "Hola. ¿Cómo te sientes hoy?");
        assert_eq!(
            translator.translations(),
            vec![
                ("Hola".to_string(), "en".to_string()),
                (GREETING_REPLY.to_string(), "es".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_english_message_is_not_translated() {
        let server = wikipedia().await;
        let translator = Arc::new(ScriptedTranslator {
            detected: Ok("en".to_string()),
            ..ScriptedTranslator::spanish()
        });
        let (chatbot, _dir) = translated_chatbot(&server, translator.clone()).await;

        let reply = chatbot.respond("hi").await.unwrap();
        assert_eq!(reply, GREETING_REPLY);
        assert!(translator.translations().is_empty());
    }

    #[tokio::test]
    async fn test_detection_failure_assumes_english() {
        let server = wikipedia().await;
        let translator = Arc::new(ScriptedTranslator {
            detected: Err(ServiceError::Unavailable("down".to_string())),
            ..ScriptedTranslator::spanish()
        });
        let (chatbot, _dir) = translated_chatbot(&server, translator.clone()).await;

        let turn = chatbot.handle("hello").await.unwrap();
        assert_eq!(turn.language, "en");
        assert_eq!(turn.reply.text, GREETING_REPLY);
        assert!(translator.translations().is_empty());
    }

    #[tokio::test]
    async fn test_inbound_failure_classifies_raw_text() {
        let server = wikipedia().await;
        let translator = Arc::new(ScriptedTranslator {
            inbound: Err(ServiceError::Timeout("slow".to_string())),
            ..ScriptedTranslator::spanish()
        });
        let (chatbot, _dir) = translated_chatbot(&server, translator.clone()).await;

        let turn = chatbot.handle("hola, estoy sad").await.unwrap();
        assert_eq!(turn.packet.query, "hola, estoy sad");
        assert_eq!(turn.reply.intent, Some(IntentTag::new("sad")));
        // One retry inbound, then the outbound translation.
        let targets: Vec<String> = translator.translations().into_iter().map(|(_, t)| t).collect();
        assert_eq!(targets, vec!["en", "en", "es"]);
    }

    #[tokio::test]
    async fn test_outbound_failure_returns_english_reply() {
        let server = wikipedia().await;
        let translator = Arc::new(ScriptedTranslator {
            outbound: Err(ServiceError::Status(502)),
            ..ScriptedTranslator::spanish()
        });
        let (chatbot, _dir) = translated_chatbot(&server, translator).await;

        let reply = chatbot.respond("Hola").await.unwrap();
        assert_eq!(reply, GREETING_REPLY);
    }
}

// ============================================================================
// Startup Failures
// ============================================================================

#[cfg(test)]
mod startup_tests {
    use super::*;

    #[test]
    fn test_missing_data_dir() {
        let config = AppConfig {
            data_dir: "/definitely/not/here".into(),
            ..AppConfig::default()
        };
        let err = Chatbot::from_config(&config).err().expect("startup should fail");
        assert!(matches!(err, AppError::Io(_)));
    }

    #[test]
    fn test_model_vocabulary_drift() {
        let dir = tempdir().unwrap();
        write_artifacts(dir.path());
        write_json(dir.path(), WORDS_FILE, json!(["hello", "sad"]));

        let config = AppConfig {
            data_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        let err = Chatbot::from_config(&config).err().expect("startup should fail");
        assert!(matches!(err, AppError::Model(_)));
    }

    #[test]
    fn test_bundled_data_is_consistent() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
        let artifacts = Artifacts::load(&dir).unwrap();
        for class in &artifacts.classes {
            assert!(artifacts.taxonomy.contains(class), "'{}' has no templates", class);
        }

        let classifier = IntentClassifier::new(Arc::new(artifacts.model), artifacts.classes);
        let brain = BrainAnalyzer::with_defaults(Arc::new(artifacts.vocabulary), classifier).unwrap();

        let top = |text: &str| {
            brain
                .analyze(text)
                .unwrap()
                .top_intent()
                .map(|s| s.tag.to_string())
        };
        assert_eq!(top("Hello there").as_deref(), Some("greeting"));
        assert_eq!(top("I can't sleep at night").as_deref(), Some("sleep"));
        assert_eq!(top("I hear voices").as_deref(), Some("positive disorganization"));
    }
}
