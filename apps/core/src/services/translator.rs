use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::traits::Translator;
use super::ServiceError;
use crate::error::AppError;

#[derive(Debug, Serialize)]
struct DetectRequest<'a> {
    q: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct Detection {
    language: String,
    #[serde(default)]
    confidence: f32,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateResponse {
    translated_text: String,
}

/// Translator speaking the LibreTranslate HTTP API (`/detect`, `/translate`).
pub struct HttpTranslator {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpTranslator {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url)?;
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn endpoint(&self, name: &str) -> Result<Url, ServiceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::Protocol(format!("'{}' cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .push(name);
        Ok(url)
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn detect(&self, text: &str) -> Result<String, ServiceError> {
        let body = DetectRequest {
            q: text,
            api_key: self.api_key.as_deref(),
        };
        let detections: Vec<Detection> = self
            .client
            .post(self.endpoint("detect")?)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let best = detections
            .into_iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
            .ok_or_else(|| ServiceError::Protocol("empty language detection".to_string()))?;
        debug!("Detected language '{}' ({:.1})", best.language, best.confidence);
        Ok(best.language)
    }

    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, ServiceError> {
        let body = TranslateRequest {
            q: text,
            source: "auto",
            target: target_lang,
            format: "text",
            api_key: self.api_key.as_deref(),
        };
        let response: TranslateResponse = self
            .client
            .post(self.endpoint("translate")?)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.translated_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_are_joined_under_base_path() {
        let translator =
            HttpTranslator::new("http://localhost:5000/libre", None, Duration::from_secs(1)).unwrap();
        assert_eq!(
            translator.endpoint("detect").unwrap().as_str(),
            "http://localhost:5000/libre/detect"
        );
        assert_eq!(
            translator.endpoint("translate").unwrap().as_str(),
            "http://localhost:5000/libre/translate"
        );
    }

    #[test]
    fn test_api_key_is_omitted_when_absent() {
        let body = DetectRequest {
            q: "hola",
            api_key: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "q": "hola" }));
    }
}
