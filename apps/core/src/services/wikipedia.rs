use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use lru::LruCache;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use super::traits::{KnowledgeEntry, KnowledgeSource};
use super::ServiceError;
use crate::error::AppError;

pub const DEFAULT_WIKIPEDIA_URL: &str = "https://en.wikipedia.org/api/rest_v1";

const USER_AGENT: &str = concat!("chatbot-core/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct PageSummary {
    #[serde(default)]
    extract: String,
    content_urls: Option<ContentUrls>,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    desktop: PageUrls,
}

#[derive(Debug, Deserialize)]
struct PageUrls {
    page: String,
}

/// Knowledge lookup backed by the Wikipedia REST `page/summary` endpoint.
///
/// Results (including "no such page") are kept in a small LRU cache so the
/// same subject is fetched once per process.
pub struct WikipediaClient {
    client: Client,
    base_url: Url,
    cache: Mutex<LruCache<String, Option<KnowledgeEntry>>>,
}

impl WikipediaClient {
    const CACHE_SIZE: NonZeroUsize = match NonZeroUsize::new(64) {
        Some(size) => size,
        None => panic!("Cache size must be non-zero"),
    };

    /// Creates a client against `base_url` (e.g. [`DEFAULT_WIKIPEDIA_URL`]).
    ///
    /// `request_timeout` bounds the whole HTTP exchange; callers normally add
    /// their own per-attempt deadline on top.
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url)?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            cache: Mutex::new(LruCache::new(Self::CACHE_SIZE)),
        })
    }

    fn summary_url(&self, subject: &str) -> Result<Url, ServiceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::Protocol(format!("'{}' cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(["page", "summary", subject]);
        Ok(url)
    }

    fn cached(&self, subject: &str) -> Option<Option<KnowledgeEntry>> {
        self.cache
            .lock()
            .ok()
            .and_then(|mut cache| cache.get(subject).cloned())
    }

    fn remember(&self, subject: &str, entry: Option<KnowledgeEntry>) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(subject.to_string(), entry);
        }
    }
}

#[async_trait]
impl KnowledgeSource for WikipediaClient {
    async fn lookup(&self, subject: &str) -> Result<Option<KnowledgeEntry>, ServiceError> {
        if let Some(hit) = self.cached(subject) {
            debug!("Wikipedia cache hit for '{}'", subject);
            return Ok(hit);
        }

        let url = self.summary_url(subject)?;
        info!("Looking up '{}' on Wikipedia", subject);
        let response = self.client.get(url).send().await?;

        let entry = match response.status() {
            StatusCode::NOT_FOUND => None,
            status if status.is_success() => {
                let page: PageSummary = response.json().await?;
                match page.content_urls {
                    Some(urls) if !page.extract.trim().is_empty() => Some(KnowledgeEntry {
                        summary: page.extract,
                        url: urls.desktop.page,
                    }),
                    _ => None,
                }
            }
            status => return Err(ServiceError::Status(status.as_u16())),
        };

        self.remember(subject, entry.clone());
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_url_encodes_subject() {
        let client = WikipediaClient::new(DEFAULT_WIKIPEDIA_URL, Duration::from_secs(1)).unwrap();
        let url = client.summary_url("positive disorganization").unwrap();
        assert_eq!(
            url.as_str(),
            "https://en.wikipedia.org/api/rest_v1/page/summary/positive%20disorganization"
        );
    }

    #[test]
    fn test_summary_url_with_trailing_slash() {
        let client = WikipediaClient::new("http://localhost:9/api/", Duration::from_secs(1)).unwrap();
        let url = client.summary_url("anxiety").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9/api/page/summary/anxiety");
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let result = WikipediaClient::new("not a url", Duration::from_secs(1));
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
