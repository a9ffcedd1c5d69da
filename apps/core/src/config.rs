//! Environment-driven configuration.
//!
//! Every setting has a default; `.env` in the working directory is read
//! first when present.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::brain::intent::DEFAULT_THRESHOLD;
use crate::brain::response::{DEFAULT_FALLBACK_TAG, DEFAULT_SUMMARY_CHARS};
use crate::error::AppError;
use crate::services::wikipedia::DEFAULT_WIKIPEDIA_URL;

pub const ENV_DATA_DIR: &str = "CHATBOT_DATA_DIR";
pub const ENV_THRESHOLD: &str = "CHATBOT_THRESHOLD";
pub const ENV_FALLBACK_TAG: &str = "CHATBOT_FALLBACK_TAG";
pub const ENV_SUMMARY_CHARS: &str = "CHATBOT_SUMMARY_CHARS";
pub const ENV_LOOKUP_TIMEOUT_MS: &str = "CHATBOT_LOOKUP_TIMEOUT_MS";
pub const ENV_WIKIPEDIA_URL: &str = "CHATBOT_WIKIPEDIA_URL";
pub const ENV_TRANSLATE_URL: &str = "CHATBOT_TRANSLATE_URL";
pub const ENV_TRANSLATE_API_KEY: &str = "CHATBOT_TRANSLATE_API_KEY";
pub const ENV_LOG_FORMAT: &str = "CHATBOT_LOG_FORMAT";

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 3000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    /// Bunyan-formatted JSON lines
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}' (expected pretty or json)", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Directory holding words.json, classes.json, intents.json, model.json
    pub data_dir: PathBuf,
    #[validate(range(min = 0.0, max = 1.0))]
    pub threshold: f32,
    #[validate(length(min = 1))]
    pub fallback_tag: String,
    #[validate(range(min = 1))]
    pub summary_chars: usize,
    #[validate(range(min = 1))]
    pub lookup_timeout_ms: u64,
    #[validate(url)]
    pub wikipedia_url: String,
    /// Translation is disabled when unset
    #[validate(url)]
    pub translate_url: Option<String>,
    #[serde(skip_serializing)]
    pub translate_api_key: Option<String>,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            threshold: DEFAULT_THRESHOLD,
            fallback_tag: DEFAULT_FALLBACK_TAG.to_string(),
            summary_chars: DEFAULT_SUMMARY_CHARS,
            lookup_timeout_ms: DEFAULT_LOOKUP_TIMEOUT_MS,
            wikipedia_url: DEFAULT_WIKIPEDIA_URL.to_string(),
            translate_url: None,
            translate_api_key: None,
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Reads `.env` if present, then the process environment.
    pub fn load() -> Result<Self, AppError> {
        dotenv::dotenv().ok();
        Self::from_env()
    }

    /// Builds the configuration from the process environment only.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Blank values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let config = Self {
            data_dir: get(ENV_DATA_DIR).map(PathBuf::from).unwrap_or(defaults.data_dir),
            threshold: parse(ENV_THRESHOLD, get(ENV_THRESHOLD), defaults.threshold)?,
            fallback_tag: get(ENV_FALLBACK_TAG).unwrap_or(defaults.fallback_tag),
            summary_chars: parse(ENV_SUMMARY_CHARS, get(ENV_SUMMARY_CHARS), defaults.summary_chars)?,
            lookup_timeout_ms: parse(
                ENV_LOOKUP_TIMEOUT_MS,
                get(ENV_LOOKUP_TIMEOUT_MS),
                defaults.lookup_timeout_ms,
            )?,
            wikipedia_url: get(ENV_WIKIPEDIA_URL).unwrap_or(defaults.wikipedia_url),
            translate_url: get(ENV_TRANSLATE_URL),
            translate_api_key: get(ENV_TRANSLATE_API_KEY),
            log_format: parse(ENV_LOG_FORMAT, get(ENV_LOG_FORMAT), defaults.log_format)?,
        };

        if !config.threshold.is_finite() {
            return Err(AppError::Config(format!(
                "{} must be a finite number, got {}",
                ENV_THRESHOLD, config.threshold
            )));
        }
        config
            .validate()
            .map_err(|e| AppError::Config(format!("Invalid configuration: {}", e)))?;
        Ok(config)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    pub fn translation_enabled(&self) -> bool {
        self.translate_url.is_some()
    }
}

fn parse<T>(key: &str, raw: Option<String>, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("{}='{}': {}", key, raw, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<AppConfig, AppError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.threshold, 0.25);
        assert_eq!(config.fallback_tag, "noanswer");
        assert_eq!(config.summary_chars, 120);
        assert_eq!(config.lookup_timeout(), Duration::from_secs(3));
        assert!(!config.translation_enabled());
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = from_pairs(&[(ENV_TRANSLATE_URL, "  "), (ENV_THRESHOLD, "")]).unwrap();
        assert!(config.translate_url.is_none());
        assert_eq!(config.threshold, 0.25);
    }

    #[test]
    fn test_unparseable_value_is_config_error() {
        let err = from_pairs(&[(ENV_SUMMARY_CHARS, "lots")]).unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains(ENV_SUMMARY_CHARS)));
    }

    #[test]
    fn test_out_of_range_threshold_is_config_error() {
        let err = from_pairs(&[(ENV_THRESHOLD, "1.5")]).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_non_finite_threshold_is_config_error() {
        for raw in ["NaN", "inf", "-inf"] {
            let err = from_pairs(&[(ENV_THRESHOLD, raw)]).unwrap_err();
            assert!(matches!(err, AppError::Config(msg) if msg.contains(ENV_THRESHOLD)), "{}", raw);
        }
    }

    #[test]
    fn test_invalid_url_is_config_error() {
        let err = from_pairs(&[(ENV_TRANSLATE_URL, "not a url")]).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
