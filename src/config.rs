use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::fetch::LISTING_URL;

#[derive(Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub enum LlmProvider {
    #[default]
    LmStudio,
    OpenAi,
}

impl LlmProvider {
    pub fn base_url(&self) -> &'static str {
        match self {
            LlmProvider::LmStudio => "http://localhost:1234/v1",
            LlmProvider::OpenAi => "https://api.openai.com/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::LmStudio => "local-model",
            LlmProvider::OpenAi => "gpt-4o-mini",
        }
    }
}

/// Deep-crawl bounds. Tunables with empirically chosen defaults; the
/// crawler treats them as hard caps.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CrawlLimits {
    #[serde(default = "default_max_jobs")]
    pub max_jobs: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    #[serde(default = "default_links_per_page")]
    pub links_per_page: usize,
    #[serde(default = "default_pages_per_level")]
    pub pages_per_level: usize,
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
}

fn default_max_jobs() -> usize {
    50
}
fn default_max_depth() -> u32 {
    3
}
fn default_links_per_page() -> usize {
    20
}
fn default_pages_per_level() -> usize {
    10
}
fn default_request_delay_ms() -> u64 {
    500
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self {
            max_jobs: default_max_jobs(),
            max_depth: default_max_depth(),
            links_per_page: default_links_per_page(),
            pages_per_level: default_pages_per_level(),
            request_delay_ms: default_request_delay_ms(),
        }
    }
}

#[derive(Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub last_model: Option<String>,
    #[serde(default)]
    pub llm_provider: LlmProvider,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub start_url: Option<String>,
    #[serde(default)]
    pub crawl: CrawlLimits,
}

impl Config {
    /// Get the application data directory
    pub fn get_app_data_dir() -> PathBuf {
        let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("jobscout");

        if !path.exists() {
            let _ = std::fs::create_dir_all(&path);
        }
        path
    }

    fn config_path() -> PathBuf {
        Self::get_app_data_dir().join("config.json")
    }

    pub fn load() -> Config {
        let path = Self::config_path();
        if path.exists() {
            if let Ok(contents) = std::fs::read_to_string(&path) {
                if let Ok(config) = serde_json::from_str(&contents) {
                    return config;
                }
            }
        }
        Config::default()
    }

    pub fn save(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(Self::config_path(), contents)?;
        Ok(())
    }

    pub fn save_model(model: &str) -> Result<()> {
        let mut config = Config::load();
        config.last_model = Some(model.to_string());
        config.save()
    }

    pub fn get_last_model() -> Option<String> {
        Config::load().last_model
    }

    /// API key for the OpenAI provider: environment first, then config.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.openai_api_key.clone())
    }

    /// Extraction/crawl start URL; the canonical listing page unless
    /// overridden.
    pub fn effective_start_url(&self) -> String {
        self.start_url
            .clone()
            .unwrap_or_else(|| LISTING_URL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crawl_limits_defaults_are_bounded() {
        let limits = CrawlLimits::default();
        assert_eq!(limits.max_jobs, 50);
        assert_eq!(limits.max_depth, 3);
        assert_eq!(limits.links_per_page, 20);
        assert_eq!(limits.pages_per_level, 10);
        assert_eq!(limits.request_delay_ms, 500);
    }

    #[test]
    fn partial_config_json_fills_in_crawl_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"last_model": "gpt-4o-mini", "crawl": {"max_jobs": 5}}"#)
                .unwrap();
        assert_eq!(config.last_model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.crawl.max_jobs, 5);
        assert_eq!(config.crawl.max_depth, 3);
    }

    #[test]
    fn start_url_defaults_to_canonical_listing() {
        let config = Config::default();
        assert_eq!(config.effective_start_url(), LISTING_URL);
    }
}
