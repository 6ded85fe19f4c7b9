use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::rank::CapMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub translation: TranslationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            crawl: CrawlConfig::default(),
            translation: TranslationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Article retention in days
    #[serde(default = "default_retention_days")]
    pub article_retention_days: u32,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            article_retention_days: default_retention_days(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Request timeout in seconds for feed and page fetches
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Maximum redirects followed per request
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Delay between pagination requests in milliseconds
    #[serde(default = "default_page_delay")]
    pub page_delay_ms: u64,
    /// Page size for offset-paginated API sources
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// How many days back API-windowed queries look
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    /// Minimum extracted body length (chars) before a secondary
    /// full-page fetch is attempted
    #[serde(default = "default_min_content_length")]
    pub min_content_length: usize,
    /// Candidate truncation mode: per-source cap (default) or a global
    /// cap after sorting all candidates by score
    #[serde(default = "default_cap_mode")]
    pub cap_mode: CapMode,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_timeout(),
            max_redirects: default_max_redirects(),
            page_delay_ms: default_page_delay(),
            page_size: default_page_size(),
            lookback_days: default_lookback_days(),
            min_content_length: default_min_content_length(),
            cap_mode: default_cap_mode(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Target language code (e.g., "zh-CN")
    #[serde(default = "default_target_lang")]
    pub target_lang: String,
    /// Ordered provider names; later entries are fallbacks
    #[serde(default = "default_providers")]
    pub providers: Vec<String>,
    /// Retry attempts per provider call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base backoff delay in milliseconds; delays increase linearly
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,
    /// Delay between translation calls for consecutive articles
    #[serde(default = "default_inter_item_delay")]
    pub inter_item_delay_ms: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            target_lang: default_target_lang(),
            providers: default_providers(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay(),
            inter_item_delay_ms: default_inter_item_delay(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("newsbridge")
}

fn default_retention_days() -> u32 {
    90
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    10
}

fn default_page_delay() -> u64 {
    1000
}

fn default_page_size() -> usize {
    50
}

fn default_lookback_days() -> u32 {
    7
}

fn default_min_content_length() -> usize {
    500
}

fn default_cap_mode() -> CapMode {
    CapMode::PerSource
}

fn default_target_lang() -> String {
    "zh-CN".to_string()
}

fn default_providers() -> Vec<String> {
    vec!["google".to_string(), "mymemory".to_string()]
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay() -> u64 {
    2000
}

fn default_inter_item_delay() -> u64 {
    3000
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &std::path::Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from file or return defaults
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> crate::Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/newsbridge/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("newsbridge")
            .join("config.toml")
    }

    /// Get the database file path
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join("newsbridge.db")
    }

    /// Get the data directory (with tilde expansion)
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }
}
