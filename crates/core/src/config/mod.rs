//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (LEAFLET_*)
//! 2. TOML config file (if LEAFLET_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Default cache generation name. Bump to invalidate every cached entry on redeploy.
pub const DEFAULT_CACHE_NAME: &str = "beautifulmind-v1";

/// Resources stored before a new worker version may activate.
pub const DEFAULT_PRECACHE_URLS: &[&str] = &[
    "/",
    "/index.html",
    "/reader.html",
    "/css/common.css",
    "/js/common.js",
    "/manifest.json",
    "https://docs.bccsw.cn/logo.png",
    "https://docs.bccsw.cn/favicon.png",
    "https://fonts.googleapis.com/css2?family=Noto+Sans+SC:wght@300;400;500&family=Noto+Serif+SC:wght@400;500;600&display=swap",
    "https://fonts.googleapis.com/css2?family=Material+Symbols+Outlined:opsz,wght,FILL,GRAD@20..48,100..700,0..1,-50..200&display=swap",
];

/// Chapters cached best-effort after install, in their published order.
pub const DEFAULT_CONTENT_URLS: &[&str] = &[
    "/md/10-preface.md",
    "/md/02-motivation.md",
    "/md/03-decision-making.md",
    "/md/04-expectations.md",
    "/md/05-family-environment.md",
    "/md/06-communication.md",
    "/md/07-happiness.md",
    "/md/08-special-situations.md",
    "/md/09-beauty-planner.md",
    "/md/11-epilogue.md",
    "/md/12-psychology-effects-list.md",
];

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (LEAFLET_*)
/// 2. TOML config file (if LEAFLET_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name of the current cache generation.
    ///
    /// Set via LEAFLET_CACHE_NAME environment variable.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Site origin that relative URLs resolve against.
    ///
    /// Set via LEAFLET_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Page served to navigations that miss both network and cache.
    #[serde(default = "default_offline_url")]
    pub offline_url: String,

    /// Precache manifest. Every entry must be stored for install to succeed.
    #[serde(default = "default_precache_urls")]
    pub precache_urls: Vec<String>,

    /// Secondary document set, cached in the background after install.
    #[serde(default = "default_content_urls")]
    pub content_urls: Vec<String>,

    /// Icon and badge used for push notifications.
    #[serde(default = "default_notification_icon")]
    pub notification_icon: String,

    /// Path to SQLite cache database.
    ///
    /// Set via LEAFLET_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_cache_name() -> String {
    DEFAULT_CACHE_NAME.into()
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_offline_url() -> String {
    "/offline.html".into()
}

fn default_precache_urls() -> Vec<String> {
    DEFAULT_PRECACHE_URLS.iter().map(|s| s.to_string()).collect()
}

fn default_content_urls() -> Vec<String> {
    DEFAULT_CONTENT_URLS.iter().map(|s| s.to_string()).collect()
}

fn default_notification_icon() -> String {
    "https://docs.bccsw.cn/logo.png".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./leaflet-cache.sqlite")
}

fn default_user_agent() -> String {
    "leaflet-worker/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_name: default_cache_name(),
            origin: default_origin(),
            offline_url: default_offline_url(),
            precache_urls: default_precache_urls(),
            content_urls: default_content_urls(),
            notification_icon: default_notification_icon(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `LEAFLET_`
    /// 2. TOML file from `LEAFLET_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("LEAFLET_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        Self::extract(figment)
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let figment = figment.merge(
            Env::prefixed("LEAFLET_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
