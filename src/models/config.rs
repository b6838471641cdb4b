//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Quote provider endpoint and fetch behavior
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Search list behavior
    #[serde(default)]
    pub search: SearchConfig,

    /// Carousel input behavior
    #[serde(default)]
    pub carousel: CarouselConfig,

    /// Sharing behavior
    #[serde(default)]
    pub share: ShareConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.provider.user_agent.trim().is_empty() {
            return Err(AppError::validation("provider.user_agent is empty"));
        }
        url::Url::parse(&self.provider.url)
            .map_err(|e| AppError::validation(format!("provider.url is invalid: {e}")))?;
        if self.provider.timeout_secs == 0 {
            return Err(AppError::validation("provider.timeout_secs must be > 0"));
        }
        if self.provider.batch_size == 0 {
            return Err(AppError::validation("provider.batch_size must be > 0"));
        }
        if self.search.preview_limit == 0 {
            return Err(AppError::validation("search.preview_limit must be > 0"));
        }
        if !(self.carousel.swipe_threshold_px > 0.0) {
            return Err(AppError::validation(
                "carousel.swipe_threshold_px must be > 0",
            ));
        }
        url::Url::parse(&self.share.facebook_sharer_url).map_err(|e| {
            AppError::validation(format!("share.facebook_sharer_url is invalid: {e}"))
        })?;
        Ok(())
    }
}

/// Quote provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Endpoint returning one random quote per call
    #[serde(default = "defaults::provider_url")]
    pub url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Number of quotes fetched per batch
    #[serde(default = "defaults::batch_size")]
    pub batch_size: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url: defaults::provider_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            batch_size: defaults::batch_size(),
        }
    }
}

/// Search list settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Matches shown before the list is expanded
    #[serde(default = "defaults::preview_limit")]
    pub preview_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            preview_limit: defaults::preview_limit(),
        }
    }
}

/// Carousel input settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarouselConfig {
    /// Minimum horizontal drag distance that counts as a swipe
    #[serde(default = "defaults::swipe_threshold")]
    pub swipe_threshold_px: f64,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            swipe_threshold_px: defaults::swipe_threshold(),
        }
    }
}

/// Share settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Delay between the clipboard write and opening the sharer window
    #[serde(default = "defaults::open_delay")]
    pub open_delay_ms: u64,

    /// Facebook sharer endpoint
    #[serde(default = "defaults::facebook_sharer_url")]
    pub facebook_sharer_url: String,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            open_delay_ms: defaults::open_delay(),
            facebook_sharer_url: defaults::facebook_sharer_url(),
        }
    }
}

mod defaults {
    // Provider defaults
    pub fn provider_url() -> String {
        "https://api.quotable.io/random".into()
    }
    pub fn user_agent() -> String {
        concat!("genquote/", env!("CARGO_PKG_VERSION")).into()
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn batch_size() -> usize {
        40
    }

    // Search defaults
    pub fn preview_limit() -> usize {
        5
    }

    // Carousel defaults
    pub fn swipe_threshold() -> f64 {
        50.0
    }

    // Share defaults
    pub fn open_delay() -> u64 {
        500
    }
    pub fn facebook_sharer_url() -> String {
        "https://www.facebook.com/sharer/sharer.php".into()
    }
}
