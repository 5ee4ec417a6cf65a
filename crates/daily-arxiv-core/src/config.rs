use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::arxiv::client::DEFAULT_API_URL;
use crate::categories::parse_category_list;
use crate::error::Result;
use crate::fetch::DEFAULT_LISTING_URL;

pub const ENV_CATEGORIES: &str = "CATEGORIES";
pub const ENV_FALLBACK: &str = "ARXIV_METADATA_FALLBACK";
pub const ENV_API_DELAY: &str = "ARXIV_API_DELAY_SECONDS";

pub const DEFAULT_CATEGORY: &str = "cs.CV";
pub const DEFAULT_API_DELAY_SECS: f64 = 3.0;
pub const DEFAULT_PAGE_SIZE: u32 = 100;
/// Ceiling for both delays. Larger values are clamped to it.
pub const MAX_DELAY_SECS: f64 = 86_400.0;

/// Harvest settings. Loaded from an optional TOML file, then overridden by the
/// environment variables that are actually set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub categories: Vec<String>,
    pub fallback_enabled: bool,
    pub api_delay_secs: f64,
    pub page_size: u32,
    pub listing_delay_secs: f64,
    pub listing_base_url: String,
    pub api_base_url: String,
    pub user_agent: String,
    pub max_retries: u32,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            categories: vec![DEFAULT_CATEGORY.to_string()],
            fallback_enabled: false,
            api_delay_secs: DEFAULT_API_DELAY_SECS,
            page_size: DEFAULT_PAGE_SIZE,
            listing_delay_secs: 1.0,
            listing_base_url: DEFAULT_LISTING_URL.to_string(),
            api_base_url: DEFAULT_API_URL.to_string(),
            user_agent: "daily-arxiv/0.1".to_string(),
            max_retries: 3,
        }
    }
}

impl HarvestConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(path) => Self::from_toml_str(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        Ok(base.overlay(|key| std::env::var(key).ok()))
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from defaults plus whatever `lookup` returns for the known keys.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().overlay(lookup)
    }

    pub fn from_toml_str(input: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(input)?;
        config.normalize();
        Ok(config)
    }

    fn overlay<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_CATEGORIES) {
            self.categories = parse_category_list(&raw);
        }
        if let Some(raw) = lookup(ENV_FALLBACK) {
            self.fallback_enabled = parse_flag(&raw);
        }
        if let Some(raw) = lookup(ENV_API_DELAY) {
            self.api_delay_secs = parse_delay_secs(&raw);
        }
        self.normalize();
        self
    }

    fn normalize(&mut self) {
        let joined = self.categories.join(",");
        self.categories = parse_category_list(&joined);
        if self.categories.is_empty() {
            self.categories = vec![DEFAULT_CATEGORY.to_string()];
        }
        self.api_delay_secs = clamp_delay(self.api_delay_secs, DEFAULT_API_DELAY_SECS);
        self.listing_delay_secs = clamp_delay(self.listing_delay_secs, 0.0);
    }

    pub fn api_delay(&self) -> Duration {
        to_duration(self.api_delay_secs, DEFAULT_API_DELAY_SECS)
    }

    pub fn listing_delay(&self) -> Duration {
        to_duration(self.listing_delay_secs, 0.0)
    }
}

fn clamp_delay(secs: f64, fallback: f64) -> f64 {
    if secs.is_finite() {
        secs.clamp(0.0, MAX_DELAY_SECS)
    } else {
        fallback
    }
}

/// Public fields may bypass `normalize`, so the clamp is applied again here.
fn to_duration(secs: f64, fallback: f64) -> Duration {
    Duration::from_secs_f64(clamp_delay(secs, fallback))
}

/// `1`, `true`, `yes` and `on` (any case, surrounding whitespace ignored) are true.
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Delay in seconds, clamped to `0..=MAX_DELAY_SECS`. Blank or unusable input falls
/// back to the default.
pub fn parse_delay_secs(raw: &str) -> f64 {
    let raw = raw.trim();
    if raw.is_empty() {
        return DEFAULT_API_DELAY_SECS;
    }
    match raw.parse::<f64>() {
        Ok(secs) if secs.is_finite() => secs.clamp(0.0, MAX_DELAY_SECS),
        _ => {
            warn!(value = raw, "unusable {ENV_API_DELAY}, using {DEFAULT_API_DELAY_SECS}s");
            DEFAULT_API_DELAY_SECS
        }
    }
}
