use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{RerankError, Result};

/// Reference dwell in seconds at which the dwell feature saturates
pub const DEFAULT_T0: f64 = 10.0;
pub const DEFAULT_TOP_K: usize = 10;

/// Global configuration for travelrank
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scoring configuration
    pub rerank: RerankConfig,

    /// HTTP server configuration
    pub server: ServerConfig,
}

/// Weights and bounds for one scoring run
///
/// Build it once, call [`RerankConfig::validate`], then share it read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankConfig {
    /// Weight on similarity
    pub alpha: f64,

    /// Weight on normalized dwell
    pub beta: f64,

    /// Weight on the click feature
    pub gamma: f64,

    /// Maximum rows returned; zero or negative input keeps none
    #[serde(deserialize_with = "deserialize_top_k")]
    pub top_k: usize,

    /// Saturation point for dwell, in seconds
    pub t0: f64,

    /// Which click statistic feeds `g_click`
    pub click_feature: ClickFeature,

    /// What to do with repeated candidate ids
    pub duplicates: DuplicatePolicy,
}

/// Clamp a signed row count to `usize`, mapping negatives to 0
pub fn clamp_top_k(top_k: i64) -> usize {
    usize::try_from(top_k).unwrap_or(0)
}

fn deserialize_top_k<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<usize, D::Error> {
    i64::deserialize(deserializer).map(clamp_top_k)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickFeature {
    /// 1.0 if the activity was ever clicked
    #[default]
    Ever,
    /// Fraction of events that were clicks
    Rate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Score every row independently
    #[default]
    Keep,
    /// Fail the run on the first repeated id
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4455,
        }
    }
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            alpha: 0.6,
            beta: 0.3,
            gamma: 0.1,
            top_k: DEFAULT_TOP_K,
            t0: DEFAULT_T0,
            click_feature: ClickFeature::default(),
            duplicates: DuplicatePolicy::default(),
        }
    }
}

impl RerankConfig {
    pub fn with_weights(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self {
            alpha,
            beta,
            gamma,
            ..Self::default()
        }
    }

    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Weights may be any finite value; `t0` must be finite and positive.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("alpha", self.alpha), ("beta", self.beta), ("gamma", self.gamma)] {
            if !value.is_finite() {
                return Err(RerankError::InvalidConfig(format!(
                    "{} must be finite, got {}",
                    name, value
                )));
            }
        }
        if !self.t0.is_finite() || self.t0 <= 0.0 {
            return Err(RerankError::InvalidConfig(format!(
                "t0 must be a positive number of seconds, got {}",
                self.t0
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Load from an explicit path, else `~/.travelrank/config.json`, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(Self::default()),
            },
        };

        debug!("Loading config from {}", path.display());
        let content = std::fs::read_to_string(&path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.rerank.validate()?;
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".travelrank").join("config.json"))
    }
}
