// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::dataset::OPENFLIGHTS_AIRPORTS_URL;
use crate::matcher::CorridorLimits;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const CONFIG_FILE: &str = "config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Airport dataset location: an `http(s)://` URL or a file path.
    pub dataset_url: String,
    /// Live feed location: an `http(s)://` URL or a JSON file path.
    pub feed_url: Option<String>,
    pub cache_ttl_secs: u64,
    pub upstream_timeout_secs: u64,
    pub corridor_radius_km: f64,
    pub max_corridor_results: usize,
    pub search_limit: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            dataset_url: OPENFLIGHTS_AIRPORTS_URL.to_string(),
            feed_url: None,
            cache_ttl_secs: 30,
            upstream_timeout_secs: 15,
            corridor_radius_km: crate::matcher::DEFAULT_CORRIDOR_RADIUS_KM,
            max_corridor_results: crate::matcher::DEFAULT_MAX_CORRIDOR_RESULTS,
            search_limit: crate::directory::DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl TrackerConfig {
    /// Loads `config.json` from the user config directory, or defaults if absent.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&crate::get_config_root().join(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("No config file; using defaults — path={}", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn corridor_limits(&self) -> CorridorLimits {
        CorridorLimits {
            radius_km: self.corridor_radius_km,
            max_results: self.max_corridor_results,
        }
    }
}
