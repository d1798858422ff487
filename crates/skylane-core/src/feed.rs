// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

/// One airborne aircraft as reported by the live feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveAircraft {
    pub id: String,
    #[serde(default)]
    pub flight_number: String,
    #[serde(default)]
    pub airline_code: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub altitude_ft: Option<f64>,
    #[serde(default)]
    pub ground_speed_kt: Option<f64>,
    #[serde(default)]
    pub heading_deg: Option<f64>,
    #[serde(default)]
    pub origin_code: Option<String>,
    #[serde(default)]
    pub dest_code: Option<String>,
}

impl LiveAircraft {
    /// `(lat, lon)` if both are finite.
    pub fn position(&self) -> Option<(f64, f64)> {
        (self.lat.is_finite() && self.lon.is_finite()).then_some((self.lat, self.lon))
    }

    pub fn flies(&self, origin: &str, dest: &str) -> bool {
        self.origin_code.as_deref() == Some(origin) && self.dest_code.as_deref() == Some(dest)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    #[error("Live feed unavailable: {0}")]
    Unavailable(String),
    #[error("Live feed timed out after {0:?}")]
    Timeout(Duration),
    #[error("Live feed returned malformed data: {0}")]
    Decode(String),
}

/// Upstream source of the full live aircraft set.
#[async_trait]
pub trait AircraftFeed: Send + Sync {
    async fn fetch_all_aircraft(&self) -> Result<Vec<LiveAircraft>, FeedError>;
}

/// Fetches a JSON array of [`LiveAircraft`] over HTTP.
pub struct HttpFeed {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpFeed {
    /// `timeout` bounds each fetch; expiry is reported as [`FeedError::Timeout`].
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

    fn request_error(&self, e: reqwest::Error) -> FeedError {
        if e.is_timeout() {
            FeedError::Timeout(self.timeout)
        } else {
            FeedError::Unavailable(e.to_string())
        }
    }
}

#[async_trait]
impl AircraftFeed for HttpFeed {
    async fn fetch_all_aircraft(&self) -> Result<Vec<LiveAircraft>, FeedError> {
        debug!("Fetching live aircraft — url={}", self.url);
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| self.request_error(e))?;

        response.json::<Vec<LiveAircraft>>().await.map_err(|e| {
            if e.is_timeout() {
                FeedError::Timeout(self.timeout)
            } else {
                FeedError::Decode(e.to_string())
            }
        })
    }
}

/// Reads the same JSON shape as [`HttpFeed`] from a file on every fetch.
pub struct JsonFileFeed {
    path: PathBuf,
}

impl JsonFileFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AircraftFeed for JsonFileFeed {
    async fn fetch_all_aircraft(&self) -> Result<Vec<LiveAircraft>, FeedError> {
        let path = self.path.clone();
        let content = tokio::task::spawn_blocking(move || std::fs::read_to_string(path))
            .await
            .map_err(|e| FeedError::Unavailable(e.to_string()))?
            .map_err(|e| FeedError::Unavailable(format!("{}: {}", self.path.display(), e)))?;

        serde_json::from_str(&content).map_err(|e| FeedError::Decode(e.to_string()))
    }
}

/// In-memory feed whose contents can be swapped between fetches.
pub struct StaticFeed {
    aircraft: Mutex<Result<Vec<LiveAircraft>, FeedError>>,
}

impl StaticFeed {
    pub fn new(aircraft: Vec<LiveAircraft>) -> Self {
        Self {
            aircraft: Mutex::new(Ok(aircraft)),
        }
    }

    /// Sets what the next fetch returns, including failures.
    pub fn set(&self, next: Result<Vec<LiveAircraft>, FeedError>) {
        *self
            .aircraft
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = next;
    }
}

#[async_trait]
impl AircraftFeed for StaticFeed {
    async fn fetch_all_aircraft(&self) -> Result<Vec<LiveAircraft>, FeedError> {
        self.aircraft
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
