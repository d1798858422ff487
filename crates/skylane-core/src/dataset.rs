// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::directory::{AirportDirectory, SharedDirectory};
use log::{debug, info};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const OPENFLIGHTS_AIRPORTS_URL: &str =
    "https://raw.githubusercontent.com/jpatokal/openflights/master/data/airports.dat";

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Airport dataset download timed out after {0:?}")]
    Timeout(Duration),
    #[error("Airport dataset loader task failed: {0}")]
    Task(String),
}

/// Where the airport dataset text comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetSource {
    File(PathBuf),
    Url(String),
    Text(String),
}

impl DatasetSource {
    /// `http(s)://` becomes a URL source, anything else a file path.
    pub fn parse(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            DatasetSource::Url(s.to_string())
        } else {
            DatasetSource::File(PathBuf::from(s))
        }
    }

    pub async fn load_text(&self, timeout: Duration) -> Result<String, DatasetError> {
        match self {
            DatasetSource::Text(text) => Ok(text.clone()),
            DatasetSource::File(path) => {
                debug!("Reading airport dataset — path={}", path.display());
                let path = path.clone();
                let read = tokio::task::spawn_blocking(move || std::fs::read_to_string(path));
                match tokio::time::timeout(timeout, read).await {
                    Ok(joined) => joined
                        .map_err(|e| DatasetError::Task(e.to_string()))?
                        .map_err(DatasetError::from),
                    Err(_) => Err(DatasetError::Timeout(timeout)),
                }
            }
            DatasetSource::Url(url) => {
                info!("Downloading airport dataset — url={}", url);
                let client = reqwest::Client::builder().build()?;
                let fetch = async {
                    let response = client.get(url).send().await?.error_for_status()?;
                    response.text().await
                };
                match tokio::time::timeout(timeout, fetch).await {
                    Ok(Ok(text)) => {
                        debug!("Downloaded airport dataset — bytes={}", text.len());
                        Ok(text)
                    }
                    Ok(Err(e)) if e.is_timeout() => Err(DatasetError::Timeout(timeout)),
                    Ok(Err(e)) => Err(e.into()),
                    Err(_) => Err(DatasetError::Timeout(timeout)),
                }
            }
        }
    }

    pub async fn load_directory(&self, timeout: Duration) -> Result<AirportDirectory, DatasetError> {
        let text = self.load_text(timeout).await?;
        let directory = AirportDirectory::build(&text);
        info!("Airport directory ready — airports={}", directory.len());
        Ok(directory)
    }

    /// Rebuilds from this source and swaps the result into `shared`. On
    /// failure the current directory stays in place.
    pub async fn reload_into(
        &self,
        shared: &SharedDirectory,
        timeout: Duration,
    ) -> Result<usize, DatasetError> {
        let directory = self.load_directory(timeout).await?;
        let count = directory.len();
        shared.replace(directory);
        Ok(count)
    }
}
