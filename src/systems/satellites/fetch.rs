//! fetch.rs
//!
//! Element set source: CelesTrak over HTTP with a small JSON file cache in
//! front of it, so repeated runs don't hammer the service.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::header::USER_AGENT;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::tle::{OrbitalElements, PropagationError, Satellite};
use crate::config;
use crate::systems::files::write_atomic;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("no element set in response from {0}")]
    Malformed(String),
    #[error("element set from {url} is unusable: {source}")]
    Rejected {
        url: String,
        #[source]
        source: PropagationError,
    },
    #[error("cache file {}: {source}", .path.display())]
    CacheIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cache file {} is not valid: {source}", .path.display())]
    CacheFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Download and parse the element set served at `url`.
pub async fn fetch_elements(url: &str) -> Result<OrbitalElements, FetchError> {
    let http = |source| FetchError::Http {
        url: url.to_string(),
        source,
    };

    let response = reqwest::Client::new()
        .get(url)
        .header(USER_AGENT, config::USER_AGENT)
        .send()
        .await
        .map_err(http)?
        .error_for_status()
        .map_err(http)?;

    let body = response.text().await.map_err(http)?;
    info!("fetched TLE data from {url}");

    OrbitalElements::parse_text(&body).ok_or_else(|| FetchError::Malformed(url.to_string()))
}

/// On-disk cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedElements {
    pub elements: OrbitalElements,
    pub cached_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TleCache {
    path: PathBuf,
    max_age: TimeDelta,
}

impl Default for TleCache {
    fn default() -> Self {
        Self::new(config::TLE_CACHE_FILE, TimeDelta::hours(config::TLE_CACHE_HOURS))
    }
}

impl TleCache {
    pub fn new(path: impl AsRef<Path>, max_age: TimeDelta) -> Self {
        TleCache {
            path: path.as_ref().to_path_buf(),
            max_age,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The cached element set if there is one younger than the max age.
    pub fn read(&self, now: DateTime<Utc>) -> Result<Option<OrbitalElements>, FetchError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(FetchError::CacheIo {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let cached: CachedElements = serde_json::from_str(&contents).map_err(|source| FetchError::CacheFormat {
            path: self.path.clone(),
            source,
        })?;

        if now - cached.cached_at < self.max_age {
            Ok(Some(cached.elements))
        } else {
            debug!("TLE cache from {} has expired", cached.cached_at);
            Ok(None)
        }
    }

    pub fn write(&self, elements: &OrbitalElements, now: DateTime<Utc>) -> Result<(), FetchError> {
        let entry = CachedElements {
            elements: elements.clone(),
            cached_at: now,
        };
        let json = serde_json::to_string_pretty(&entry).map_err(|source| FetchError::CacheFormat {
            path: self.path.clone(),
            source,
        })?;

        write_atomic(&self.path, &json).map_err(|source| FetchError::CacheIo {
            path: self.path.clone(),
            source,
        })?;
        debug!("TLE data cached to {:?}", self.path);
        Ok(())
    }
}

/// Cached element set when fresh, otherwise a new download that then
/// replaces the cache.
pub async fn latest_elements(cache: &TleCache, url: &str) -> Result<OrbitalElements, FetchError> {
    let now = Utc::now();

    if let Some(elements) = cache.read(now)? {
        info!("serving TLE data from file cache");
        return Ok(elements);
    }

    let elements = fetch_elements(url).await?;
    accept(cache, url, elements, now)
}

// only element sets SGP4 can initialise from reach the cache
fn accept(
    cache: &TleCache,
    url: &str,
    elements: OrbitalElements,
    now: DateTime<Utc>,
) -> Result<OrbitalElements, FetchError> {
    Satellite::from_elements(&elements).map_err(|source| FetchError::Rejected {
        url: url.to_string(),
        source,
    })?;

    cache.write(&elements, now)?;
    Ok(elements)
}
