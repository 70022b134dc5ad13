//! Remote data fetchers (feature `http`).
//!
//! This module provides:
//! - Track download from RideWithGPS by route id
//! - Refreshment stop downloads from the known named sources
//! - [`StopCache`], a single-flight TTL cache over built stop indices
//!
//! Fetch failures are never retried here; retries, when wanted, belong to
//! the caller.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use log::{debug, info};
use reqwest::Client;
use tokio::sync::OnceCell;

use crate::error::{Result, SummaryError};
use crate::projection::Projection;
use crate::stops::{stops_from_cafe_json, stops_from_waypoints, StopIndex};

const USER_AGENT: &str = concat!("gpx-summary/", env!("CARGO_PKG_VERSION"));

const WAYPOINT_STOPS_URL: &str = "https://ctccambridge.org.uk/ctccambridge-waypoints.gpx";
const CAFE_FEED_URL: &str = "https://cafes.cyclingmaps.net/data/cafes.json";

/// Known refreshment stop source keys.
pub const STOP_SOURCES: &[&str] = &["ctccambridge", "cyclingmaps"];

/// How long a fetched stop index stays fresh.
const STOP_CACHE_TTL: Duration = Duration::from_secs(4 * 60 * 60);

/// Build an HTTP client with the crate's user agent.
pub fn client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| SummaryError::Http {
            message: e.to_string(),
            status_code: None,
        })
}

async fn get_bytes(client: &Client, url: &str) -> Result<Vec<u8>> {
    debug!("fetching {url}");
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SummaryError::Http {
            message: format!("getting {url}: {e}"),
            status_code: None,
        })?;
    let status = response.status();
    if !status.is_success() {
        return Err(SummaryError::Http {
            message: format!("unexpected status fetching {url}: {status}"),
            status_code: Some(status.as_u16()),
        });
    }
    let bytes = response.bytes().await.map_err(|e| SummaryError::Http {
        message: format!("reading response from {url}: {e}"),
        status_code: None,
    })?;
    Ok(bytes.to_vec())
}

/// Download a RideWithGPS route as GPX track data.
///
/// RideWithGPS answers missing routes with an HTML error page rather than a
/// status code; that page is detected and reported as
/// [`SummaryError::RouteNotFound`].
pub async fn fetch_route(client: &Client, route_id: u64) -> Result<Vec<u8>> {
    let url = format!("https://ridewithgps.com/routes/{route_id}.gpx?sub_format=track");
    let data = get_bytes(client, &url).await?;
    if is_not_found(&data) {
        return Err(SummaryError::RouteNotFound { route_id });
    }
    Ok(data)
}

fn is_not_found(data: &[u8]) -> bool {
    data.starts_with(b"<!DOCTYPE html>")
        && data
            .windows(b"Error (404 not found)".len())
            .any(|w| w == b"Error (404 not found)")
}

/// Fetch and build the stop index for a named source.
pub async fn fetch_stop_source<P: Projection>(
    client: &Client,
    source: &str,
    projection: &P,
) -> Result<StopIndex> {
    let stops = match source {
        "ctccambridge" => {
            let data = get_bytes(client, WAYPOINT_STOPS_URL).await?;
            stops_from_waypoints(&data[..], projection)?
        }
        "cyclingmaps" => {
            let data = get_bytes(client, CAFE_FEED_URL).await?;
            stops_from_cafe_json(&data[..], projection)?
        }
        _ => {
            return Err(SummaryError::UnknownStopSource {
                name: source.to_string(),
            })
        }
    };
    info!("loaded {} stops from {source}", stops.len());
    Ok(StopIndex::from_stops(stops))
}

type CacheResult = std::result::Result<Arc<StopIndex>, SummaryError>;

struct CacheEntry {
    cell: Arc<OnceCell<CacheResult>>,
    expires: Instant,
}

/// Single-flight TTL cache of stop indices, keyed by source name.
///
/// At most one fetch runs per key at a time; concurrent callers for the
/// same key await the in-flight result, callers for different keys proceed
/// independently. Results, including failures, stay cached until the
/// entry expires, at which point the next caller triggers a fresh fetch.
pub struct StopCache<P> {
    client: Client,
    projection: P,
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl<P: Projection + Send + Sync> StopCache<P> {
    pub fn new(projection: P) -> Result<Self> {
        Ok(Self {
            client: client()?,
            projection,
            ttl: STOP_CACHE_TTL,
            entries: Mutex::new(HashMap::new()),
        })
    }

    #[cfg(test)]
    fn with_ttl(projection: P, ttl: Duration) -> Result<Self> {
        let mut cache = Self::new(projection)?;
        cache.ttl = ttl;
        Ok(cache)
    }

    /// Get the stop index for a source, fetching it at most once per TTL
    /// window.
    pub async fn get(&self, source: &str) -> Result<Arc<StopIndex>> {
        let cell = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            let now = Instant::now();
            let stale = entries
                .get(source)
                .map(|entry| entry.expires <= now)
                .unwrap_or(true);
            if stale {
                entries.insert(
                    source.to_string(),
                    CacheEntry {
                        cell: Arc::new(OnceCell::new()),
                        expires: now + self.ttl,
                    },
                );
            }
            Arc::clone(&entries[source].cell)
        };

        cell.get_or_init(|| async {
            fetch_stop_source(&self.client, source, &self.projection)
                .await
                .map(Arc::new)
        })
        .await
        .clone()
    }
}
