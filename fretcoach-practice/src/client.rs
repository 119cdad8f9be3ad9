//! HTTP client for the sensor server
//!
//! Thin wrapper over `reqwest` that maps transport and status failures onto
//! [`Error`] kinds:
//! - connection/timeout/non-2xx → [`Error::UpstreamUnavailable`]
//! - 404 or `{"error": ...}` on a chord lookup → [`Error::NotFound`]
//! - undecodable body → [`Error::MalformedInput`]
//!
//! No request is retried here; callers poll again on their next tick.

use fretcoach_common::api::types::{ChordLookupResponse, ChordShape, ChordTable, ProcessedReading};
use fretcoach_common::{Error, Result};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Default timeout for sensor server requests
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Sensor server API client
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `http://127.0.0.1:8000`)
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid server URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "Server URL '{}' cannot carry a path",
                base_url
            )));
        }

        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Server URL '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `GET /api/chords`: the full chord table
    pub async fn fetch_chords(&self) -> Result<ChordTable> {
        let url = self.endpoint(&["api", "chords"])?;
        debug!(url = %url, "Fetching chord table");

        let response = self.send(self.http_client.get(url.clone()), &url).await?;
        let response = ensure_success(response)?;
        decode(response, &url).await
    }

    /// `GET /api/chords/{name}`: a single chord
    pub async fn fetch_chord(&self, name: &str) -> Result<ChordShape> {
        let url = self.endpoint(&["api", "chords", name])?;
        debug!(url = %url, chord = %name, "Fetching chord");

        let response = self.send(self.http_client.get(url.clone()), &url).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("Chord '{}'", name)));
        }
        let response = ensure_success(response)?;

        match decode::<ChordLookupResponse>(response, &url).await? {
            ChordLookupResponse::Error { error } => {
                debug!(chord = %name, error = %error, "Server reported chord lookup error");
                Err(Error::NotFound(format!("Chord '{}': {}", name, error)))
            }
            other => other
                .into_shape(name)
                .ok_or_else(|| Error::NotFound(format!("Chord '{}'", name))),
        }
    }

    /// `POST /api/sensor/processed`: current pressed positions and label
    pub async fn fetch_processed(&self) -> Result<ProcessedReading> {
        let url = self.endpoint(&["api", "sensor", "processed"])?;

        let request = self
            .http_client
            .post(url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        let response = self.send(request, &url).await?;
        let response = ensure_success(response)?;
        decode(response, &url).await
    }

    /// `GET /api/sensor/read`: raw sensor snapshot, shape left to the caller
    pub async fn read_raw(&self) -> Result<serde_json::Value> {
        let url = self.endpoint(&["api", "sensor", "read"])?;

        let response = self.send(self.http_client.get(url.clone()), &url).await?;
        let response = ensure_success(response)?;
        decode(response, &url).await
    }

    async fn send(&self, request: reqwest::RequestBuilder, url: &Url) -> Result<Response> {
        request.send().await.map_err(|e| {
            Error::UpstreamUnavailable(format!("Failed to connect to server ({}): {}", url, e))
        })
    }
}

fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(Error::UpstreamUnavailable(format!(
            "Server error: {}",
            status.as_u16()
        )))
    }
}

async fn decode<T: DeserializeOwned>(response: Response, url: &Url) -> Result<T> {
    let body = response.bytes().await.map_err(|e| {
        Error::UpstreamUnavailable(format!("Failed to read response from {}: {}", url, e))
    })?;
    serde_json::from_slice(&body)
        .map_err(|e| Error::MalformedInput(format!("Unexpected response from {}: {}", url, e)))
}
