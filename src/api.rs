//! ==============================================================================
//! api.rs - espmonitor backend client
//! ==============================================================================
//!
//! purpose:
//!     the four reads and one write the dashboard performs against the
//!     backend, behind a trait so the controller can be driven by a fake.
//!
//! relationships:
//!     - used by: controller.rs (through Arc<dyn MonitorApi>)
//!     - uses: reqwest (HttpApi), domain.rs (wire types)
//!
//! failure model:
//!     transport errors, undecodable bodies and non-2xx statuses all surface
//!     as a single ApiError. no retries happen here.
//!
//! ==============================================================================

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::domain::{Reading, StatsResponse, Thresholds, ThresholdsUpdated};
use crate::error::ApiError;

const LATEST_DATA: &str = "/api/latest-data";
const THRESHOLDS: &str = "/api/thresholds";
const STATS: &str = "/api/stats";

#[async_trait]
pub trait MonitorApi: Send + Sync {
    /// up to `limit` readings, newest first
    async fn latest_data(&self, limit: u32) -> Result<Vec<Reading>, ApiError>;
    async fn thresholds(&self) -> Result<Thresholds, ApiError>;
    /// returns the thresholds as echoed back by the server
    async fn update_thresholds(&self, candidate: &Thresholds) -> Result<Thresholds, ApiError>;
    async fn stats(&self) -> Result<StatsResponse, ApiError>;
}

/// reqwest-backed client for a single backend
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    /// `base_url` is the backend origin, e.g. `http://192.168.1.100:5000`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(
        endpoint: &'static str,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|source| ApiError::Request { endpoint, source })
    }
}

#[async_trait]
impl MonitorApi for HttpApi {
    async fn latest_data(&self, limit: u32) -> Result<Vec<Reading>, ApiError> {
        let response = self
            .client
            .get(self.url(LATEST_DATA))
            .query(&[("limit", limit)])
            .send()
            .await
            .map_err(|source| ApiError::Request {
                endpoint: LATEST_DATA,
                source,
            })?;
        Self::decode(LATEST_DATA, response).await
    }

    async fn thresholds(&self) -> Result<Thresholds, ApiError> {
        let response = self
            .client
            .get(self.url(THRESHOLDS))
            .send()
            .await
            .map_err(|source| ApiError::Request {
                endpoint: THRESHOLDS,
                source,
            })?;
        Self::decode(THRESHOLDS, response).await
    }

    async fn update_thresholds(&self, candidate: &Thresholds) -> Result<Thresholds, ApiError> {
        let response = self
            .client
            .post(self.url(THRESHOLDS))
            .json(candidate)
            .send()
            .await
            .map_err(|source| ApiError::Request {
                endpoint: THRESHOLDS,
                source,
            })?;
        let updated: ThresholdsUpdated = Self::decode(THRESHOLDS, response).await?;
        Ok(updated.thresholds)
    }

    async fn stats(&self) -> Result<StatsResponse, ApiError> {
        let response = self
            .client
            .get(self.url(STATS))
            .send()
            .await
            .map_err(|source| ApiError::Request {
                endpoint: STATS,
                source,
            })?;
        Self::decode(STATS, response).await
    }
}
