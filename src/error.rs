//! error types for the api client and the threshold form.

use crate::domain::Metric;

/// a single failed call against the espmonitor backend
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// transport failure or an undecodable body
    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// the backend answered with a non-2xx status
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: &'static str, status: u16 },
}

/// why a threshold update did not take effect
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("invalid {metric} threshold: {value:?}")]
    InvalidInput { metric: Metric, value: String },

    #[error(transparent)]
    Api(#[from] ApiError),
}
