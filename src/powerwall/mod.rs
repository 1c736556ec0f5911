// src/powerwall/mod.rs
//! The Powerwall API surface the poller consumes.

mod client;

pub use client::PowerwallClient;

use serde::Deserialize;

/// Grid connection snapshot. `last_communication_time` stamps every reading
/// taken in the same poll.
#[derive(Clone, Debug, Deserialize)]
pub struct GridStatus {
    pub grid_status: String,
    #[serde(default)]
    pub last_communication_time: String,
}

/// Instantaneous power breakdown, in watts. `site` is the grid meter;
/// negative battery power means the battery is charging.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct PowerFlow {
    pub site: f64,
    pub solar: f64,
    pub battery: f64,
    pub load: f64,
}

/// System identity logged once at startup.
#[derive(Clone, Debug)]
pub struct SiteInfo {
    pub site_name: String,
    pub version: String,
    pub din: String,
    pub uptime: String,
}

/// Errors from one query against the Powerwall API.
#[derive(Debug)]
pub enum QueryError {
    Timeout,
    Http { status: u16, endpoint: String },
    Network(String),
    Malformed(String),
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::Timeout => write!(f, "request timed out"),
            QueryError::Http { status, endpoint } => {
                write!(f, "HTTP {} from {}", status, endpoint)
            }
            QueryError::Network(msg) => write!(f, "network error: {}", msg),
            QueryError::Malformed(msg) => write!(f, "malformed response: {}", msg),
        }
    }
}

impl std::error::Error for QueryError {}

/// Point-in-time queries against the telemetry source. Any method may fail
/// transiently; the sampler owns recovery.
#[async_trait::async_trait]
pub trait TelemetrySource {
    async fn grid_status(&self) -> Result<GridStatus, QueryError>;
    async fn power(&self) -> Result<PowerFlow, QueryError>;
    async fn level(&self) -> Result<f64, QueryError>;
    async fn site_info(&self) -> Result<SiteInfo, QueryError>;
}
