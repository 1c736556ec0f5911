use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, error};

use super::{GridStatus, PowerFlow, QueryError, SiteInfo, TelemetrySource};

const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client for the Powerwall API, authenticated with the cloud access
/// token resolved from the credential files.
pub struct PowerwallClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl PowerwallClient {
    /// Create a new client against the site's API host.
    /// Returns an error if the HTTP client fails to build (e.g., TLS configuration issues).
    pub fn new(base_url: &str, access_token: String) -> Result<Self, QueryError> {
        let client = Client::builder()
            .timeout(QUERY_TIMEOUT)
            .build()
            .map_err(|e| QueryError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, QueryError> {
        let endpoint = format!("{}{}", self.base_url, path);
        debug!(endpoint = %endpoint, "querying powerwall");

        let response = self
            .client
            .get(&endpoint)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    QueryError::Timeout
                } else {
                    QueryError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            error!(endpoint = %endpoint, status, "powerwall returned error status");
            return Err(QueryError::Http { status, endpoint });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| QueryError::Malformed(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct MetersAggregates {
    site: Meter,
    solar: Meter,
    battery: Meter,
    load: Meter,
}

#[derive(Debug, Deserialize)]
struct Meter {
    instant_power: f64,
}

#[derive(Debug, Deserialize)]
struct StateOfEnergy {
    percentage: f64,
}

#[derive(Debug, Deserialize)]
struct SiteName {
    site_name: String,
}

#[derive(Debug, Deserialize)]
struct GatewayStatus {
    din: String,
    version: String,
    up_time_seconds: String,
}

#[async_trait::async_trait]
impl TelemetrySource for PowerwallClient {
    async fn grid_status(&self) -> Result<GridStatus, QueryError> {
        self.get_json("/api/system_status/grid_status").await
    }

    async fn power(&self) -> Result<PowerFlow, QueryError> {
        let aggregates: MetersAggregates = self.get_json("/api/meters/aggregates").await?;
        Ok(PowerFlow {
            site: aggregates.site.instant_power,
            solar: aggregates.solar.instant_power,
            battery: aggregates.battery.instant_power,
            load: aggregates.load.instant_power,
        })
    }

    async fn level(&self) -> Result<f64, QueryError> {
        let soe: StateOfEnergy = self.get_json("/api/system_status/soe").await?;
        Ok(soe.percentage)
    }

    async fn site_info(&self) -> Result<SiteInfo, QueryError> {
        let name: SiteName = self.get_json("/api/site_info/site_name").await?;
        let status: GatewayStatus = self.get_json("/api/status").await?;
        Ok(SiteInfo {
            site_name: name.site_name,
            version: status.version,
            din: status.din,
            uptime: status.up_time_seconds,
        })
    }
}
