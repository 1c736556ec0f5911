// src/sampler.rs
//! Blocking sampler: retries the Powerwall until one well-formed reading
//! is obtained.

use std::time::Duration;

use chrono::DateTime;
use tracing::{debug, warn};

use crate::powerwall::{QueryError, TelemetrySource};

/// Delay between attempts when the Powerwall is unreachable or returns a
/// partial reading.
const RETRY_DELAY: Duration = Duration::from_secs(6);

/// One point-in-time set of power readings, stamped with the gateway's
/// last communication time as fractional epoch seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    pub timestamp: f64,
    pub grid: f64,
    pub solar: f64,
    pub battery: f64,
    pub load: f64,
    pub level: f64,
}

pub struct Sampler<S> {
    source: S,
    retry_delay: Duration,
}

impl<S: TelemetrySource> Sampler<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            retry_delay: RETRY_DELAY,
        }
    }

    /// Block until one well-formed reading is obtained. Query failures are
    /// absorbed here: each one is logged and retried after a fixed delay,
    /// with no attempt cap. This call can be delayed indefinitely but it
    /// cannot fail.
    pub async fn poll(&self) -> Reading {
        loop {
            match self.try_poll().await {
                Ok(reading) => return reading,
                Err(e) => {
                    warn!(
                        error = %e,
                        retry_secs = self.retry_delay.as_secs(),
                        "powerwall query failed, retrying"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }

    async fn try_poll(&self) -> Result<Reading, QueryError> {
        let status = self.source.grid_status().await?;
        let power = self.source.power().await?;

        // A poll only counts when the gateway reported a communication time
        // alongside the power breakdown.
        if status.last_communication_time.is_empty() {
            return Err(QueryError::Malformed(
                "grid status has no last communication time".to_string(),
            ));
        }

        let level = self.source.level().await?;
        let timestamp = parse_epoch_seconds(&status.last_communication_time)?;

        debug!(
            timestamp,
            grid = power.site,
            solar = power.solar,
            battery = power.battery,
            load = power.load,
            level,
            "sampled powerwall"
        );

        Ok(Reading {
            timestamp,
            grid: power.site,
            solar: power.solar,
            battery: power.battery,
            load: power.load,
            level,
        })
    }
}

fn parse_epoch_seconds(iso: &str) -> Result<f64, QueryError> {
    let parsed = DateTime::parse_from_rfc3339(iso).map_err(|e| {
        QueryError::Malformed(format!("bad communication time '{}': {}", iso, e))
    })?;
    Ok(parsed.timestamp_micros() as f64 / 1_000_000.0)
}
