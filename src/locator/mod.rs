//! Server label and latency acquisition.
//!
//! A [`Locator`] may fail or hang. The chain only ever talks to it through
//! [`locate_or_fallback`] and [`ping_or_fallback`], which bound every call
//! with a timeout and substitute an offline value on failure.

pub mod client;
pub mod requests;

use crate::errors::{ErrorKind, DialError};
use crate::signal::fallback_ping;
use client::Client;
use log::{debug, warn};
use requests::{geo::GeoRequest, probe::ProbeRequest};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

/// Servers picked from when the lookup cannot be reached.
pub const OFFLINE_SERVERS: [&str; 8] = [
    "Mumbai, MH",
    "Delhi, DL",
    "Bangalore, KA",
    "Hyderabad, TG",
    "Chennai, TN",
    "Kolkata, WB",
    "Pune, MH",
    "Ahmedabad, GJ",
];

/// Label used when the lookup answered with something unusable.
pub const DEFAULT_SERVER: &str = "Mumbai, Maharashtra";

pub fn offline_server(seed: u64) -> &'static str {
    OFFLINE_SERVERS[(seed % OFFLINE_SERVERS.len() as u64) as usize]
}

/// Source of the server label and the ping latency.
pub trait Locator: Send + Sync + 'static {
    /// Human-readable server label.
    fn locate(&self) -> impl Future<Output = Result<String, DialError>> + Send;

    /// Round-trip latency in milliseconds.
    fn measure_ping(&self) -> impl Future<Output = Result<f64, DialError>> + Send;
}

/// Locator backed by an IP geolocation lookup and a timed HEAD request.
#[derive(Debug, Clone, Default)]
pub struct HttpLocator {
    client: Client,
}

impl HttpLocator {
    pub fn new() -> Self {
        Self { client: Client::new() }
    }
}

impl Locator for HttpLocator {
    async fn locate(&self) -> Result<String, DialError> {
        let location = self.client.send(GeoRequest).await?;

        location.label().ok_or_else(|| {
            DialError::new(
                ErrorKind::Decode,
                "server lookup returned no city or region",
            )
        })
    }

    async fn measure_ping(&self) -> Result<f64, DialError> {
        let rtt = self.client.probe(ProbeRequest).await?;
        Ok(rtt.as_secs_f64() * 1000.0)
    }
}

/// Locator for `--offline` runs. Every call fails so the offline
/// fallbacks are used.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineLocator;

impl Locator for OfflineLocator {
    async fn locate(&self) -> Result<String, DialError> {
        Err(DialError::new(ErrorKind::Network, "offline mode"))
    }

    async fn measure_ping(&self) -> Result<f64, DialError> {
        Err(DialError::new(ErrorKind::Network, "offline mode"))
    }
}

/// Look up the server label, falling back to an offline label.
pub async fn locate_or_fallback<L: Locator>(
    locator: &L,
    limit: Duration,
    seed: u64,
) -> String {
    let result = match timeout(limit, locator.locate()).await {
        Ok(result) => result,
        Err(_) => Err(DialError::timeout(format!(
            "server lookup took longer than {:?}",
            limit
        ))),
    };

    match result {
        Ok(label) => {
            debug!("Located server {}", label);
            label
        }
        Err(error) if error.kind == ErrorKind::Decode => {
            warn!("{}, using {}", error, DEFAULT_SERVER);
            DEFAULT_SERVER.to_string()
        }
        Err(error) => {
            let label = offline_server(seed);
            warn!("{}, using {}", error, label);
            label.to_string()
        }
    }
}

/// Measure the ping, falling back to a synthetic latency.
pub async fn ping_or_fallback<L: Locator>(
    locator: &L,
    limit: Duration,
    seed: u64,
) -> f64 {
    let result = match timeout(limit, locator.measure_ping()).await {
        Ok(result) => result,
        Err(_) => Err(DialError::timeout(format!(
            "ping took longer than {:?}",
            limit
        ))),
    };

    match result {
        Ok(ms) if ms.is_finite() && ms >= 0.0 => {
            debug!("Measured ping {:.1} ms", ms);
            ms
        }
        Ok(ms) => {
            let fallback = fallback_ping(seed);
            warn!("Ignoring unusable ping {}, using {} ms", ms, fallback);
            fallback
        }
        Err(error) => {
            let fallback = fallback_ping(seed);
            warn!("{}, using {} ms", error, fallback);
            fallback
        }
    }
}
