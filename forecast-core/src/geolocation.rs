//! Sources for "where am I" lookups.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};

use crate::{error::GeolocationError, model::Coordinates};

pub const IP_API_URL: &str = "http://ip-api.com";
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError>;
}

/// Position supplied up front, e.g. from `--lat/--lon`.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

#[async_trait]
impl Geolocator for FixedPosition {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        let Coordinates { latitude, longitude } = self.0;
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeolocationError::Unavailable(format!(
                "coordinates out of range: {latitude},{longitude}"
            )));
        }
        Ok(self.0)
    }
}

/// Approximate position from the public IP address (ip-api.com, no key required).
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    message: Option<String>,
}

impl IpGeolocator {
    pub fn new() -> Result<Self, GeolocationError> {
        Self::with_base_url(IP_API_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, GeolocationError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| GeolocationError::Unavailable(e.to_string()))?;

        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), http })
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        let url = format!("{}/json", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("fields", "status,message,lat,lon")])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("IP geolocation request failed: {}", e);
                GeolocationError::Unavailable(e.to_string())
            })?;

        if !res.status().is_success() {
            return Err(GeolocationError::Unavailable(format!(
                "IP geolocation returned {}",
                res.status()
            )));
        }

        let body: IpApiResponse = res
            .json()
            .await
            .map_err(|e| GeolocationError::Unavailable(e.to_string()))?;

        match (body.status.as_str(), body.lat, body.lon) {
            ("success", Some(latitude), Some(longitude)) => {
                tracing::info!(latitude, longitude, "located via IP");
                Ok(Coordinates { latitude, longitude })
            }
            _ => Err(GeolocationError::Unavailable(
                body.message.unwrap_or_else(|| "no position in response".to_string()),
            )),
        }
    }
}
