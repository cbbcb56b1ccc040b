// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/safewalk-rs

//! Location providers - one-shot best-effort coordinate fetch

use std::time::Duration;
use async_trait::async_trait;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use super::Coordinates;

/// One-shot coordinate source
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Ok(None) means the platform has no fix to offer
    async fn locate(&self) -> Result<Option<Coordinates>>;
}

/// Location configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Fixed latitude (used with `longitude`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    /// Fixed longitude (used with `latitude`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    /// IP geolocation endpoint used when no fixed position is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup_url: Option<String>,

    /// Lookup timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: None,
            longitude: None,
            lookup_url: Some("http://ip-api.com/json".to_string()),
            timeout_ms: 5_000,
        }
    }
}

impl LocationConfig {
    pub fn fixed(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        }
    }

    /// Provider for this configuration: fixed position, IP lookup, or none
    pub fn provider(&self) -> Box<dyn LocationProvider> {
        if let Some(coords) = self.fixed() {
            return Box::new(FixedLocation::new(Some(coords)));
        }
        match &self.lookup_url {
            Some(url) if !url.is_empty() => {
                Box::new(IpLocation::new(url, Duration::from_millis(self.timeout_ms)))
            }
            _ => Box::new(FixedLocation::new(None)),
        }
    }
}

/// Statically configured position (or none at all)
pub struct FixedLocation {
    coords: Option<Coordinates>,
}

impl FixedLocation {
    pub fn new(coords: Option<Coordinates>) -> Self {
        Self { coords }
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn locate(&self) -> Result<Option<Coordinates>> {
        Ok(self.coords.filter(|c| c.is_valid()))
    }
}

/// Coarse position from an IP geolocation service
pub struct IpLocation {
    url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    #[serde(alias = "latitude")]
    lat: Option<f64>,
    #[serde(alias = "longitude", alias = "lng")]
    lon: Option<f64>,
}

impl IpLocation {
    pub fn new(url: &str, timeout: Duration) -> Self {
        Self {
            url: url.to_string(),
            timeout,
        }
    }
}

fn parse_lookup(body: &str) -> Result<Option<Coordinates>> {
    let response: IpLookupResponse = serde_json::from_str(body)
        .map_err(|e| anyhow!("unexpected geolocation response: {}", e))?;

    Ok(match (response.lat, response.lon) {
        (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)).filter(|c| c.is_valid()),
        _ => None,
    })
}

#[async_trait]
impl LocationProvider for IpLocation {
    async fn locate(&self) -> Result<Option<Coordinates>> {
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;
        let body = client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_lookup(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lookup_variants() {
        let ip_api = parse_lookup(r#"{"status":"success","lat":48.85,"lon":2.35}"#).unwrap();
        assert_eq!(ip_api, Some(Coordinates::new(48.85, 2.35)));

        let other = parse_lookup(r#"{"latitude":-33.9,"longitude":151.2}"#).unwrap();
        assert_eq!(other, Some(Coordinates::new(-33.9, 151.2)));

        let failed = parse_lookup(r#"{"status":"fail","message":"private range"}"#).unwrap();
        assert_eq!(failed, None);

        assert!(parse_lookup("<html>").is_err());
    }

    #[tokio::test]
    async fn test_fixed_provider() {
        let config = LocationConfig {
            latitude: Some(10.0),
            longitude: Some(20.0),
            ..Default::default()
        };
        let coords = config.provider().locate().await.unwrap();
        assert_eq!(coords, Some(Coordinates::new(10.0, 20.0)));
    }

    #[tokio::test]
    async fn test_no_provider_configured() {
        let config = LocationConfig {
            lookup_url: None,
            ..Default::default()
        };
        assert_eq!(config.provider().locate().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_fixed_position_ignored() {
        let provider = FixedLocation::new(Some(Coordinates::new(123.0, 0.0)));
        assert_eq!(provider.locate().await.unwrap(), None);
    }
}
