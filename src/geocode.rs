//! Google Geocoding HTTP adapter.

use serde::Deserialize;
use tracing::debug;

use crate::error::{ConfigError, ProviderError};
use crate::model::Location;
use crate::traits::Geocoder;

pub const API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";
pub const BASE_URL_ENV: &str = "GEOCODER_BASE_URL";

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Region bias as a ccTLD code, e.g. "us".
    pub region: Option<String>,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout_secs: 10,
            region: None,
        }
    }
}

impl GeocoderConfig {
    /// Reads the API key and an optional base url override from the environment.
    pub fn from_env() -> Self {
        let mut config = Self {
            api_key: std::env::var(API_KEY_ENV).ok(),
            ..Self::default()
        };
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            config.base_url = base_url;
        }
        config
    }
}

#[derive(Debug, Clone)]
pub struct HttpGeocoder {
    config: GeocoderConfig,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl HttpGeocoder {
    /// Fails before any request when the API key or base url is missing.
    pub fn new(config: GeocoderConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey {
                provider: "geocoder",
            })?
            .to_string();
        if config.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl {
                provider: "geocoder",
            }
            .into());
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config,
            api_key,
            client,
        })
    }
}

impl Geocoder for HttpGeocoder {
    fn geocode(&self, address: &str) -> Result<Option<Location>, ProviderError> {
        let mut query = vec![("address", address), ("key", self.api_key.as_str())];
        if let Some(region) = self.config.region.as_deref() {
            query.push(("region", region));
        }

        debug!(address, "requesting geocode");
        let body = self
            .client
            .get(&self.config.base_url)
            .query(&query)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<GeocodeResponse>())?;

        body.into_location()
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: GeocodeGeometry,
}

#[derive(Debug, Deserialize)]
struct GeocodeGeometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl GeocodeResponse {
    fn into_location(self) -> Result<Option<Location>, ProviderError> {
        match self.status.as_str() {
            "OK" => match self.results.into_iter().next() {
                Some(result) => {
                    let LatLng { lat, lng } = result.geometry.location;
                    Ok(Some(Location::new(lat, lng)))
                }
                None => Err(ProviderError::Malformed(
                    "status OK without results".to_string(),
                )),
            },
            "ZERO_RESULTS" => Ok(None),
            _ => Err(ProviderError::Status {
                status: self.status,
                message: self.error_message,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Option<Location>, ProviderError> {
        serde_json::from_str::<GeocodeResponse>(json)
            .expect("valid geocode fixture")
            .into_location()
    }

    #[test]
    fn test_parses_first_result() {
        let location = parse(
            r#"{
                "status": "OK",
                "results": [
                    {
                        "formatted_address": "3131 Las Vegas Blvd S",
                        "geometry": {"location": {"lat": 36.1263781, "lng": -115.165818}}
                    },
                    {
                        "formatted_address": "elsewhere",
                        "geometry": {"location": {"lat": 1.0, "lng": 2.0}}
                    }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(location, Some(Location::new(36.1263781, -115.165818)));
    }

    #[test]
    fn test_zero_results_is_not_an_error() {
        assert_eq!(parse(r#"{"status": "ZERO_RESULTS", "results": []}"#).unwrap(), None);
    }

    #[test]
    fn test_error_status_carries_message() {
        let err = parse(
            r#"{
                "status": "REQUEST_DENIED",
                "error_message": "The provided API key is invalid."
            }"#,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "provider returned REQUEST_DENIED: The provided API key is invalid."
        );
    }

    #[test]
    fn test_missing_api_key_fails_fast() {
        let err = HttpGeocoder::new(GeocoderConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Config(ConfigError::MissingApiKey { .. })
        ));

        let blank = GeocoderConfig {
            api_key: Some("  ".to_string()),
            ..GeocoderConfig::default()
        };
        assert!(HttpGeocoder::new(blank).is_err());
    }

    #[test]
    fn test_accepts_configured_key() {
        let config = GeocoderConfig {
            api_key: Some("test-key".to_string()),
            region: Some("us".to_string()),
            ..GeocoderConfig::default()
        };
        assert!(HttpGeocoder::new(config).is_ok());
    }
}
