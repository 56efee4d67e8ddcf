//! OSRM HTTP adapter for routes.

use serde::Deserialize;
use tracing::debug;

use crate::error::{ConfigError, ProviderError};
use crate::model::Location;
use crate::route::{Route, RouteLeg, RouteOptions, TravelMode};
use crate::traits::RoutingProvider;

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    /// Profile used for driving routes and for multi-waypoint routes.
    pub profile: String,
    pub walking_profile: String,
    pub cycling_profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            walking_profile: "foot".to_string(),
            cycling_profile: "bike".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, ProviderError> {
        if config.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl { provider: "osrm" }.into());
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn profile(&self, mode: TravelMode) -> &str {
        match mode {
            TravelMode::Driving => &self.config.profile,
            TravelMode::Walking => &self.config.walking_profile,
            TravelMode::Cycling => &self.config.cycling_profile,
        }
    }

    fn fetch(&self, profile: &str, waypoints: &[Location]) -> Result<Option<Route>, ProviderError> {
        let url = format!(
            "{}/route/v1/{}/{}?overview=full&geometries=polyline&steps=false",
            self.config.base_url.trim_end_matches('/'),
            profile,
            coordinates(waypoints)
        );
        debug!(%url, "requesting OSRM route");

        let response = self.client.get(url).send()?;
        let status = response.status();
        // OSRM reports routing failures (e.g. NoRoute) as JSON with a 4xx status.
        let body = match response.json::<OsrmRouteResponse>() {
            Ok(body) => body,
            Err(err) if status.is_success() => return Err(err.into()),
            Err(_) => {
                return Err(ProviderError::Status {
                    status: status.to_string(),
                    message: None,
                });
            }
        };

        body.into_route()
    }
}

impl RoutingProvider for OsrmClient {
    fn route(
        &self,
        origin: Location,
        destination: Location,
        options: &RouteOptions,
    ) -> Result<Option<Route>, ProviderError> {
        self.fetch(self.profile(options.mode), &[origin, destination])
    }

    fn route_through(&self, waypoints: &[Location]) -> Result<Option<Route>, ProviderError> {
        if waypoints.len() < 2 {
            return Err(ProviderError::TooFewWaypoints(waypoints.len()));
        }
        self.fetch(&self.config.profile, waypoints)
    }
}

/// OSRM expects `lng,lat` pairs separated by `;`.
fn coordinates(waypoints: &[Location]) -> String {
    waypoints
        .iter()
        .map(|point| format!("{:.6},{:.6}", point.longitude, point.latitude))
        .collect::<Vec<_>>()
        .join(";")
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: Option<f64>,
    geometry: Option<String>,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    distance: Option<f64>,
}

impl OsrmRouteResponse {
    fn into_route(self) -> Result<Option<Route>, ProviderError> {
        match self.code.as_str() {
            "Ok" => Ok(self.routes.into_iter().next().map(OsrmRoute::into_route)),
            "NoRoute" | "NoSegment" => Ok(None),
            _ => Err(ProviderError::Status {
                status: self.code,
                message: self.message,
            }),
        }
    }
}

impl OsrmRoute {
    fn into_route(self) -> Route {
        Route {
            distance_meters: self.distance,
            path: None,
            legs: self
                .legs
                .into_iter()
                .map(|leg| RouteLeg {
                    distance_meters: leg.distance,
                    path: None,
                })
                .collect(),
            encoded_polyline: self.geometry,
        }
    }
}
