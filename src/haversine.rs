//! Haversine routing provider (fallback when no road router is available).
//!
//! Uses great-circle distance and straight-line geometry.
//! Less accurate than OSRM (ignores roads) but always available.

use crate::error::ProviderError;
use crate::model::Location;
use crate::route::{Route, RouteLeg, RouteOptions};
use crate::traits::RoutingProvider;

/// Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two points in meters.
pub fn haversine_meters(from: Location, to: Location) -> f64 {
    let lat1_rad = from.latitude.to_radians();
    let lat2_rad = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lng = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Length of a path along its points.
pub fn path_length_meters(path: &[Location]) -> f64 {
    path.windows(2)
        .map(|pair| haversine_meters(pair[0], pair[1]))
        .sum()
}

/// Straight-line router.
///
/// Distances are optionally inflated by `detour_factor` to approximate road
/// distance. Multi-waypoint routes are reported leg by leg.
#[derive(Debug, Clone)]
pub struct HaversineRouter {
    pub detour_factor: f64,
}

impl Default for HaversineRouter {
    fn default() -> Self {
        Self { detour_factor: 1.0 }
    }
}

impl HaversineRouter {
    pub fn new(detour_factor: f64) -> Self {
        Self { detour_factor }
    }

    fn leg(&self, from: Location, to: Location) -> RouteLeg {
        RouteLeg {
            distance_meters: Some(haversine_meters(from, to) * self.detour_factor),
            path: Some(vec![from, to]),
        }
    }
}

impl RoutingProvider for HaversineRouter {
    fn route(
        &self,
        origin: Location,
        destination: Location,
        _options: &RouteOptions,
    ) -> Result<Option<Route>, ProviderError> {
        if !origin.is_valid() || !destination.is_valid() {
            return Ok(None);
        }
        let leg = self.leg(origin, destination);
        Ok(Some(Route {
            distance_meters: leg.distance_meters,
            path: leg.path,
            ..Route::default()
        }))
    }

    fn route_through(&self, waypoints: &[Location]) -> Result<Option<Route>, ProviderError> {
        if waypoints.len() < 2 {
            return Err(ProviderError::TooFewWaypoints(waypoints.len()));
        }
        if waypoints.iter().any(|point| !point.is_valid()) {
            return Ok(None);
        }

        let legs: Vec<RouteLeg> = waypoints
            .windows(2)
            .map(|pair| self.leg(pair[0], pair[1]))
            .collect();

        Ok(Some(Route {
            distance_meters: None,
            path: None,
            legs,
            encoded_polyline: None,
        }))
    }
}
