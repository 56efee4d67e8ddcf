//! Provider route shape and the distance/path extraction policies.
//!
//! Providers describe a route with any combination of an aggregate distance,
//! a point path, per-leg data and an encoded polyline. The planner reads them
//! through a fixed fallback chain.

use tracing::warn;

use crate::model::Location;
use crate::polyline::Polyline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Cycling,
}

/// Options for single origin/destination route requests.
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    pub mode: TravelMode,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RouteLeg {
    pub distance_meters: Option<f64>,
    pub path: Option<Vec<Location>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Route {
    pub distance_meters: Option<f64>,
    pub path: Option<Vec<Location>>,
    pub legs: Vec<RouteLeg>,
    /// Precision-5 encoded polyline of the whole route.
    pub encoded_polyline: Option<String>,
}

impl Route {
    /// Aggregate distance, else the sum of the legs that report one.
    pub fn total_distance(&self) -> Option<f64> {
        if let Some(distance) = self.distance_meters.filter(|d| usable_distance(*d)) {
            return Some(distance);
        }

        let leg_distances: Vec<f64> = self
            .legs
            .iter()
            .filter_map(|leg| leg.distance_meters)
            .filter(|d| usable_distance(*d))
            .collect();

        if leg_distances.is_empty() {
            None
        } else {
            Some(leg_distances.iter().sum())
        }
    }

    /// Direct path, else concatenated leg paths, else the decoded polyline.
    ///
    /// Returns an empty vector when none of them yields points.
    pub fn resolved_path(&self) -> Vec<Location> {
        if let Some(path) = self.path.as_ref().filter(|path| !path.is_empty()) {
            return path.clone();
        }

        let from_legs = self.leg_path();
        if !from_legs.is_empty() {
            return from_legs;
        }

        match self.encoded_polyline.as_deref() {
            Some(encoded) if !encoded.is_empty() => match Polyline::decode(encoded) {
                Ok(polyline) => polyline.into_points(),
                Err(err) => {
                    warn!(error = %err, "ignoring undecodable route polyline");
                    Vec::new()
                }
            },
            _ => Vec::new(),
        }
    }

    /// Every leg after the first drops its first point, which repeats the
    /// previous leg's last point.
    fn leg_path(&self) -> Vec<Location> {
        let mut path = Vec::new();
        for (index, leg) in self.legs.iter().enumerate() {
            let Some(points) = leg.path.as_deref() else {
                continue;
            };
            let skip = usize::from(index > 0);
            path.extend(points.iter().skip(skip).copied());
        }
        path
    }
}

fn usable_distance(distance: f64) -> bool {
    distance.is_finite() && distance >= 0.0
}
