//! Plain data shared by every planning stage.

use serde::{Deserialize, Serialize};

/// A geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Both components are finite numbers.
    ///
    /// Invalid locations never enter the segment graph or the solver.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Returns `Some(self)` when the location is valid.
    pub fn valid(self) -> Option<Self> {
        self.is_valid().then_some(self)
    }
}

impl From<(f64, f64)> for Location {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

impl From<Location> for (f64, f64) {
    fn from(location: Location) -> Self {
        (location.latitude, location.longitude)
    }
}

/// A delivery reduced to its identifier and a resolved location.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryNode<I> {
    pub delivery_id: I,
    pub location: Location,
}

impl<I> DeliveryNode<I> {
    /// Builds a node, rejecting invalid locations.
    pub fn new(delivery_id: I, location: Location) -> Option<Self> {
        location.is_valid().then_some(Self {
            delivery_id,
            location,
        })
    }
}

/// Directed travel leg between two nodes as computed by the routing provider.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RouteSegment {
    pub distance_meters: f64,
    pub path: Vec<Location>,
}

/// A visiting order over a node set and its summed segment distance.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimalRoute<I> {
    pub order: Vec<DeliveryNode<I>>,
    pub total_distance: f64,
}

impl<I> OptimalRoute<I> {
    /// Delivery ids in visiting order.
    pub fn ids(&self) -> impl Iterator<Item = &I> {
        self.order.iter().map(|node| &node.delivery_id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
