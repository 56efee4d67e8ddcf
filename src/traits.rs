//! Core domain traits for the delivery planner.
//!
//! These are intentionally minimal. Concrete apps implement them for their
//! own delivery/warehouse models and map services.

use std::hash::Hash;

use crate::error::ProviderError;
use crate::model::Location;
use crate::route::{Route, RouteOptions};

/// Unique identifier for planner entities.
pub trait Id: Clone + Eq + Hash {}

impl<T> Id for T where T: Clone + Eq + Hash {}

/// Something that can be placed on the map: a delivery or a warehouse.
pub trait Site {
    type Id: Id;

    fn id(&self) -> &Self::Id;

    /// Stored coordinates, if any. May be invalid (non-finite).
    fn location(&self) -> Option<Location>;

    /// Free-text address used when the stored coordinates are missing.
    fn address(&self) -> Option<&str>;
}

/// Computes routes between waypoints.
///
/// `Ok(None)` means the provider found no route; `Err` is a failed request.
pub trait RoutingProvider {
    fn route(
        &self,
        origin: Location,
        destination: Location,
        options: &RouteOptions,
    ) -> Result<Option<Route>, ProviderError>;

    /// Single route visiting `waypoints` in order. Requires at least two.
    fn route_through(&self, waypoints: &[Location]) -> Result<Option<Route>, ProviderError>;
}

/// Resolves a free-text address to coordinates.
///
/// `Ok(None)` is the provider's "zero results" answer.
pub trait Geocoder {
    fn geocode(&self, address: &str) -> Result<Option<Location>, ProviderError>;
}

/// Receives coordinates resolved for a site; the owner persists them.
pub trait LocationSink<I> {
    fn update_location(&self, id: &I, location: Location);
}

impl<I, F> LocationSink<I> for F
where
    F: Fn(&I, Location),
{
    fn update_location(&self, id: &I, location: Location) {
        self(id, location)
    }
}

/// Hook that ignores resolved locations and knows no sites.
#[derive(Debug, Clone, Copy, Default)]
pub struct Detached;

impl<I> LocationSink<I> for Detached {
    fn update_location(&self, _id: &I, _location: Location) {}
}

/// Looks a site up again by id to read its current location.
pub trait SiteLookup<I> {
    fn location_of(&self, id: &I) -> Option<Location>;
}

impl<I, F> SiteLookup<I> for F
where
    F: Fn(&I) -> Option<Location>,
{
    fn location_of(&self, id: &I) -> Option<Location> {
        self(id)
    }
}

impl<I> SiteLookup<I> for Detached {
    fn location_of(&self, _id: &I) -> Option<Location> {
        None
    }
}

impl<T: RoutingProvider + ?Sized> RoutingProvider for &T {
    fn route(
        &self,
        origin: Location,
        destination: Location,
        options: &RouteOptions,
    ) -> Result<Option<Route>, ProviderError> {
        (**self).route(origin, destination, options)
    }

    fn route_through(&self, waypoints: &[Location]) -> Result<Option<Route>, ProviderError> {
        (**self).route_through(waypoints)
    }
}

impl<T: Geocoder + ?Sized> Geocoder for &T {
    fn geocode(&self, address: &str) -> Result<Option<Location>, ProviderError> {
        (**self).geocode(address)
    }
}
