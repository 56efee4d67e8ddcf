//! Test fixtures for delivery-planner.
//!
//! Provides:
//! - Real Las Vegas / Henderson places (from OpenStreetMap)
//! - A delivery type implementing `Site`
//! - Counting geocoder and routing providers

#![allow(dead_code)]

pub mod las_vegas;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use delivery_planner::error::ProviderError;
use delivery_planner::haversine::HaversineRouter;
use delivery_planner::model::Location;
use delivery_planner::resolver::normalize_address;
use delivery_planner::route::{Route, RouteOptions};
use delivery_planner::traits::{Geocoder, RoutingProvider, Site};

pub use las_vegas::*;

/// Builder for test deliveries with sensible defaults.
#[derive(Debug, Clone)]
pub struct TestDelivery {
    pub id: String,
    pub location: Option<Location>,
    pub address: Option<String>,
}

impl TestDelivery {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            location: None,
            address: None,
        }
    }

    /// Delivery with stored coordinates taken from `place`.
    pub fn at(id: &str, place: &Place) -> Self {
        Self::new(id).location(place.location()).address(place.name)
    }

    /// Delivery that only knows the address of `place`.
    pub fn addressed(id: &str, place: &Place) -> Self {
        Self::new(id).address(place.name)
    }

    pub fn location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn address(mut self, address: &str) -> Self {
        self.address = Some(address.to_string());
        self
    }
}

impl Site for TestDelivery {
    type Id = String;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn location(&self) -> Option<Location> {
        self.location
    }

    fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }
}

/// Geocoder answering from a fixed address book, counting every call.
pub struct CountingGeocoder {
    book: HashMap<String, Location>,
    calls: AtomicUsize,
    delay: Duration,
}

impl CountingGeocoder {
    pub fn new(places: &[Place]) -> Self {
        Self {
            book: places
                .iter()
                .map(|place| (normalize_address(place.name), place.location()))
                .collect(),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    /// Every lookup sleeps for `delay` before answering.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Geocoder for CountingGeocoder {
    fn geocode(&self, address: &str) -> Result<Option<Location>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if address.contains("offline") {
            return Err(ProviderError::Malformed("geocoder offline".to_string()));
        }
        Ok(self.book.get(&normalize_address(address)).copied())
    }
}

/// Haversine router that counts calls and can refuse multi-waypoint routes.
#[derive(Default)]
pub struct CountingRouter {
    inner: HaversineRouter,
    pub refuse_multi: bool,
    pub refuse_single: bool,
    single_calls: AtomicUsize,
    multi_calls: AtomicUsize,
}

impl CountingRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing_multi() -> Self {
        Self {
            refuse_multi: true,
            ..Self::default()
        }
    }

    pub fn single_calls(&self) -> usize {
        self.single_calls.load(Ordering::SeqCst)
    }

    pub fn multi_calls(&self) -> usize {
        self.multi_calls.load(Ordering::SeqCst)
    }
}

impl RoutingProvider for CountingRouter {
    fn route(
        &self,
        origin: Location,
        destination: Location,
        options: &RouteOptions,
    ) -> Result<Option<Route>, ProviderError> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        if self.refuse_single {
            return Err(ProviderError::Malformed("router offline".to_string()));
        }
        self.inner.route(origin, destination, options)
    }

    fn route_through(&self, waypoints: &[Location]) -> Result<Option<Route>, ProviderError> {
        self.multi_calls.fetch_add(1, Ordering::SeqCst);
        if self.refuse_multi {
            return Ok(None);
        }
        self.inner.route_through(waypoints)
    }
}
