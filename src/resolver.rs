//! Location cache and resolver.
//!
//! A site keeps its stored coordinates when they are valid. Otherwise its
//! address is geocoded, at most once per site at a time: concurrent callers
//! for the same id block on the resolution already in flight and share its
//! result. Successful lookups are cached by normalised address for the
//! lifetime of the resolver and pushed back to the site's owner through a
//! [`LocationSink`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tracing::{debug, warn};

use crate::model::Location;
use crate::traits::{Geocoder, Id, LocationSink, Site};

/// Why a site ended up without coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unresolved {
    /// No stored location and no usable address.
    MissingAddress,
    /// The geocoder found nothing for the address.
    ZeroResults,
    /// The geocoder request failed or returned unusable coordinates.
    ProviderFailure,
}

type Resolution = Result<Location, Unresolved>;
type InFlight<I> = Mutex<HashMap<I, Arc<OnceLock<Resolution>>>>;

/// Resolves sites with ids of type `I` through geocoder `G`.
///
/// Safe to share between threads. The address cache outlives individual
/// resolutions and is shared with resolvers made by [`share`](Self::share).
pub struct LocationResolver<G, I> {
    geocoder: Arc<G>,
    cache: Arc<Mutex<HashMap<String, Location>>>,
    in_flight: InFlight<I>,
}

impl<G, I> LocationResolver<G, I>
where
    G: Geocoder,
    I: Id + std::fmt::Debug,
{
    pub fn new(geocoder: G) -> Self {
        Self {
            geocoder: Arc::new(geocoder),
            cache: Arc::new(Mutex::new(HashMap::new())),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Resolver for another kind of site (e.g. warehouses).
    ///
    /// Shares the geocoder and the address cache; in-flight tracking is
    /// separate because ids of different kinds are unrelated.
    pub fn share<J>(&self) -> LocationResolver<G, J>
    where
        J: Id + std::fmt::Debug,
    {
        LocationResolver {
            geocoder: Arc::clone(&self.geocoder),
            cache: Arc::clone(&self.cache),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the site's coordinates, geocoding its address if needed.
    pub fn ensure_location<S, K>(&self, site: &S, sink: &K) -> Option<Location>
    where
        S: Site<Id = I>,
        K: LocationSink<I> + ?Sized,
    {
        self.resolve(site, sink).ok()
    }

    /// Like [`ensure_location`](Self::ensure_location) but reports why a
    /// site could not be resolved.
    pub fn resolve<S, K>(&self, site: &S, sink: &K) -> Result<Location, Unresolved>
    where
        S: Site<Id = I>,
        K: LocationSink<I> + ?Sized,
    {
        if let Some(location) = site.location().and_then(Location::valid) {
            return Ok(location);
        }

        let id = site.id();
        let cell = {
            let mut in_flight = lock(&self.in_flight);
            match in_flight.get(id) {
                Some(cell) => {
                    debug!(site_id = ?id, "joining in-flight location resolution");
                    Arc::clone(cell)
                }
                None => {
                    let cell = Arc::new(OnceLock::new());
                    in_flight.insert(id.clone(), Arc::clone(&cell));
                    cell
                }
            }
        };

        let _guard = InFlightGuard {
            registry: &self.in_flight,
            id,
            cell: &cell,
        };

        *cell.get_or_init(|| self.geocode_site(id, site.address(), sink))
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    /// Cached coordinates for an address, if it was resolved before.
    pub fn cached(&self, address: &str) -> Option<Location> {
        lock(&self.cache).get(&normalize_address(address)).copied()
    }

    pub fn cache_len(&self) -> usize {
        lock(&self.cache).len()
    }

    /// Number of sites currently being resolved.
    pub fn in_flight_len(&self) -> usize {
        lock(&self.in_flight).len()
    }

    fn geocode_site<K>(&self, id: &I, address: Option<&str>, sink: &K) -> Resolution
    where
        K: LocationSink<I> + ?Sized,
    {
        let Some(address) = address.map(str::trim).filter(|a| !a.is_empty()) else {
            warn!(site_id = ?id, "cannot resolve location without an address");
            return Err(Unresolved::MissingAddress);
        };

        let key = normalize_address(address);
        if let Some(location) = lock(&self.cache).get(&key).copied() {
            debug!(site_id = ?id, address, "address served from geocode cache");
            sink.update_location(id, location);
            return Ok(location);
        }

        match self.geocoder.geocode(address) {
            Ok(Some(location)) if location.is_valid() => {
                lock(&self.cache).insert(key, location);
                sink.update_location(id, location);
                debug!(
                    site_id = ?id,
                    address,
                    latitude = location.latitude,
                    longitude = location.longitude,
                    "geocoded delivery address"
                );
                Ok(location)
            }
            Ok(Some(_)) => {
                warn!(site_id = ?id, address, "geocoder returned non-finite coordinates");
                Err(Unresolved::ProviderFailure)
            }
            Ok(None) => {
                warn!(site_id = ?id, address, "geocoder found no results");
                Err(Unresolved::ZeroResults)
            }
            Err(err) => {
                warn!(site_id = ?id, address, error = %err, "geocoding failed");
                Err(Unresolved::ProviderFailure)
            }
        }
    }
}

/// Removes the registry entry on every exit path, unless a newer
/// resolution has already replaced it.
struct InFlightGuard<'a, I: Id> {
    registry: &'a InFlight<I>,
    id: &'a I,
    cell: &'a Arc<OnceLock<Resolution>>,
}

impl<I: Id> Drop for InFlightGuard<'_, I> {
    fn drop(&mut self) {
        let mut registry = lock(self.registry);
        let is_ours = registry
            .get(self.id)
            .is_some_and(|current| Arc::ptr_eq(current, self.cell));
        if is_ours {
            registry.remove(self.id);
        }
    }
}

/// Cache key: trimmed, whitespace collapsed, lowercased.
pub fn normalize_address(address: &str) -> String {
    address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
