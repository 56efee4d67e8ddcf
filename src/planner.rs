//! End-to-end planning: resolve, build segments, order, render.
//!
//! Each stage degrades on partial failure (one delivery, one segment) and
//! only a stage that produces nothing at all ends the run with `None`.

use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{info, warn};

use crate::model::{DeliveryNode, Location, OptimalRoute};
use crate::polyline::Polyline;
use crate::render::resolve_rendered_path;
use crate::resolver::{LocationResolver, Unresolved};
use crate::route::RouteOptions;
use crate::segments::build_segments;
use crate::solver::{SolveOptions, find_optimal_route};
use crate::traits::{Geocoder, Id, LocationSink, RoutingProvider, Site, SiteLookup};

#[derive(Debug, Clone, Default)]
pub struct PlannerOptions {
    pub solve: SolveOptions,
    pub route: RouteOptions,
}

/// Input for one planning run.
pub struct PlanRequest<'a, S: Site> {
    pub deliveries: &'a [S],
    /// Start of the trip (usually the warehouse); not part of the order.
    pub origin: Option<Location>,
    pub preferred_start: Option<S::Id>,
}

impl<'a, S: Site> PlanRequest<'a, S> {
    pub fn new(deliveries: &'a [S]) -> Self {
        Self {
            deliveries,
            origin: None,
            preferred_start: None,
        }
    }

    pub fn origin(mut self, origin: Location) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn preferred_start(mut self, id: S::Id) -> Self {
        self.preferred_start = Some(id);
        self
    }
}

/// A delivery left out of the plan.
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedSite<I> {
    pub id: I,
    pub reason: Unresolved,
}

#[derive(Debug, Clone)]
pub struct PlannedRoute<I> {
    pub route: OptimalRoute<I>,
    pub path: Polyline,
    pub unresolved: Vec<UnresolvedSite<I>>,
}

pub struct RoutePlanner<R, G, I> {
    routing: R,
    resolver: LocationResolver<G, I>,
    options: PlannerOptions,
}

impl<R, G, I> RoutePlanner<R, G, I>
where
    R: RoutingProvider + Sync,
    G: Geocoder,
    I: Id + Debug + Send + Sync,
{
    pub fn new(routing: R, geocoder: G) -> Self {
        Self::with_options(routing, geocoder, PlannerOptions::default())
    }

    pub fn with_options(routing: R, geocoder: G, options: PlannerOptions) -> Self {
        Self {
            routing,
            resolver: LocationResolver::new(geocoder),
            options,
        }
    }

    /// The delivery resolver; its caches live as long as the planner.
    pub fn resolver(&self) -> &LocationResolver<G, I> {
        &self.resolver
    }

    pub fn routing(&self) -> &R {
        &self.routing
    }

    /// Resolves every delivery to a node, collecting the ones that fail.
    ///
    /// After each attempt the delivery is looked up again; a valid
    /// looked-up location wins over the resolved one. Repeated ids are kept
    /// once.
    pub fn resolve_nodes<S, K, L>(
        &self,
        deliveries: &[S],
        sink: &K,
        lookup: &L,
    ) -> (Vec<DeliveryNode<I>>, Vec<UnresolvedSite<I>>)
    where
        S: Site<Id = I>,
        K: LocationSink<I> + ?Sized,
        L: SiteLookup<I> + ?Sized,
    {
        let mut nodes = Vec::with_capacity(deliveries.len());
        let mut unresolved = Vec::new();
        let mut seen = HashSet::new();

        for delivery in deliveries {
            let id = delivery.id();
            if !seen.insert(id) {
                warn!(delivery_id = ?id, "duplicate delivery ignored");
                continue;
            }

            let resolution = self.resolver.resolve(delivery, sink);
            let current = lookup.location_of(id).and_then(Location::valid);
            match (current, resolution) {
                (Some(location), _) | (None, Ok(location)) => nodes.push(DeliveryNode {
                    delivery_id: id.clone(),
                    location,
                }),
                (None, Err(reason)) => unresolved.push(UnresolvedSite {
                    id: id.clone(),
                    reason,
                }),
            }
        }

        (nodes, unresolved)
    }

    /// Runs the whole pipeline for one request.
    pub fn plan<S, K, L>(
        &self,
        request: &PlanRequest<'_, S>,
        sink: &K,
        lookup: &L,
    ) -> Option<PlannedRoute<I>>
    where
        S: Site<Id = I>,
        K: LocationSink<I> + ?Sized,
        L: SiteLookup<I> + ?Sized,
    {
        let (nodes, unresolved) = self.resolve_nodes(request.deliveries, sink, lookup);
        if nodes.len() < 2 {
            warn!(
                resolved = nodes.len(),
                unresolved = unresolved.len(),
                "need at least two located deliveries to plan a route"
            );
            return None;
        }

        let segments = build_segments(&self.routing, &nodes, &self.options.route);
        let route = find_optimal_route(
            &nodes,
            &segments,
            request.preferred_start.as_ref(),
            &self.options.solve,
        )?;
        let path = resolve_rendered_path(
            &self.routing,
            &route.order,
            &segments,
            request.origin.filter(Location::is_valid),
            &self.options.route,
        )?;

        info!(
            stops = route.len(),
            unresolved = unresolved.len(),
            distance_meters = route.total_distance,
            path_points = path.len(),
            "route planned"
        );

        Some(PlannedRoute {
            route,
            path: Polyline::new(path),
            unresolved,
        })
    }
}

/// Caller-side staleness check for overlapping planning runs.
///
/// The planner itself always runs to completion; callers take a ticket
/// before starting and drop the result if a newer run has begun since.
#[derive(Debug, Default)]
pub struct RunSequence {
    latest: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTicket(u64);

impl RunSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> RunTicket {
        RunTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RunTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}
