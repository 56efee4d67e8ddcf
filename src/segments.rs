//! Pairwise segment graph.
//!
//! One directed segment per ordered pair of distinct nodes. Provider calls
//! for the missing pairs run in parallel; results are memoised in pair order.

use std::collections::{HashMap, HashSet, hash_map};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::haversine::path_length_meters;
use crate::model::{DeliveryNode, RouteSegment};
use crate::route::RouteOptions;
use crate::traits::{Id, RoutingProvider};

/// Directed travel segments keyed by `(origin_id, destination_id)`.
#[derive(Debug, Clone)]
pub struct SegmentGraph<I> {
    segments: HashMap<(I, I), RouteSegment>,
}

impl<I: Id> Default for SegmentGraph<I> {
    fn default() -> Self {
        Self {
            segments: HashMap::new(),
        }
    }
}

impl<I: Id> SegmentGraph<I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a segment. Self-loops are rejected and `false` is returned.
    pub fn insert(&mut self, origin: I, destination: I, segment: RouteSegment) -> bool {
        if origin == destination {
            return false;
        }
        self.segments.insert((origin, destination), segment);
        true
    }

    /// Segment from `origin` to `destination`; direction matters.
    pub fn get(&self, origin: &I, destination: &I) -> Option<&RouteSegment> {
        self.segments.get(&(origin.clone(), destination.clone()))
    }

    pub fn distance(&self, origin: &I, destination: &I) -> Option<f64> {
        self.get(origin, destination).map(|s| s.distance_meters)
    }

    pub fn contains(&self, origin: &I, destination: &I) -> bool {
        self.get(origin, destination).is_some()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, (I, I), RouteSegment> {
        self.segments.iter()
    }
}

/// Computes the segment graph for `nodes` using `routing`.
///
/// Pairs the provider cannot route, or routes with neither a usable
/// distance nor a path, are left out.
pub fn build_segments<R, I>(
    routing: &R,
    nodes: &[DeliveryNode<I>],
    options: &RouteOptions,
) -> SegmentGraph<I>
where
    R: RoutingProvider + Sync,
    I: Id + std::fmt::Debug + Send + Sync,
{
    let mut graph = SegmentGraph::new();
    extend_segments(routing, nodes, options, &mut graph);
    graph
}

/// Adds the segments missing from `graph`. Existing entries are kept.
pub fn extend_segments<R, I>(
    routing: &R,
    nodes: &[DeliveryNode<I>],
    options: &RouteOptions,
    graph: &mut SegmentGraph<I>,
) where
    R: RoutingProvider + Sync,
    I: Id + std::fmt::Debug + Send + Sync,
{
    let routable: Vec<&DeliveryNode<I>> = nodes.iter().filter(|node| is_routable(node)).collect();
    let mut pairs: Vec<(&DeliveryNode<I>, &DeliveryNode<I>)> = Vec::new();
    let mut seen = HashSet::new();
    for &origin in &routable {
        for &destination in &routable {
            if origin.delivery_id == destination.delivery_id
                || graph.contains(&origin.delivery_id, &destination.delivery_id)
                || !seen.insert((&origin.delivery_id, &destination.delivery_id))
            {
                continue;
            }
            pairs.push((origin, destination));
        }
    }

    debug!(nodes = nodes.len(), requests = pairs.len(), "building segment graph");

    let fetched: Vec<Option<RouteSegment>> = pairs
        .par_iter()
        .map(|&(origin, destination)| fetch_segment(routing, origin, destination, options))
        .collect();

    for ((origin, destination), segment) in pairs.into_iter().zip(fetched) {
        if let Some(segment) = segment {
            graph.insert(
                origin.delivery_id.clone(),
                destination.delivery_id.clone(),
                segment,
            );
        }
    }

    debug!(segments = graph.len(), "segment graph ready");
}

fn is_routable<I: std::fmt::Debug>(node: &DeliveryNode<I>) -> bool {
    let valid = node.location.is_valid();
    if !valid {
        warn!(delivery_id = ?node.delivery_id, "skipping node with invalid location");
    }
    valid
}

fn fetch_segment<R, I>(
    routing: &R,
    origin: &DeliveryNode<I>,
    destination: &DeliveryNode<I>,
    options: &RouteOptions,
) -> Option<RouteSegment>
where
    R: RoutingProvider,
    I: std::fmt::Debug,
{
    let route = match routing.route(origin.location, destination.location, options) {
        Ok(Some(route)) => route,
        Ok(None) => {
            warn!(
                origin_id = ?origin.delivery_id,
                destination_id = ?destination.delivery_id,
                "no route between deliveries"
            );
            return None;
        }
        Err(err) => {
            warn!(
                origin_id = ?origin.delivery_id,
                destination_id = ?destination.delivery_id,
                error = %err,
                "segment request failed"
            );
            return None;
        }
    };

    let path = route.resolved_path();
    let distance = match route.total_distance() {
        Some(distance) => distance,
        // Path without a distance: measure the path itself.
        None if path.len() > 1 => path_length_meters(&path),
        None => {
            warn!(
                origin_id = ?origin.delivery_id,
                destination_id = ?destination.delivery_id,
                "route has neither a usable distance nor a path"
            );
            return None;
        }
    };

    Some(RouteSegment {
        distance_meters: distance,
        path,
    })
}

/// Sum of consecutive segment distances along `order`, or `None` when a
/// transition has no segment.
pub fn route_distance<I: Id>(order: &[DeliveryNode<I>], graph: &SegmentGraph<I>) -> Option<f64> {
    order
        .windows(2)
        .map(|pair| graph.distance(&pair[0].delivery_id, &pair[1].delivery_id))
        .sum()
}
