//! Drawable path for an ordered route.
//!
//! One multi-waypoint request is preferred. When it yields nothing, the
//! cached pairwise segments are stitched together instead and, if an origin
//! is given, a single origin-to-first-stop segment is prepended.

use std::fmt::Debug;

use tracing::{debug, warn};

use crate::model::{DeliveryNode, Location};
use crate::route::RouteOptions;
use crate::segments::SegmentGraph;
use crate::traits::{Id, RoutingProvider};

/// Drawable path through `order`, starting at `origin` when one is given.
///
/// Asks `routing` for one route through every waypoint first. If that
/// fails or has no geometry, the cached segments are stitched instead and an
/// origin leg is prepended when it can be routed. Returns `None` for an
/// empty order, a missing segment in the fallback, or an empty result.
pub fn resolve_rendered_path<R, I>(
    routing: &R,
    order: &[DeliveryNode<I>],
    segments: &SegmentGraph<I>,
    origin: Option<Location>,
    options: &RouteOptions,
) -> Option<Vec<Location>>
where
    R: RoutingProvider,
    I: Id + Debug,
{
    if order.is_empty() {
        warn!("nothing to render: route has no stops");
        return None;
    }

    let waypoints: Vec<Location> = origin
        .into_iter()
        .chain(order.iter().map(|node| node.location))
        .collect();

    if waypoints.len() >= 2 {
        match routing.route_through(&waypoints) {
            Ok(Some(route)) => {
                let path = route.resolved_path();
                if !path.is_empty() {
                    debug!(
                        waypoints = waypoints.len(),
                        points = path.len(),
                        "rendered path from one route request"
                    );
                    return Some(path);
                }
                debug!(waypoints = waypoints.len(), "multi-waypoint route has no geometry");
            }
            Ok(None) => warn!(waypoints = waypoints.len(), "no multi-waypoint route found"),
            Err(err) => warn!(
                waypoints = waypoints.len(),
                error = %err,
                "multi-waypoint route request failed"
            ),
        }
    }

    let mut path = stitch_segments(order, segments)?;

    if let (Some(origin), Some(first)) = (origin, order.first()) {
        match routing.route(origin, first.location, options) {
            Ok(Some(route)) => {
                let mut combined = route.resolved_path();
                if combined.is_empty() {
                    debug!(first_id = ?first.delivery_id, "origin route has no geometry");
                } else {
                    append_path(&mut combined, &path);
                    path = combined;
                }
            }
            Ok(None) => warn!(first_id = ?first.delivery_id, "no route from origin to first stop"),
            Err(err) => warn!(
                first_id = ?first.delivery_id,
                error = %err,
                "origin route request failed"
            ),
        }
    }

    if path.is_empty() {
        warn!(stops = order.len(), "no renderable path");
        return None;
    }
    debug!(points = path.len(), "rendered path from cached segments");
    Some(path)
}

/// Concatenates the segment paths along `order`.
///
/// Fails when any consecutive pair has no segment.
pub fn stitch_segments<I>(
    order: &[DeliveryNode<I>],
    segments: &SegmentGraph<I>,
) -> Option<Vec<Location>>
where
    I: Id + Debug,
{
    let mut path = Vec::new();
    for pair in order.windows(2) {
        let (from, to) = (&pair[0].delivery_id, &pair[1].delivery_id);
        let Some(segment) = segments.get(from, to) else {
            warn!(origin_id = ?from, destination_id = ?to, "missing segment, cannot stitch path");
            return None;
        };
        append_path(&mut path, &segment.path);
    }
    Some(path)
}

/// Appends `next`, dropping its first point when it equals the last point
/// already in `path`.
pub fn append_path(path: &mut Vec<Location>, next: &[Location]) {
    let skip = match (path.last(), next.first()) {
        (Some(last), Some(first)) if last == first => 1,
        _ => 0,
    };
    path.extend_from_slice(&next[skip..]);
}
