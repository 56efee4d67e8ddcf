//! Route order optimizer.
//!
//! Small node sets are searched exhaustively with branch-and-bound; larger
//! ones, or sets for which the exact search finds no complete order, use a
//! nearest-neighbour heuristic. Orders are open paths: there is no return
//! leg to the first node.

use std::fmt::Debug;

use tracing::{debug, warn};

use crate::model::{DeliveryNode, OptimalRoute};
use crate::segments::SegmentGraph;
use crate::traits::Id;

/// Largest node count handled by the exact search by default.
pub const DEFAULT_EXACT_THRESHOLD: usize = 8;

/// Hard cap for the exact search; the used-set is a `u32` bitmask.
const MAX_EXACT_NODES: usize = 20;

#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Node sets up to this size are solved exactly.
    pub exact_threshold: usize,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            exact_threshold: DEFAULT_EXACT_THRESHOLD,
        }
    }
}

impl SolveOptions {
    fn exact_limit(&self) -> usize {
        self.exact_threshold.min(MAX_EXACT_NODES)
    }
}

/// Picks a visiting order over `nodes`.
///
/// Returns `None` when neither solver finds an order that visits every node
/// using existing segments.
pub fn find_optimal_route<I>(
    nodes: &[DeliveryNode<I>],
    segments: &SegmentGraph<I>,
    preferred_start: Option<&I>,
    options: &SolveOptions,
) -> Option<OptimalRoute<I>>
where
    I: Id + Debug,
{
    if nodes.len() < 2 {
        return Some(OptimalRoute {
            order: nodes.to_vec(),
            total_distance: 0.0,
        });
    }

    if nodes.len() <= options.exact_limit() {
        if let Some(route) = solve_exact(nodes, segments, preferred_start) {
            debug!(nodes = nodes.len(), distance = route.total_distance, "exact order found");
            return Some(route);
        }
        debug!(nodes = nodes.len(), "no complete exact order, trying greedy");
    }

    let route = solve_greedy(nodes, segments, preferred_start);
    match &route {
        Some(route) => {
            debug!(nodes = nodes.len(), distance = route.total_distance, "greedy order found")
        }
        None => warn!(nodes = nodes.len(), "no viable visiting order"),
    }
    route
}

/// Branch-and-bound search for the minimum-distance order.
///
/// A node matching `preferred_start` is fixed in first position. Nodes
/// beyond the exact-search cap are rejected with `None`.
pub fn solve_exact<I>(
    nodes: &[DeliveryNode<I>],
    segments: &SegmentGraph<I>,
    preferred_start: Option<&I>,
) -> Option<OptimalRoute<I>>
where
    I: Id,
{
    if nodes.len() > MAX_EXACT_NODES {
        return None;
    }
    if nodes.len() < 2 {
        return Some(OptimalRoute {
            order: nodes.to_vec(),
            total_distance: 0.0,
        });
    }

    let table = DistanceTable::new(nodes, segments);
    let starts: Vec<usize> = match start_index(nodes, preferred_start) {
        Some(start) => vec![start],
        None => (0..nodes.len()).collect(),
    };

    let mut search = ExactSearch {
        table: &table,
        order: Vec::with_capacity(nodes.len()),
        best_order: None,
        best_distance: f64::INFINITY,
    };
    for start in starts {
        search.order.push(start);
        search.branch(1 << start, 0.0);
        search.order.pop();
    }

    let best_order = search.best_order?;
    Some(OptimalRoute {
        order: best_order.into_iter().map(|i| nodes[i].clone()).collect(),
        total_distance: search.best_distance,
    })
}

/// Nearest-neighbour order.
///
/// Starts at `preferred_start` when it has an outgoing segment, otherwise at
/// the node with the lowest average outgoing distance (first one wins ties).
/// Fails rather than returning a partial order.
pub fn solve_greedy<I>(
    nodes: &[DeliveryNode<I>],
    segments: &SegmentGraph<I>,
    preferred_start: Option<&I>,
) -> Option<OptimalRoute<I>>
where
    I: Id + Debug,
{
    if nodes.len() < 2 {
        return Some(OptimalRoute {
            order: nodes.to_vec(),
            total_distance: 0.0,
        });
    }

    let table = DistanceTable::new(nodes, segments);
    let preferred = start_index(nodes, preferred_start).filter(|&i| table.has_outgoing(i));
    let Some(start) = preferred.or_else(|| table.most_central()) else {
        warn!(nodes = nodes.len(), "no node has an outgoing segment");
        return None;
    };

    let mut visited = vec![false; nodes.len()];
    let mut order = Vec::with_capacity(nodes.len());
    let mut total_distance = 0.0;
    let mut current = start;
    visited[start] = true;
    order.push(start);

    while order.len() < nodes.len() {
        let mut nearest: Option<(usize, f64)> = None;
        for next in (0..nodes.len()).filter(|&j| !visited[j]) {
            if let Some(step) = table.get(current, next) {
                if nearest.is_none_or(|(_, best)| step < best) {
                    nearest = Some((next, step));
                }
            }
        }

        let Some((next, step)) = nearest else {
            warn!(
                stuck_at = ?nodes[current].delivery_id,
                remaining = nodes.len() - order.len(),
                "greedy order cannot reach the remaining nodes"
            );
            return None;
        };

        visited[next] = true;
        order.push(next);
        total_distance += step;
        current = next;
    }

    Some(OptimalRoute {
        order: order.into_iter().map(|i| nodes[i].clone()).collect(),
        total_distance,
    })
}

fn start_index<I: Id>(nodes: &[DeliveryNode<I>], preferred_start: Option<&I>) -> Option<usize> {
    let id = preferred_start?;
    nodes.iter().position(|node| &node.delivery_id == id)
}

/// Dense view of the segment graph, indexed by node position.
struct DistanceTable {
    cells: Vec<Vec<Option<f64>>>,
}

impl DistanceTable {
    fn new<I: Id>(nodes: &[DeliveryNode<I>], segments: &SegmentGraph<I>) -> Self {
        let cells = nodes
            .iter()
            .map(|from| {
                nodes
                    .iter()
                    .map(|to| segments.distance(&from.delivery_id, &to.delivery_id))
                    .collect()
            })
            .collect();
        Self { cells }
    }

    fn len(&self) -> usize {
        self.cells.len()
    }

    fn get(&self, from: usize, to: usize) -> Option<f64> {
        self.cells[from][to]
    }

    fn has_outgoing(&self, from: usize) -> bool {
        self.cells[from].iter().any(Option::is_some)
    }

    /// Node with the smallest average outgoing distance.
    fn most_central(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, row) in self.cells.iter().enumerate() {
            let outgoing: Vec<f64> = row.iter().flatten().copied().collect();
            if outgoing.is_empty() {
                continue;
            }
            let average = outgoing.iter().sum::<f64>() / outgoing.len() as f64;
            if best.is_none_or(|(_, best_average)| average < best_average) {
                best = Some((index, average));
            }
        }
        best.map(|(index, _)| index)
    }
}

struct ExactSearch<'a> {
    table: &'a DistanceTable,
    order: Vec<usize>,
    best_order: Option<Vec<usize>>,
    best_distance: f64,
}

impl ExactSearch<'_> {
    fn branch(&mut self, used: u32, distance: f64) {
        if self.order.len() == self.table.len() {
            if distance < self.best_distance {
                self.best_distance = distance;
                self.best_order = Some(self.order.clone());
            }
            return;
        }

        let Some(&last) = self.order.last() else {
            return;
        };

        for next in 0..self.table.len() {
            if used & (1 << next) != 0 {
                continue;
            }
            let Some(step) = self.table.get(last, next) else {
                continue;
            };
            let candidate = distance + step;
            if candidate >= self.best_distance {
                continue;
            }
            self.order.push(next);
            self.branch(used | (1 << next), candidate);
            self.order.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Location, RouteSegment};

    fn nodes(ids: &[&'static str]) -> Vec<DeliveryNode<&'static str>> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| DeliveryNode {
                delivery_id: *id,
                location: Location::new(i as f64, 0.0),
            })
            .collect()
    }

    fn graph(edges: &[(&'static str, &'static str, f64)]) -> SegmentGraph<&'static str> {
        let mut graph = SegmentGraph::new();
        for &(from, to, distance) in edges {
            graph.insert(
                from,
                to,
                RouteSegment {
                    distance_meters: distance,
                    path: Vec::new(),
                },
            );
        }
        graph
    }

    fn ids(route: &OptimalRoute<&'static str>) -> Vec<&'static str> {
        route.ids().copied().collect()
    }

    #[test]
    fn test_trivial_inputs() {
        let empty = find_optimal_route(&nodes(&[]), &graph(&[]), None, &SolveOptions::default());
        assert_eq!(empty.map(|r| r.len()), Some(0));

        let single = find_optimal_route(&nodes(&["a"]), &graph(&[]), None, &SolveOptions::default())
            .unwrap();
        assert_eq!(ids(&single), vec!["a"]);
        assert_eq!(single.total_distance, 0.0);
    }

    #[test]
    fn test_exact_finds_asymmetric_optimum() {
        // a->b->c = 2, every other order costs more.
        let segments = graph(&[
            ("a", "b", 1.0),
            ("b", "c", 1.0),
            ("b", "a", 10.0),
            ("c", "b", 10.0),
            ("a", "c", 10.0),
            ("c", "a", 10.0),
        ]);
        let route = solve_exact(&nodes(&["c", "b", "a"]), &segments, None).unwrap();
        assert_eq!(ids(&route), vec!["a", "b", "c"]);
        assert_eq!(route.total_distance, 2.0);
    }

    #[test]
    fn test_exact_respects_preferred_start() {
        let segments = graph(&[
            ("a", "b", 1.0),
            ("b", "c", 1.0),
            ("c", "a", 1.0),
            ("c", "b", 5.0),
            ("b", "a", 5.0),
            ("a", "c", 5.0),
        ]);
        let route = solve_exact(&nodes(&["a", "b", "c"]), &segments, Some(&"c")).unwrap();
        assert_eq!(ids(&route), vec!["c", "a", "b"]);
        assert_eq!(route.total_distance, 2.0);
    }

    #[test]
    fn test_exact_ignores_unknown_preferred_start() {
        let segments = graph(&[("a", "b", 1.0), ("b", "a", 3.0)]);
        let route = solve_exact(&nodes(&["b", "a"]), &segments, Some(&"zz")).unwrap();
        assert_eq!(ids(&route), vec!["a", "b"]);
    }

    #[test]
    fn test_exact_returns_none_without_complete_order() {
        let segments = graph(&[("a", "b", 1.0), ("a", "c", 1.0)]);
        assert!(solve_exact(&nodes(&["a", "b", "c"]), &segments, None).is_none());
    }

    #[test]
    fn test_greedy_picks_most_central_start() {
        // b has the lowest average outgoing distance.
        let segments = graph(&[
            ("a", "b", 4.0),
            ("a", "c", 6.0),
            ("b", "a", 1.0),
            ("b", "c", 2.0),
            ("c", "a", 9.0),
            ("c", "b", 9.0),
        ]);
        let route = solve_greedy(&nodes(&["a", "b", "c"]), &segments, None).unwrap();
        assert_eq!(ids(&route), vec!["b", "a", "c"]);
        assert_eq!(route.total_distance, 7.0);
    }

    #[test]
    fn test_greedy_tie_breaks_on_first_node() {
        let segments = graph(&[("a", "b", 1.0), ("b", "a", 1.0)]);
        let route = solve_greedy(&nodes(&["b", "a"]), &segments, None).unwrap();
        assert_eq!(ids(&route), vec!["b", "a"]);
    }

    #[test]
    fn test_greedy_unreachable_preferred_start_falls_back() {
        let segments = graph(&[("a", "b", 1.0), ("b", "c", 1.0)]);
        let route = solve_greedy(&nodes(&["a", "b", "c"]), &segments, Some(&"c")).unwrap();
        assert_eq!(ids(&route), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_greedy_never_returns_partial_order() {
        let segments = graph(&[("a", "b", 1.0)]);
        assert!(solve_greedy(&nodes(&["a", "b", "c"]), &segments, None).is_none());
        assert!(solve_greedy(&nodes(&["a", "b"]), &graph(&[]), None).is_none());
    }

    #[test]
    fn test_falls_back_to_greedy_when_exact_is_disabled() {
        let segments = graph(&[
            ("a", "b", 1.0),
            ("a", "c", 2.0),
            ("b", "c", 100.0),
            ("c", "b", 1.0),
            ("b", "a", 50.0),
            ("c", "a", 50.0),
        ]);
        let options = SolveOptions { exact_threshold: 0 };
        let greedy = find_optimal_route(&nodes(&["a", "b", "c"]), &segments, Some(&"a"), &options)
            .unwrap();
        assert_eq!(ids(&greedy), vec!["a", "b", "c"]);
        assert_eq!(greedy.total_distance, 101.0);

        let exact = find_optimal_route(
            &nodes(&["a", "b", "c"]),
            &segments,
            Some(&"a"),
            &SolveOptions::default(),
        )
        .unwrap();
        assert_eq!(ids(&exact), vec!["a", "c", "b"]);
        assert_eq!(exact.total_distance, 3.0);
    }
}
