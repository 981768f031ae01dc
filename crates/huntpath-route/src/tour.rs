//! Christofides-style tour construction.
//!
//! Turns a minimum spanning tree into a closed tour visiting every clue
//! once, in four phases:
//!
//! 1. **Match** -- pair up the odd-degree tree nodes
//!    ([`match_odd_nodes`]). Adding one edge per pair makes every degree
//!    even.
//! 2. **Multigraph** -- tree edges plus matching edges, parallel edges
//!    allowed ([`build_multigraph`]).
//! 3. **Eulerian circuit** -- Hierholzer's algorithm walks every
//!    multigraph edge exactly once ([`eulerian_circuit`]).
//! 4. **Shortcut** -- keep each clue the first time the circuit reaches
//!    it ([`shortcut`]). Under the triangle inequality this never makes
//!    the walk longer.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::degree::{degrees, odd_degree_nodes};
use crate::graph::Graph;
use crate::mst::minimum_spanning_tree;
use crate::types::{ClueId, ClueNode, Edge, RouteError};

/// Largest odd-node set solved exactly by [`MatchingStrategy::Optimal`].
///
/// The exact solver is a DP over subsets (`2^k` states), so it is capped;
/// larger sets fall back to greedy matching.
pub const MAX_OPTIMAL_MATCHING_NODES: usize = 16;

/// How the odd-degree MST nodes are paired up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchingStrategy {
    /// Repeatedly pair the unmatched node with the smallest id with its
    /// nearest unmatched partner.
    #[default]
    Greedy,

    /// Exact minimum-weight perfect matching for up to
    /// [`MAX_OPTIMAL_MATCHING_NODES`] nodes, greedy above that.
    Optimal,
}

impl fmt::Display for MatchingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Greedy => f.write_str("greedy"),
            Self::Optimal => f.write_str("optimal"),
        }
    }
}

impl FromStr for MatchingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "greedy" => Ok(Self::Greedy),
            "optimal" => Ok(Self::Optimal),
            other => Err(format!("unknown matching strategy: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Phase 1: Matching
// ---------------------------------------------------------------------------

/// Pair up `odd` nodes, returning one edge per pair.
///
/// `odd` should have even length. With an odd count the last node left
/// over stays unmatched.
#[must_use]
pub fn match_odd_nodes(odd: &[ClueNode], strategy: MatchingStrategy) -> Vec<Edge> {
    let mut sorted = odd.to_vec();
    sorted.sort_by_key(|n| n.id);

    let matching = match strategy {
        MatchingStrategy::Optimal
            if sorted.len() <= MAX_OPTIMAL_MATCHING_NODES && sorted.len() % 2 == 0 =>
        {
            optimal_matching(&sorted)
        }
        _ => greedy_matching(&sorted),
    };

    tracing::debug!(
        odd = odd.len(),
        pairs = matching.len(),
        %strategy,
        weight = matching.iter().map(|e| e.weight).fold(0.0, |acc, w| acc + w),
        "matched odd-degree nodes"
    );
    matching
}

/// Greedy nearest-partner matching over id-sorted nodes.
fn greedy_matching(sorted: &[ClueNode]) -> Vec<Edge> {
    let mut remaining = sorted.to_vec();
    let mut matching = Vec::with_capacity(sorted.len() / 2);

    while !remaining.is_empty() {
        let a = remaining.remove(0);
        let mut best: Option<(usize, f64)> = None;
        for (j, b) in remaining.iter().enumerate() {
            let d = a.distance(*b);
            // Strict `<` keeps the smaller id on ties since `remaining`
            // is sorted by id.
            if best.is_none_or(|(_, best_d)| d < best_d) {
                best = Some((j, d));
            }
        }
        let Some((j, _)) = best else {
            break;
        };
        let b = remaining.remove(j);
        tracing::trace!(from = a.id, to = b.id, "greedy pair");
        matching.push(Edge::new(a, b));
    }
    matching
}

/// Exact minimum-weight perfect matching by DP over subsets.
///
/// `dp[mask]` is the cheapest way to pair up exactly the nodes in `mask`,
/// `None` while no pairing of `mask` has been reached. Each transition
/// pairs the lowest unpaired node with some later one, so every matching
/// is generated once. `sorted.len()` must be even and at most
/// [`MAX_OPTIMAL_MATCHING_NODES`].
///
/// Falls back to [`greedy_matching`] if the table does not yield a full
/// matching.
fn optimal_matching(sorted: &[ClueNode]) -> Vec<Edge> {
    let k = sorted.len();
    if k == 0 {
        return Vec::new();
    }
    let full = (1usize << k) - 1;
    let mut dp: Vec<Option<f64>> = vec![None; full + 1];
    let mut choice: Vec<Option<(usize, usize)>> = vec![None; full + 1];
    dp[0] = Some(0.0);

    for mask in 0..full {
        let Some(base) = dp[mask] else {
            continue;
        };
        let i = (!mask).trailing_zeros() as usize;
        if i >= k {
            continue;
        }
        for j in (i + 1)..k {
            if mask & (1 << j) != 0 {
                continue;
            }
            let next = mask | (1 << i) | (1 << j);
            let cost = base + sorted[i].distance(sorted[j]);
            // The first transition into `next` always lands, even when the
            // cost overflowed to infinity.
            if dp[next].is_none_or(|best| cost < best) {
                dp[next] = Some(cost);
                choice[next] = Some((i, j));
            }
        }
    }

    let mut matching = Vec::with_capacity(k / 2);
    let mut mask = full;
    while let Some((i, j)) = choice[mask] {
        matching.push(Edge::new(sorted[i], sorted[j]));
        mask &= !((1 << i) | (1 << j));
    }
    if matching.len() * 2 != k {
        tracing::debug!(odd = k, "optimal matching incomplete, using greedy");
        return greedy_matching(sorted);
    }
    matching.reverse();
    matching
}

// ---------------------------------------------------------------------------
// Phase 2: Multigraph
// ---------------------------------------------------------------------------

/// Undirected multigraph over `nodes` holding every edge in `edges`.
///
/// Node weights are the clue nodes themselves, edge weights the distances.
/// Parallel edges are kept.
///
/// # Errors
///
/// Returns [`RouteError::UnknownNode`] if an edge endpoint is not in
/// `nodes`.
pub fn build_multigraph(
    nodes: &[ClueNode],
    edges: &[Edge],
) -> Result<UnGraph<ClueNode, f64>, RouteError> {
    let mut graph = UnGraph::with_capacity(nodes.len(), edges.len());
    let mut index: HashMap<ClueId, NodeIndex> = HashMap::with_capacity(nodes.len());
    for &node in nodes {
        index
            .entry(node.id)
            .or_insert_with(|| graph.add_node(node));
    }
    for edge in edges {
        let a = *index
            .get(&edge.from.id)
            .ok_or(RouteError::UnknownNode { id: edge.from.id })?;
        let b = *index
            .get(&edge.to.id)
            .ok_or(RouteError::UnknownNode { id: edge.to.id })?;
        graph.add_edge(a, b, edge.weight);
    }
    Ok(graph)
}

// ---------------------------------------------------------------------------
// Phase 3: Eulerian circuit
// ---------------------------------------------------------------------------

/// Eulerian circuit of `graph` starting (and ending) at `start`.
///
/// The returned walk repeats `start` at the end. A graph with one node and
/// no edges yields `[start]`; an empty graph yields an empty walk.
///
/// # Errors
///
/// - [`RouteError::UnknownNode`] if `start` is not a node of `graph`.
/// - [`RouteError::DisconnectedGraph`] if `graph` has more than one
///   connected component.
/// - [`RouteError::OddDegree`] for the first node with odd degree.
pub fn eulerian_circuit(
    graph: &UnGraph<ClueNode, f64>,
    start: ClueId,
) -> Result<Vec<ClueNode>, RouteError> {
    if graph.node_count() == 0 {
        return Ok(Vec::new());
    }
    let start_index = graph
        .node_indices()
        .find(|&n| graph[n].id == start)
        .ok_or(RouteError::UnknownNode { id: start })?;

    let components = connected_components(graph);
    if components > 1 {
        return Err(RouteError::DisconnectedGraph { components });
    }
    if let Some(odd) = graph
        .node_indices()
        .find(|&n| graph.edges(n).count() % 2 != 0)
    {
        return Err(RouteError::OddDegree { id: graph[odd].id });
    }

    let walk = hierholzer(graph, start_index);
    tracing::debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        walk = walk.len(),
        "built eulerian circuit"
    );
    Ok(walk.into_iter().map(|n| graph[n]).collect())
}

/// Hierholzer's algorithm: follow unused edges until stuck, then back out
/// onto the output. Assumes every degree is even and the graph connected.
fn hierholzer(graph: &UnGraph<ClueNode, f64>, start: NodeIndex) -> Vec<NodeIndex> {
    let mut stack = vec![start];
    let mut path = Vec::with_capacity(graph.edge_count() + 1);
    let mut used_edges = vec![false; graph.edge_count()];

    while let Some(&current) = stack.last() {
        let next_edge = graph.edges(current).find_map(|e| {
            let eidx = e.id().index();
            if used_edges[eidx] {
                None
            } else {
                // `target()` is relative to `current` for undirected edges.
                Some((e.id(), e.target()))
            }
        });

        if let Some((edge_id, target)) = next_edge {
            used_edges[edge_id.index()] = true;
            stack.push(target);
        } else {
            path.push(stack.pop().unwrap_or(start));
        }
    }

    path.reverse();
    path
}

// ---------------------------------------------------------------------------
// Phase 4: Shortcut
// ---------------------------------------------------------------------------

/// Keep the first visit of each node in `walk`, dropping repeats.
#[must_use]
pub fn shortcut(walk: &[ClueNode]) -> Vec<ClueNode> {
    let mut seen = HashSet::with_capacity(walk.len());
    walk.iter().filter(|n| seen.insert(n.id)).copied().collect()
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

/// Closed Christofides-style tour over `points`, beginning at `start`.
///
/// `points` are expected to be validated (unique ids, finite coordinates).
/// The tour lists each clue once; the return leg to the first stop is
/// implicit.
///
/// # Errors
///
/// Returns [`RouteError::UnknownNode`] if `start` is not among `points`.
/// The circuit errors cannot occur for a complete input graph.
pub fn christofides_tour(
    points: &[ClueNode],
    matching: MatchingStrategy,
    start: ClueId,
) -> Result<Vec<ClueNode>, RouteError> {
    if points.is_empty() {
        return Ok(Vec::new());
    }
    let complete = Graph::fully_connected(points);
    let tree = minimum_spanning_tree(&complete);
    let degree_map = degrees(&tree);
    let odd = odd_degree_nodes(&tree, &degree_map);
    let pairs = match_odd_nodes(&odd, matching);

    let mut edges = tree.into_edges();
    edges.extend(pairs);
    let multigraph = build_multigraph(complete.nodes(), &edges)?;
    let circuit = eulerian_circuit(&multigraph, start)?;
    Ok(shortcut(&circuit))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Route;

    fn ids(nodes: &[ClueNode]) -> Vec<ClueId> {
        nodes.iter().map(|n| n.id).collect()
    }

    fn pair_ids(edges: &[Edge]) -> Vec<(ClueId, ClueId)> {
        edges.iter().map(|e| (e.from.id, e.to.id)).collect()
    }

    // --- matching ---

    #[test]
    fn greedy_pairs_nearest_partner() {
        let odd = [
            ClueNode::new(1, 0.0, 0.0),
            ClueNode::new(2, 10.0, 0.0),
            ClueNode::new(3, 1.0, 0.0),
            ClueNode::new(4, 11.0, 0.0),
        ];
        let m = match_odd_nodes(&odd, MatchingStrategy::Greedy);
        assert_eq!(pair_ids(&m), vec![(1, 3), (2, 4)]);
    }

    #[test]
    fn greedy_tie_goes_to_smaller_id() {
        let odd = [
            ClueNode::new(1, 0.0, 0.0),
            ClueNode::new(3, -1.0, 0.0),
            ClueNode::new(2, 1.0, 0.0),
            ClueNode::new(4, 5.0, 5.0),
        ];
        let m = match_odd_nodes(&odd, MatchingStrategy::Greedy);
        assert_eq!(pair_ids(&m)[0], (1, 2));
    }

    #[test]
    fn optimal_beats_greedy_on_trap() {
        // Greedy pairs 0 with its nearest partner 1 and is left with the
        // long (2,3) edge.
        let odd = [
            ClueNode::new(0, 1.0, 0.0),
            ClueNode::new(1, 1.9, 0.0),
            ClueNode::new(2, 0.0, 0.0),
            ClueNode::new(3, 3.0, 0.0),
        ];
        let weight = |m: &[Edge]| m.iter().map(|e| e.weight).sum::<f64>();
        let greedy = match_odd_nodes(&odd, MatchingStrategy::Greedy);
        let optimal = match_odd_nodes(&odd, MatchingStrategy::Optimal);
        assert_eq!(pair_ids(&greedy), vec![(0, 1), (2, 3)]);
        assert!((weight(&greedy) - 3.9).abs() < 1e-9, "greedy: {greedy:?}");
        assert!((weight(&optimal) - 2.1).abs() < 1e-9, "optimal: {optimal:?}");
        assert_eq!(pair_ids(&optimal), vec![(0, 2), (1, 3)]);
    }

    /// Two clusters so far apart that every cross edge overflows to
    /// infinity.
    fn overflowing_clusters() -> [ClueNode; 4] {
        [
            ClueNode::new(1, 1e308, 0.0),
            ClueNode::new(2, -1e308, 0.0),
            ClueNode::new(3, 1e308, 1.0),
            ClueNode::new(4, -1e308, 1.0),
        ]
    }

    #[test]
    fn optimal_matches_across_infinite_weights() {
        let m = match_odd_nodes(&overflowing_clusters(), MatchingStrategy::Optimal);
        assert_eq!(pair_ids(&m), vec![(1, 3), (2, 4)]);
    }

    #[test]
    fn optimal_tour_survives_infinite_weights() {
        for matching in [MatchingStrategy::Greedy, MatchingStrategy::Optimal] {
            let tour = christofides_tour(&overflowing_clusters(), matching, 1).unwrap();
            let mut visited = ids(&tour);
            visited.sort_unstable();
            assert_eq!(visited, vec![1, 2, 3, 4], "{matching}");
        }
    }

    #[test]
    fn optimal_falls_back_above_cap() {
        let odd: Vec<_> = (0..18)
            .map(|i| ClueNode::new(i, f64::from(i as i32), 0.0))
            .collect();
        let m = match_odd_nodes(&odd, MatchingStrategy::Optimal);
        assert_eq!(m.len(), 9);
        let mut covered: Vec<_> = m.iter().flat_map(|e| [e.from.id, e.to.id]).collect();
        covered.sort_unstable();
        assert_eq!(covered, (0..18).collect::<Vec<_>>());
    }

    #[test]
    fn matching_empty_set() {
        assert!(match_odd_nodes(&[], MatchingStrategy::Greedy).is_empty());
        assert!(match_odd_nodes(&[], MatchingStrategy::Optimal).is_empty());
    }

    #[test]
    fn strategy_names_round_trip() {
        for s in [MatchingStrategy::Greedy, MatchingStrategy::Optimal] {
            assert_eq!(s.to_string().parse::<MatchingStrategy>().unwrap(), s);
        }
        assert!("best".parse::<MatchingStrategy>().is_err());
    }

    // --- circuit ---

    #[test]
    fn circuit_on_triangle() {
        let nodes = [
            ClueNode::new(1, 0.0, 0.0),
            ClueNode::new(2, 1.0, 0.0),
            ClueNode::new(3, 0.0, 1.0),
        ];
        let edges = [
            Edge::new(nodes[0], nodes[1]),
            Edge::new(nodes[1], nodes[2]),
            Edge::new(nodes[2], nodes[0]),
        ];
        let g = build_multigraph(&nodes, &edges).unwrap();
        let walk = eulerian_circuit(&g, 2).unwrap();
        assert_eq!(walk.len(), 4);
        assert_eq!(walk[0].id, 2);
        assert_eq!(walk[3].id, 2);
    }

    #[test]
    fn circuit_uses_parallel_edges() {
        let a = ClueNode::new(1, 0.0, 0.0);
        let b = ClueNode::new(2, 0.0, 10.0);
        let g = build_multigraph(&[a, b], &[Edge::new(a, b), Edge::new(a, b)]).unwrap();
        let walk = eulerian_circuit(&g, 1).unwrap();
        assert_eq!(ids(&walk), vec![1, 2, 1]);
        assert_eq!(ids(&shortcut(&walk)), vec![1, 2]);
    }

    #[test]
    fn circuit_rejects_odd_degree() {
        let nodes = [
            ClueNode::new(1, 0.0, 0.0),
            ClueNode::new(2, 1.0, 0.0),
            ClueNode::new(3, 2.0, 0.0),
        ];
        let edges = [Edge::new(nodes[0], nodes[1]), Edge::new(nodes[1], nodes[2])];
        let g = build_multigraph(&nodes, &edges).unwrap();
        assert_eq!(
            eulerian_circuit(&g, 1),
            Err(RouteError::OddDegree { id: 1 })
        );
    }

    #[test]
    fn circuit_rejects_disconnected() {
        let nodes = [
            ClueNode::new(1, 0.0, 0.0),
            ClueNode::new(2, 1.0, 0.0),
            ClueNode::new(3, 5.0, 0.0),
        ];
        let edges = [Edge::new(nodes[0], nodes[1]), Edge::new(nodes[0], nodes[1])];
        let g = build_multigraph(&nodes, &edges).unwrap();
        assert_eq!(
            eulerian_circuit(&g, 1),
            Err(RouteError::DisconnectedGraph { components: 2 })
        );
    }

    #[test]
    fn circuit_unknown_start() {
        let a = ClueNode::new(1, 0.0, 0.0);
        let g = build_multigraph(&[a], &[]).unwrap();
        assert_eq!(
            eulerian_circuit(&g, 9),
            Err(RouteError::UnknownNode { id: 9 })
        );
        assert_eq!(ids(&eulerian_circuit(&g, 1).unwrap()), vec![1]);
    }

    #[test]
    fn multigraph_rejects_unknown_endpoint() {
        let a = ClueNode::new(1, 0.0, 0.0);
        let b = ClueNode::new(2, 0.0, 1.0);
        assert_eq!(
            build_multigraph(&[a], &[Edge::new(a, b)]).unwrap_err(),
            RouteError::UnknownNode { id: 2 }
        );
    }

    // --- shortcut ---

    #[test]
    fn shortcut_keeps_first_visits() {
        let n = |id| ClueNode::new(id, 0.0, 0.0);
        let walk = [n(1), n(2), n(3), n(2), n(4), n(1)];
        assert_eq!(ids(&shortcut(&walk)), vec![1, 2, 3, 4]);
    }

    // --- full tour ---

    #[test]
    fn tour_edge_cases() {
        assert!(christofides_tour(&[], MatchingStrategy::Greedy, 0).unwrap().is_empty());
        let single = [ClueNode::new(5, 1.0, 1.0)];
        assert_eq!(
            ids(&christofides_tour(&single, MatchingStrategy::Greedy, 5).unwrap()),
            vec![5]
        );
    }

    #[test]
    fn tour_on_colinear_points() {
        let points = [
            ClueNode::new(1, 0.0, 0.0),
            ClueNode::new(2, 0.0, 5.0),
            ClueNode::new(3, 0.0, 10.0),
        ];
        let tour = christofides_tour(&points, MatchingStrategy::Greedy, 1).unwrap();
        assert_eq!(tour.len(), 3);
        assert_eq!(tour[0].id, 1);
        assert!((Route::new(tour).closed_length() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn tour_visits_grid_once() {
        let points: Vec<_> = (0..12)
            .map(|i| ClueNode::new(i, f64::from(i as i32 % 4), f64::from(i as i32 / 4)))
            .collect();
        for matching in [MatchingStrategy::Greedy, MatchingStrategy::Optimal] {
            let tour = christofides_tour(&points, matching, 0).unwrap();
            let mut visited = ids(&tour);
            visited.sort_unstable();
            assert_eq!(visited, (0..12).collect::<Vec<_>>());
        }
    }
}
