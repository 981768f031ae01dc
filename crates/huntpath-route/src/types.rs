//! Shared types for the huntpath route-ordering engine.

use geo::Euclidean;
use geo::line_measures::Distance;
use serde::{Deserialize, Serialize};

use crate::ordering::RouteStrategy;
use crate::tour::MatchingStrategy;

/// Caller-assigned clue identifier.
pub type ClueId = i64;

/// A clue location: an identifier plus a planar coordinate.
///
/// Coordinates are raw latitude/longitude values treated as a flat plane.
/// That is only a reasonable approximation over a small area (a campus,
/// a park), which is the scale scavenger hunts are played at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClueNode {
    /// Unique identifier supplied by the caller.
    pub id: ClueId,
    /// Latitude, used as the first planar axis.
    pub lat: f64,
    /// Longitude, used as the second planar axis.
    pub long: f64,
}

impl ClueNode {
    /// Create a new clue node.
    #[must_use]
    pub const fn new(id: ClueId, lat: f64, long: f64) -> Self {
        Self { id, lat, long }
    }

    /// The node as a `geo::Point` (`x = lat`, `y = long`).
    #[must_use]
    pub fn to_point(self) -> geo::Point<f64> {
        geo::Point::new(self.lat, self.long)
    }

    /// Planar Euclidean distance to another node.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        euclidean_distance(&self, &other)
    }

    /// Whether both coordinates are finite.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.lat.is_finite() && self.long.is_finite()
    }

    /// Whether both nodes sit on equal coordinates (`0.0` equals `-0.0`).
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn same_location(self, other: Self) -> bool {
        self.lat == other.lat && self.long == other.long
    }
}

/// Default edge weight: straight-line distance over raw coordinates.
///
/// No great-circle correction is applied.
#[must_use]
pub fn euclidean_distance(a: &ClueNode, b: &ClueNode) -> f64 {
    Euclidean.distance(&a.to_point(), &b.to_point())
}

/// Sum of consecutive leg lengths along `walk`; `0.0` below two stops.
#[must_use]
pub fn walk_length(walk: &[ClueNode]) -> f64 {
    // An empty `f64` sum is `-0.0`; folding from `0.0` keeps it positive.
    walk.windows(2)
        .map(|w| w[0].distance(w[1]))
        .fold(0.0, |acc, d| acc + d)
}

/// A weighted connection between two clue nodes.
///
/// The `(from, to)` orientation is kept for bookkeeping only; two edges
/// joining the same pair in either direction are equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// One endpoint.
    pub from: ClueNode,
    /// The other endpoint.
    pub to: ClueNode,
    /// Euclidean length of the edge.
    pub weight: f64,
}

impl Edge {
    /// Create an edge weighted by Euclidean distance.
    #[must_use]
    pub fn new(from: ClueNode, to: ClueNode) -> Self {
        Self::with_weight(from, to, euclidean_distance(&from, &to))
    }

    /// Create an edge with an explicit weight.
    #[must_use]
    pub const fn with_weight(from: ClueNode, to: ClueNode, weight: f64) -> Self {
        Self { from, to, weight }
    }

    /// Whether `id` is one of the endpoints.
    #[must_use]
    pub const fn touches(&self, id: ClueId) -> bool {
        self.from.id == id || self.to.id == id
    }

    /// The endpoint opposite `id`, or `None` if `id` is not an endpoint.
    #[must_use]
    pub const fn other_end(&self, id: ClueId) -> Option<ClueNode> {
        if self.from.id == id {
            Some(self.to)
        } else if self.to.id == id {
            Some(self.from)
        } else {
            None
        }
    }

    /// Whether both edges join the same unordered pair of nodes.
    #[must_use]
    pub const fn connects_same_pair(&self, other: &Self) -> bool {
        (self.from.id == other.from.id && self.to.id == other.to.id)
            || (self.from.id == other.to.id && self.to.id == other.from.id)
    }
}

/// An ordered visiting sequence over clue nodes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Route(Vec<ClueNode>);

impl Route {
    /// Create a route from stops in visiting order.
    #[must_use]
    pub const fn new(stops: Vec<ClueNode>) -> Self {
        Self(stops)
    }

    /// Returns `true` if the route has no stops.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of stops.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Stops in visiting order.
    #[must_use]
    pub fn stops(&self) -> &[ClueNode] {
        &self.0
    }

    /// Consumes the route and returns the stops.
    #[must_use]
    pub fn into_stops(self) -> Vec<ClueNode> {
        self.0
    }

    /// Clue identifiers in visiting order.
    #[must_use]
    pub fn ids(&self) -> Vec<ClueId> {
        self.0.iter().map(|n| n.id).collect()
    }

    /// Length of the open path: the sum of consecutive legs.
    #[must_use]
    pub fn length(&self) -> f64 {
        walk_length(&self.0)
    }

    /// Length of the closed tour: the open length plus the return leg.
    #[must_use]
    pub fn closed_length(&self) -> f64 {
        match (self.0.first(), self.0.last()) {
            (Some(first), Some(last)) if self.0.len() > 1 => self.length() + last.distance(*first),
            _ => 0.0,
        }
    }
}

/// Configuration for a route-ordering run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Which ordering heuristic to use.
    pub strategy: RouteStrategy,

    /// How odd-degree MST nodes are paired (Christofides only).
    pub matching: MatchingStrategy,

    /// Clue to start the route at. When `None` the start is chosen by
    /// `open_route`.
    pub start: Option<ClueId>,

    /// When `true` (and no `start` is set) the closed tour is rotated so
    /// its longest leg is the one left out, giving the shortest open path
    /// obtainable from that tour. When `false` the route starts at the
    /// smallest identifier.
    pub open_route: bool,
}

impl RouteConfig {
    /// Default ordering heuristic.
    pub const DEFAULT_STRATEGY: RouteStrategy = RouteStrategy::Christofides;
    /// Default odd-node matching.
    pub const DEFAULT_MATCHING: MatchingStrategy = MatchingStrategy::Greedy;
    /// Default open/closed orientation.
    pub const DEFAULT_OPEN_ROUTE: bool = true;
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            strategy: Self::DEFAULT_STRATEGY,
            matching: Self::DEFAULT_MATCHING,
            start: None,
            open_route: Self::DEFAULT_OPEN_ROUTE,
        }
    }
}

/// A route together with every intermediate the planner produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedRoute {
    /// Validated points, sorted by identifier.
    pub points: Vec<ClueNode>,
    /// Minimum spanning tree over the points.
    pub tree: Vec<Edge>,
    /// MST nodes with odd degree.
    pub odd_nodes: Vec<ClueNode>,
    /// Edges pairing up the odd nodes.
    pub matching: Vec<Edge>,
    /// Eulerian circuit over tree + matching (first node repeated at the end).
    pub circuit: Vec<ClueNode>,
    /// Final shortcut route.
    pub route: Route,
}

/// Errors raised while ordering a route.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum RouteError {
    /// The same identifier was supplied with two different coordinates.
    #[error("clue {id} appears more than once with different coordinates")]
    DuplicateId {
        /// Offending identifier.
        id: ClueId,
    },

    /// A coordinate was NaN or infinite.
    #[error("clue {id} has a non-finite coordinate (lat={lat}, long={long})")]
    NonFiniteCoordinate {
        /// Offending identifier.
        id: ClueId,
        /// Latitude as supplied.
        lat: f64,
        /// Longitude as supplied.
        long: f64,
    },

    /// A node was referenced that is not part of the structure.
    #[error("clue {id} is not a node of this graph")]
    UnknownNode {
        /// Missing identifier.
        id: ClueId,
    },

    /// The graph handed to circuit construction is not connected.
    #[error("graph is disconnected ({components} components); no single route covers every clue")]
    DisconnectedGraph {
        /// Number of connected components found.
        components: usize,
    },

    /// Circuit construction found a node of odd degree.
    #[error("clue {id} has odd degree; no Eulerian circuit exists")]
    OddDegree {
        /// First odd node found.
        id: ClueId,
    },

    /// The configured start clue is not among the points.
    #[error("start clue {id} is not among the supplied points")]
    UnknownStart {
        /// Configured start identifier.
        id: ClueId,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- ClueNode ---

    #[test]
    fn distance_is_pythagorean() {
        let a = ClueNode::new(1, 0.0, 0.0);
        let b = ClueNode::new(2, 3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < 1e-12);
        assert!((b.distance(a) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn distance_to_self_is_zero() {
        let a = ClueNode::new(1, 14.0, 11.0);
        assert!(a.distance(a).abs() < f64::EPSILON);
    }

    #[test]
    fn non_finite_detected() {
        assert!(ClueNode::new(1, 1.0, 2.0).is_finite());
        assert!(!ClueNode::new(1, f64::NAN, 2.0).is_finite());
        assert!(!ClueNode::new(1, 1.0, f64::INFINITY).is_finite());
    }

    // --- Edge ---

    #[test]
    fn edge_weight_matches_distance() {
        let e = Edge::new(ClueNode::new(1, 0.0, 0.0), ClueNode::new(2, 0.0, 10.0));
        assert!((e.weight - 10.0).abs() < 1e-12);
    }

    #[test]
    fn edge_pair_equivalence_ignores_orientation() {
        let a = ClueNode::new(1, 0.0, 0.0);
        let b = ClueNode::new(2, 1.0, 0.0);
        let c = ClueNode::new(3, 2.0, 0.0);
        assert!(Edge::new(a, b).connects_same_pair(&Edge::new(b, a)));
        assert!(!Edge::new(a, b).connects_same_pair(&Edge::new(a, c)));
    }

    #[test]
    fn edge_other_end() {
        let a = ClueNode::new(1, 0.0, 0.0);
        let b = ClueNode::new(2, 1.0, 0.0);
        let e = Edge::new(a, b);
        assert_eq!(e.other_end(1), Some(b));
        assert_eq!(e.other_end(2), Some(a));
        assert_eq!(e.other_end(3), None);
        assert!(e.touches(1) && e.touches(2) && !e.touches(3));
    }

    // --- Route ---

    #[test]
    fn route_lengths() {
        let route = Route::new(vec![
            ClueNode::new(1, 0.0, 0.0),
            ClueNode::new(2, 0.0, 5.0),
            ClueNode::new(3, 0.0, 10.0),
        ]);
        assert_eq!(route.ids(), vec![1, 2, 3]);
        assert!((route.length() - 10.0).abs() < 1e-12);
        assert!((route.closed_length() - 20.0).abs() < 1e-12);
    }

    #[test]
    fn route_degenerate_lengths() {
        let is_positive_zero = |v: f64| v == 0.0 && v.is_sign_positive();
        assert!(is_positive_zero(Route::default().length()));
        assert!(is_positive_zero(Route::default().closed_length()));
        let single = Route::new(vec![ClueNode::new(7, 1.0, 1.0)]);
        assert!(is_positive_zero(single.length()));
        assert!(is_positive_zero(single.closed_length()));
        assert!(is_positive_zero(walk_length(&[])));
    }

    // --- RouteConfig ---

    #[test]
    fn config_defaults() {
        let config = RouteConfig::default();
        assert_eq!(config.strategy, RouteStrategy::Christofides);
        assert_eq!(config.matching, MatchingStrategy::Greedy);
        assert_eq!(config.start, None);
        assert!(config.open_route);
    }

    #[test]
    fn config_partial_json_uses_defaults() {
        let config: RouteConfig = serde_json::from_str(r#"{"start": 4}"#).unwrap();
        assert_eq!(config.start, Some(4));
        assert_eq!(config.strategy, RouteConfig::DEFAULT_STRATEGY);
    }

    // --- RouteError ---

    #[test]
    fn error_display_names_offending_clue() {
        let err = RouteError::DuplicateId { id: 12 };
        assert_eq!(
            err.to_string(),
            "clue 12 appears more than once with different coordinates",
        );
        let err = RouteError::DisconnectedGraph { components: 3 };
        assert!(err.to_string().contains("3 components"));
    }

    #[test]
    fn error_serde_round_trip() {
        let err = RouteError::UnknownStart { id: 99 };
        let json = serde_json::to_string(&err).unwrap();
        let back: RouteError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, back);
    }
}
