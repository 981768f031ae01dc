//! huntpath-route: visiting-order engine for scavenger-hunt clues.
//!
//! Given a set of clue locations, computes a short route visiting every
//! one of them:
//! validation -> complete graph -> Kruskal MST -> odd-degree matching ->
//! Eulerian circuit -> shortcut -> orientation.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! point slices and returns structured data. Serialization of routes for
//! callers and previews lives in `huntpath-export`.

pub mod degree;
pub mod diagnostics;
pub mod graph;
pub mod mst;
pub mod ordering;
pub mod planner;
pub mod tour;
pub mod types;
pub mod union_find;
pub mod validation;

pub use graph::Graph;
pub use ordering::{RouteOrderer, RouteStrategy};
pub use planner::Planner;
pub use tour::{MAX_OPTIMAL_MATCHING_NODES, MatchingStrategy};
pub use types::{ClueId, ClueNode, Edge, Route, RouteConfig, RouteError, StagedRoute};
pub use union_find::UnionFind;
pub use validation::{ValidatedPoints, validate_points};

/// Order `points` into a route using `config`.
///
/// The result depends only on the set of points, not their input order.
///
/// # Errors
///
/// Returns [`RouteError::NonFiniteCoordinate`] or
/// [`RouteError::DuplicateId`] for invalid input and
/// [`RouteError::UnknownStart`] if `config.start` is not among the points.
pub fn plan(points: &[ClueNode], config: &RouteConfig) -> Result<Route, RouteError> {
    config.strategy.order(points, config)
}

/// Visiting order of clue ids with the default configuration.
///
/// # Errors
///
/// See [`plan`].
pub fn find_ordered_route(points: &[ClueNode]) -> Result<Vec<ClueId>, RouteError> {
    Ok(plan(points, &RouteConfig::default())?.ids())
}
