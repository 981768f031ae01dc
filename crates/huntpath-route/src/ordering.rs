//! Route ordering strategies.
//!
//! This module defines the [`RouteOrderer`] trait for pluggable ordering
//! heuristics and the [`RouteStrategy`] enum for runtime selection. Both
//! strategies produce a closed tour which [`orient`] then rotates into the
//! final route.

use std::fmt;
use std::str::FromStr;

use rstar::RTree;
use rstar::primitives::GeomWithData;
use serde::{Deserialize, Serialize};

use crate::tour::christofides_tour;
use crate::types::{ClueId, ClueNode, Route, RouteConfig, RouteError};
use crate::validation::validate_points;

/// Selects which ordering heuristic to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteStrategy {
    /// Minimum spanning tree, odd-node matching, Eulerian circuit and
    /// shortcutting.
    ///
    /// With an exact matching this is within 1.5x of the optimal closed
    /// tour; the greedy matching loses that bound but stays close in
    /// practice.
    #[default]
    Christofides,

    /// Start at the first clue and always walk to the nearest unvisited
    /// one.
    ///
    /// Cheap and often within 25% of optimal, but can strand a far clue
    /// until the very end.
    NearestNeighbor,
}

impl fmt::Display for RouteStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Christofides => f.write_str("christofides"),
            Self::NearestNeighbor => f.write_str("nearest-neighbor"),
        }
    }
}

impl FromStr for RouteStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "christofides" => Ok(Self::Christofides),
            "nearest-neighbor" => Ok(Self::NearestNeighbor),
            other => Err(format!("unknown route strategy: {other}")),
        }
    }
}

/// Trait for route ordering strategies.
///
/// Input: raw clue points in any order. Output: every distinct clue
/// exactly once, oriented per `config`.
pub trait RouteOrderer {
    /// Order the given points into a route.
    ///
    /// # Errors
    ///
    /// Returns a [`RouteError`] if the points fail validation or the
    /// configured start is not among them.
    fn order(&self, points: &[ClueNode], config: &RouteConfig) -> Result<Route, RouteError>;
}

impl RouteOrderer for RouteStrategy {
    fn order(&self, points: &[ClueNode], config: &RouteConfig) -> Result<Route, RouteError> {
        let validated = validate_points(points)?;
        validated.check_start(config.start)?;
        let points = validated.points();
        let Some(first) = points.first() else {
            return Ok(Route::default());
        };
        let start = config.start.unwrap_or(first.id);

        let tour = match *self {
            Self::Christofides => christofides_tour(points, config.matching, start)?,
            Self::NearestNeighbor => nearest_neighbor_tour(points, start)?,
        };
        let route = orient(tour, config)?;
        tracing::debug!(
            strategy = %self,
            stops = route.len(),
            length = route.length(),
            closed_length = route.closed_length(),
            "ordered route"
        );
        Ok(route)
    }
}

type IndexedClue = GeomWithData<[f64; 2], ClueNode>;

/// Greedy nearest-neighbour tour starting at `start`.
///
/// Distance ties go to the smaller id. Points must have unique ids.
///
/// # Errors
///
/// Returns [`RouteError::UnknownNode`] if `start` is not among `points`.
pub fn nearest_neighbor_tour(
    points: &[ClueNode],
    start: ClueId,
) -> Result<Vec<ClueNode>, RouteError> {
    if points.is_empty() {
        return Ok(Vec::new());
    }
    let mut current = *points
        .iter()
        .find(|p| p.id == start)
        .ok_or(RouteError::UnknownNode { id: start })?;

    let mut tree: RTree<IndexedClue> = RTree::bulk_load(
        points
            .iter()
            .filter(|p| p.id != start)
            .map(|&p| GeomWithData::new([p.lat, p.long], p))
            .collect(),
    );

    let mut tour = Vec::with_capacity(points.len());
    tour.push(current);
    while let Some(next) = nearest_unvisited(&tree, current) {
        tree.remove(&next);
        current = next.data;
        tour.push(current);
    }
    Ok(tour)
}

/// Nearest entry of `tree` to `from`, smallest id among equidistant ones.
fn nearest_unvisited(tree: &RTree<IndexedClue>, from: ClueNode) -> Option<IndexedClue> {
    let mut candidates = tree.nearest_neighbor_iter_with_distance_2(&[from.lat, from.long]);
    let (first, best) = candidates.next()?;
    let winner = candidates
        .take_while(|(_, d2)| d2.total_cmp(&best).is_eq())
        .map(|(c, _)| c)
        .fold(first, |a, b| if b.data.id < a.data.id { b } else { a });
    Some(*winner)
}

/// Rotate a closed tour into the final route.
///
/// - With `config.start` set, the route begins at that clue.
/// - Otherwise with `config.open_route`, the longest leg of the closed
///   tour (the first one on ties) is dropped, and the resulting open path
///   is read from its smaller-id endpoint.
/// - Otherwise the route begins at the smallest id.
///
/// # Errors
///
/// Returns [`RouteError::UnknownStart`] if `config.start` is not in `tour`.
pub fn orient(mut tour: Vec<ClueNode>, config: &RouteConfig) -> Result<Route, RouteError> {
    let offset = if let Some(id) = config.start {
        tour.iter()
            .position(|n| n.id == id)
            .ok_or(RouteError::UnknownStart { id })?
    } else if tour.len() < 2 {
        0
    } else if config.open_route {
        (longest_leg(&tour) + 1) % tour.len()
    } else {
        tour.iter()
            .enumerate()
            .min_by_key(|(_, n)| n.id)
            .map_or(0, |(i, _)| i)
    };
    tour.rotate_left(offset);

    if config.start.is_none()
        && config.open_route
        && let (Some(first), Some(last)) = (tour.first(), tour.last())
        && last.id < first.id
    {
        tour.reverse();
    }
    Ok(Route::new(tour))
}

/// Index `i` of the longest leg `tour[i] -> tour[i + 1]`, including the
/// closing leg back to `tour[0]`.
fn longest_leg(tour: &[ClueNode]) -> usize {
    let n = tour.len();
    let mut best = (0, f64::NEG_INFINITY);
    for i in 0..n {
        let leg = tour[i].distance(tour[(i + 1) % n]);
        if leg > best.1 {
            best = (i, leg);
        }
    }
    best.0
}
