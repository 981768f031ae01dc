//! Input validation: the gate every point set passes before graph
//! construction.
//!
//! Points come out sorted by identifier. Everything downstream enumerates
//! nodes in that order, so the result of a run depends only on the point
//! *set*, never on the order the caller supplied it in.

use serde::{Deserialize, Serialize};

use crate::types::{ClueId, ClueNode, RouteError};

/// A point set that passed validation: finite coordinates, unique ids,
/// sorted ascending by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedPoints {
    points: Vec<ClueNode>,
    collapsed: usize,
}

impl ValidatedPoints {
    /// The validated points, sorted by id.
    #[must_use]
    pub fn points(&self) -> &[ClueNode] {
        &self.points
    }

    /// Consumes the set and returns the points.
    #[must_use]
    pub fn into_points(self) -> Vec<ClueNode> {
        self.points
    }

    /// How many exact duplicates (same id, same coordinates) were dropped.
    #[must_use]
    pub const fn collapsed(&self) -> usize {
        self.collapsed
    }

    /// Number of distinct points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if no points survived.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Look up a point by id.
    #[must_use]
    pub fn get(&self, id: ClueId) -> Option<ClueNode> {
        self.points
            .binary_search_by_key(&id, |p| p.id)
            .ok()
            .map(|i| self.points[i])
    }

    /// Checks that a configured start clue is present.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::UnknownStart`] if `start` is set and absent.
    pub fn check_start(&self, start: Option<ClueId>) -> Result<(), RouteError> {
        match start {
            Some(id) if self.get(id).is_none() => Err(RouteError::UnknownStart { id }),
            _ => Ok(()),
        }
    }
}

/// Validate a raw point list.
///
/// # Errors
///
/// - [`RouteError::NonFiniteCoordinate`] for the first point (in input
///   order) with a NaN or infinite coordinate.
/// - [`RouteError::DuplicateId`] if one id appears with two different
///   coordinates. Exact repeats are collapsed silently.
pub fn validate_points(points: &[ClueNode]) -> Result<ValidatedPoints, RouteError> {
    if let Some(bad) = points.iter().find(|p| !p.is_finite()) {
        return Err(RouteError::NonFiniteCoordinate {
            id: bad.id,
            lat: bad.lat,
            long: bad.long,
        });
    }

    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.id);

    let mut unique: Vec<ClueNode> = Vec::with_capacity(sorted.len());
    let mut collapsed = 0;
    for point in sorted {
        match unique.last() {
            Some(prev) if prev.id == point.id => {
                if !prev.same_location(point) {
                    return Err(RouteError::DuplicateId { id: point.id });
                }
                collapsed += 1;
            }
            _ => unique.push(point),
        }
    }

    tracing::debug!(
        input = points.len(),
        unique = unique.len(),
        collapsed,
        "validated clue points"
    );

    Ok(ValidatedPoints {
        points: unique,
        collapsed,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn sorts_by_id() {
        let points = [
            ClueNode::new(3, 0.0, 0.0),
            ClueNode::new(1, 1.0, 1.0),
            ClueNode::new(2, 2.0, 2.0),
        ];
        let v = validate_points(&points).unwrap();
        let ids: Vec<_> = v.points().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(v.collapsed(), 0);
    }

    #[test]
    fn empty_input_is_valid() {
        let v = validate_points(&[]).unwrap();
        assert!(v.is_empty());
    }

    #[test]
    fn exact_duplicates_collapse() {
        let points = [
            ClueNode::new(1, 1.0, 1.0),
            ClueNode::new(2, 2.0, 2.0),
            ClueNode::new(1, 1.0, 1.0),
        ];
        let v = validate_points(&points).unwrap();
        assert_eq!(v.len(), 2);
        assert_eq!(v.collapsed(), 1);
    }

    #[test]
    fn signed_zero_duplicates_collapse() {
        let points = [
            ClueNode::new(1, 0.0, 0.0),
            ClueNode::new(1, -0.0, 0.0),
            ClueNode::new(2, 1.0, 1.0),
        ];
        let v = validate_points(&points).unwrap();
        assert_eq!(v.len(), 2);
        assert_eq!(v.collapsed(), 1);
    }

    #[test]
    fn conflicting_duplicate_rejected() {
        let points = [ClueNode::new(5, 1.0, 1.0), ClueNode::new(5, 1.0, 2.0)];
        assert_eq!(
            validate_points(&points),
            Err(RouteError::DuplicateId { id: 5 })
        );
    }

    #[test]
    fn non_finite_rejected() {
        let points = [ClueNode::new(1, 1.0, 1.0), ClueNode::new(9, f64::NAN, 0.0)];
        assert!(matches!(
            validate_points(&points),
            Err(RouteError::NonFiniteCoordinate { id: 9, .. })
        ));
    }

    #[test]
    fn start_must_exist() {
        let v = validate_points(&[ClueNode::new(1, 0.0, 0.0)]).unwrap();
        assert!(v.check_start(None).is_ok());
        assert!(v.check_start(Some(1)).is_ok());
        assert_eq!(
            v.check_start(Some(2)),
            Err(RouteError::UnknownStart { id: 2 })
        );
    }

    #[test]
    fn lookup_by_id() {
        let v = validate_points(&[ClueNode::new(4, 1.0, 2.0), ClueNode::new(2, 3.0, 4.0)]).unwrap();
        assert_eq!(v.get(4), Some(ClueNode::new(4, 1.0, 2.0)));
        assert_eq!(v.get(3), None);
    }
}
