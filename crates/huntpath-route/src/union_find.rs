//! Disjoint-set forest over clue nodes.
//!
//! Parents are stored per node id. `find` walks parent links without path
//! compression and `union` always makes the root with the smaller id the
//! parent, so the forest shape (and therefore every root) is a pure
//! function of the union sequence.

use std::collections::HashMap;

use crate::types::{ClueId, ClueNode, RouteError};

/// Union-find over a fixed set of clue nodes.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: HashMap<ClueId, ClueNode>,
    components: usize,
}

impl UnionFind {
    /// Every node starts in its own singleton set.
    ///
    /// Repeated ids register once.
    #[must_use]
    pub fn new(nodes: &[ClueNode]) -> Self {
        let parent: HashMap<ClueId, ClueNode> = nodes.iter().map(|n| (n.id, *n)).collect();
        let components = parent.len();
        Self { parent, components }
    }

    /// Root of the set containing `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::UnknownNode`] if `id` was never registered.
    pub fn find(&self, id: ClueId) -> Result<ClueNode, RouteError> {
        let mut current = *self.parent.get(&id).ok_or(RouteError::UnknownNode { id })?;
        loop {
            let parent = *self
                .parent
                .get(&current.id)
                .ok_or(RouteError::UnknownNode { id: current.id })?;
            if parent.id == current.id {
                return Ok(current);
            }
            current = parent;
        }
    }

    /// Merge the sets containing `a` and `b`.
    ///
    /// Returns `false` when they were already in the same set.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::UnknownNode`] if either id is unregistered.
    pub fn union(&mut self, a: ClueId, b: ClueId) -> Result<bool, RouteError> {
        let root_a = self.find(a)?;
        let root_b = self.find(b)?;
        if root_a.id == root_b.id {
            return Ok(false);
        }
        let (parent, child) = if root_a.id < root_b.id {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };
        self.parent.insert(child.id, parent);
        self.components -= 1;
        Ok(true)
    }

    /// Whether `a` and `b` are in the same set.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::UnknownNode`] if either id is unregistered.
    pub fn connected(&self, a: ClueId, b: ClueId) -> Result<bool, RouteError> {
        Ok(self.find(a)?.id == self.find(b)?.id)
    }

    /// Number of disjoint sets.
    #[must_use]
    pub const fn component_count(&self) -> usize {
        self.components
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn nodes(ids: &[ClueId]) -> Vec<ClueNode> {
        ids.iter()
            .map(|&id| ClueNode::new(id, 0.0, 0.0))
            .collect()
    }

    #[test]
    fn singletons_are_own_roots() {
        let uf = UnionFind::new(&nodes(&[1, 2, 3]));
        assert_eq!(uf.find(2).unwrap().id, 2);
        assert_eq!(uf.component_count(), 3);
    }

    #[test]
    fn smaller_root_becomes_parent() {
        let mut uf = UnionFind::new(&nodes(&[4, 7, 9]));
        assert!(uf.union(9, 7).unwrap());
        assert_eq!(uf.find(9).unwrap().id, 7);
        assert!(uf.union(7, 4).unwrap());
        assert_eq!(uf.find(9).unwrap().id, 4);
        assert_eq!(uf.component_count(), 1);
    }

    #[test]
    fn redundant_union_is_noop() {
        let mut uf = UnionFind::new(&nodes(&[1, 2]));
        assert!(uf.union(1, 2).unwrap());
        assert!(!uf.union(2, 1).unwrap());
        assert_eq!(uf.component_count(), 1);
        assert!(uf.connected(1, 2).unwrap());
    }

    #[test]
    fn unknown_node_errors() {
        let mut uf = UnionFind::new(&nodes(&[1]));
        assert_eq!(uf.find(5), Err(RouteError::UnknownNode { id: 5 }));
        assert_eq!(uf.union(1, 5), Err(RouteError::UnknownNode { id: 5 }));
        assert_eq!(uf.connected(6, 1), Err(RouteError::UnknownNode { id: 6 }));
    }

    #[test]
    fn duplicate_ids_register_once() {
        let uf = UnionFind::new(&nodes(&[1, 1, 2]));
        assert_eq!(uf.component_count(), 2);
    }

    #[test]
    fn disjoint_sets_stay_apart() {
        let mut uf = UnionFind::new(&nodes(&[1, 2, 3, 4]));
        uf.union(1, 2).unwrap();
        uf.union(3, 4).unwrap();
        assert!(!uf.connected(1, 3).unwrap());
        assert_eq!(uf.component_count(), 2);
    }
}
