//! Weighted undirected graph over clue nodes.
//!
//! Nodes are unique by id and kept in insertion order; edges always join
//! two member nodes. The same container holds both the fully connected
//! candidate graph and the spanning tree extracted from it.

use std::collections::HashMap;
use std::fmt;

use crate::types::{ClueId, ClueNode, Edge, RouteError, euclidean_distance};
use crate::union_find::UnionFind;

/// Node and edge container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    nodes: Vec<ClueNode>,
    edges: Vec<Edge>,
    index: HashMap<ClueId, usize>,
}

impl Graph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Complete graph over `points`, weighted by planar Euclidean distance.
    ///
    /// See [`Graph::fully_connected_with`].
    #[must_use]
    pub fn fully_connected(points: &[ClueNode]) -> Self {
        Self::fully_connected_with(points, euclidean_distance)
    }

    /// Complete graph over `points` with an explicit distance function.
    ///
    /// Every distinct id becomes a node (first occurrence wins). One edge
    /// is added per unordered pair, enumerated as `(i, j)` with `i < j`
    /// over node order, giving `n * (n - 1) / 2` edges and no self-loops.
    #[must_use]
    pub fn fully_connected_with<F>(points: &[ClueNode], distance: F) -> Self
    where
        F: Fn(&ClueNode, &ClueNode) -> f64,
    {
        let mut graph = Self::new();
        for &point in points {
            graph.add_node(point);
        }

        let n = graph.nodes.len();
        graph.edges.reserve(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = (graph.nodes[i], graph.nodes[j]);
                graph.edges.push(Edge::with_weight(a, b, distance(&a, &b)));
            }
        }

        tracing::debug!(
            nodes = n,
            edges = graph.edges.len(),
            "built fully connected graph"
        );
        graph
    }

    /// Add a node. Returns `false` (and keeps the existing node) if the
    /// id is already present.
    pub fn add_node(&mut self, node: ClueNode) -> bool {
        if self.index.contains_key(&node.id) {
            return false;
        }
        self.index.insert(node.id, self.nodes.len());
        self.nodes.push(node);
        true
    }

    /// Add an edge between two existing nodes.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::UnknownNode`] if either endpoint is not a
    /// node of this graph.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), RouteError> {
        for id in [edge.from.id, edge.to.id] {
            if !self.index.contains_key(&id) {
                return Err(RouteError::UnknownNode { id });
            }
        }
        self.edges.push(edge);
        Ok(())
    }

    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: ClueId) -> Option<ClueNode> {
        self.index.get(&id).map(|&i| self.nodes[i])
    }

    /// Position of a node in insertion order.
    #[must_use]
    pub fn position(&self, id: ClueId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Nodes in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[ClueNode] {
        &self.nodes
    }

    /// Edges in insertion order.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Consumes the graph and returns its edges.
    #[must_use]
    pub fn into_edges(self) -> Vec<Edge> {
        self.edges
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Sum of all edge weights.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.edges.iter().map(|e| e.weight).fold(0.0, |acc, w| acc + w)
    }

    /// Number of connected components (isolated nodes count as one each).
    #[must_use]
    pub fn component_count(&self) -> usize {
        let mut uf = UnionFind::new(&self.nodes);
        for edge in &self.edges {
            // `add_edge` rejects edges with unknown endpoints, so every
            // union here succeeds.
            if let Err(err) = uf.union(edge.from.id, edge.to.id) {
                tracing::warn!(%err, "component count skipped edge");
            }
        }
        uf.component_count()
    }
}

/// Adjacency listing, one line per node: `<id> -> <neighbour ids>`.
impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut adjacency: HashMap<ClueId, Vec<ClueId>> = HashMap::new();
        for edge in &self.edges {
            adjacency.entry(edge.from.id).or_default().push(edge.to.id);
            adjacency.entry(edge.to.id).or_default().push(edge.from.id);
        }

        for (line, node) in self.nodes.iter().enumerate() {
            if line > 0 {
                writeln!(f)?;
            }
            write!(f, "{} ->", node.id)?;
            let neighbours = adjacency.get(&node.id).map_or(&[][..], Vec::as_slice);
            for (i, id) in neighbours.iter().enumerate() {
                let sep = if i == 0 { " " } else { ", " };
                write!(f, "{sep}{id}")?;
            }
        }
        Ok(())
    }
}
