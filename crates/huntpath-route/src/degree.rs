//! Vertex degree analysis.

use std::collections::HashMap;

use crate::graph::Graph;
use crate::types::{ClueId, ClueNode};

/// Node id → number of incident edges.
pub type DegreeMap = HashMap<ClueId, usize>;

/// Degree of every node in `graph`. Isolated nodes map to 0.
#[must_use]
pub fn degrees(graph: &Graph) -> DegreeMap {
    let mut map: DegreeMap = graph.nodes().iter().map(|n| (n.id, 0)).collect();
    for edge in graph.edges() {
        *map.entry(edge.from.id).or_default() += 1;
        *map.entry(edge.to.id).or_default() += 1;
    }
    map
}

/// Nodes with odd degree, in the graph's node order.
///
/// By the handshake lemma the result always has even length.
#[must_use]
pub fn odd_degree_nodes(graph: &Graph, degrees: &DegreeMap) -> Vec<ClueNode> {
    graph
        .nodes()
        .iter()
        .filter(|n| degrees.get(&n.id).copied().unwrap_or(0) % 2 == 1)
        .copied()
        .collect()
}
