//! Kruskal minimum spanning tree.
//!
//! Candidate edges are stable-sorted by weight, so equal-weight edges are
//! considered in the graph's own enumeration order and the tree is
//! reproducible for a given node order.

use crate::graph::Graph;
use crate::union_find::UnionFind;

/// Minimum spanning tree (or forest) of `graph`.
///
/// The result contains every node of `graph` and `|nodes| - c` edges,
/// where `c` is the number of connected components of the input.
#[must_use = "returns the spanning tree without modifying the input graph"]
pub fn minimum_spanning_tree(graph: &Graph) -> Graph {
    let mut tree = Graph::new();
    if graph.is_empty() {
        return tree;
    }
    for &node in graph.nodes() {
        tree.add_node(node);
    }

    let mut candidates = graph.edges().to_vec();
    candidates.sort_by(|a, b| a.weight.total_cmp(&b.weight));

    let mut uf = UnionFind::new(graph.nodes());
    let target = graph.len() - 1;
    let mut accepted = 0;
    for edge in candidates {
        if accepted == target {
            break;
        }
        // `Graph::add_edge` only admits edges between member nodes, and both
        // `uf` and `tree` hold every node of `graph`, so neither call below
        // can report `UnknownNode`.
        match uf.union(edge.from.id, edge.to.id) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(err) => {
                tracing::warn!(%err, "mst skipped edge");
                continue;
            }
        }
        tracing::trace!(
            from = edge.from.id,
            to = edge.to.id,
            weight = edge.weight,
            "mst accepted edge"
        );
        if let Err(err) = tree.add_edge(edge) {
            tracing::warn!(%err, "mst skipped edge");
            continue;
        }
        accepted += 1;
    }

    tracing::debug!(
        nodes = tree.len(),
        edges = accepted,
        total_weight = tree.total_weight(),
        "built minimum spanning tree"
    );
    tree
}
