//! Graph induction: collapse each community into a single super-node

use crate::cluster::Partition;
use crate::error::{LouvainError, Result};
use crate::graph::layered::TypedDiGraph;
use ndarray::Array1;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Build the graph induced by `partition`.
///
/// Induced node `c` stands for community `c`; its type vector is the sum of
/// its members' vectors. Every edge (u, v, w) adds w to the induced edge
/// (p(u), p(v)), so edges inside a community become a self-loop. Total edge
/// weight and the type vector sum are conserved. Community ids are expected
/// to be contiguous; an unused id becomes an isolated node with zero types.
pub fn induce(graph: &TypedDiGraph, partition: &Partition) -> Result<TypedDiGraph> {
    let node_count = graph.node_count();
    if partition.len() != node_count {
        return Err(LouvainError::PartitionLengthMismatch {
            expected: node_count,
            found: partition.len(),
        });
    }

    let num_types = graph.node_weights().next().map_or(0, |types| types.len());
    let slots = partition.num_slots();

    let mut induced = TypedDiGraph::with_capacity(slots, graph.edge_count());
    for _ in 0..slots {
        induced.add_node(Array1::zeros(num_types));
    }

    for node in graph.node_indices() {
        let types = &graph[node];
        if types.len() != num_types {
            return Err(LouvainError::InconsistentTypeVectorLength {
                node: node.index(),
                expected: num_types,
                found: types.len(),
            });
        }
        let community = NodeIndex::new(partition[node.index()]);
        induced[community] += types;
    }

    // Edge creation follows the original edge order, which keeps the
    // induced adjacency (and therefore the next level) reproducible.
    let mut edge_slots: HashMap<(usize, usize), EdgeIndex> =
        HashMap::with_capacity(graph.edge_count());
    for edge in graph.edge_references() {
        let key = (
            partition[edge.source().index()],
            partition[edge.target().index()],
        );
        match edge_slots.entry(key) {
            Entry::Occupied(slot) => induced[*slot.get()] += *edge.weight(),
            Entry::Vacant(slot) => {
                let idx = induced.add_edge(
                    NodeIndex::new(key.0),
                    NodeIndex::new(key.1),
                    *edge.weight(),
                );
                slot.insert(idx);
            }
        }
    }

    log::debug!(
        "Induced graph: {} -> {} nodes, {} -> {} edges",
        node_count,
        induced.node_count(),
        graph.edge_count(),
        induced.edge_count()
    );

    Ok(induced)
}
