//! Graph construction module

use crate::error::{LouvainError, Result};
use crate::graph::layered::{one_hot, LayeredGraph, TypeVector, TypedDiGraph};
use petgraph::graph::NodeIndex;
use std::collections::HashMap;

/// Builder for incrementally constructing a LayeredGraph
pub struct GraphBuilder {
    /// Length of every node's type vector
    num_types: usize,

    /// Mapping from string IDs to node indices
    id_to_index: HashMap<String, NodeIndex>,

    /// Node string IDs
    node_ids: Vec<String>,

    /// Graph under construction
    graph: TypedDiGraph,
}

impl GraphBuilder {
    /// Create a new builder for graphs with `num_types` node types
    pub fn new(num_types: usize) -> Self {
        Self::with_capacity(num_types, 0, 0)
    }

    /// Create a new graph builder with the given capacity
    pub fn with_capacity(num_types: usize, nodes: usize, edges: usize) -> Self {
        Self {
            num_types,
            id_to_index: HashMap::with_capacity(nodes),
            node_ids: Vec::with_capacity(nodes),
            graph: TypedDiGraph::with_capacity(nodes, edges),
        }
    }

    /// Get or create a node with the given type vector.
    ///
    /// A node id that already exists keeps its first type vector.
    pub fn add_node(&mut self, id: &str, types: TypeVector) -> Result<NodeIndex> {
        if let Some(&idx) = self.id_to_index.get(id) {
            return Ok(idx);
        }

        if types.len() != self.num_types {
            return Err(LouvainError::InconsistentTypeVectorLength {
                node: self.node_ids.len(),
                expected: self.num_types,
                found: types.len(),
            });
        }

        let idx = self.graph.add_node(types);
        self.id_to_index.insert(id.to_string(), idx);
        self.node_ids.push(id.to_string());

        Ok(idx)
    }

    /// Get or create a leaf node belonging to `layer`
    pub fn add_layer_node(&mut self, id: &str, layer: usize) -> Result<NodeIndex> {
        if layer >= self.num_types {
            return Err(LouvainError::InvalidParameter {
                name: "layer",
                message: format!("layer {layer} of node {id} exceeds {} types", self.num_types),
            });
        }
        self.add_node(id, one_hot(layer, self.num_types))
    }

    /// Add a weighted edge between two declared nodes
    pub fn add_edge(&mut self, src_id: &str, dst_id: &str, weight: f64) -> Result<()> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(LouvainError::InvalidEdgeWeight {
                source_node: src_id.to_string(),
                target: dst_id.to_string(),
                weight,
            });
        }

        let src = self.index_of(src_id)?;
        let dst = self.index_of(dst_id)?;
        self.graph.add_edge(src, dst, weight);

        Ok(())
    }

    /// Node index of a declared id
    pub fn index_of(&self, id: &str) -> Result<NodeIndex> {
        self.id_to_index
            .get(id)
            .copied()
            .ok_or_else(|| LouvainError::UnknownNode(id.to_string()))
    }

    /// Build the layered graph
    pub fn build(self) -> LayeredGraph {
        log::debug!(
            "Built layered graph with {} nodes, {} edges and {} types",
            self.graph.node_count(),
            self.graph.edge_count(),
            self.num_types
        );

        LayeredGraph {
            graph: self.graph,
            node_ids: self.node_ids,
            num_types: self.num_types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_builder_reuses_existing_ids() {
        let mut builder = GraphBuilder::new(2);
        let a = builder.add_layer_node("a", 0).unwrap();
        let again = builder.add_layer_node("a", 1).unwrap();
        assert_eq!(a, again);

        let layered = builder.build();
        assert_eq!(layered.node_count(), 1);
        assert_eq!(layered.type_vector(0).unwrap(), &array![1.0, 0.0]);
    }

    #[test]
    fn test_builder_rejects_bad_type_length() {
        let mut builder = GraphBuilder::new(3);
        let err = builder.add_node("x", array![1.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            LouvainError::InconsistentTypeVectorLength { expected: 3, found: 2, .. }
        ));
    }

    #[test]
    fn test_builder_edges() {
        let mut builder = GraphBuilder::new(2);
        builder.add_layer_node("a", 0).unwrap();
        builder.add_layer_node("b", 1).unwrap();
        builder.add_edge("a", "b", 2.5).unwrap();
        builder.add_edge("b", "b", 1.0).unwrap();

        assert!(matches!(
            builder.add_edge("a", "zzz", 1.0),
            Err(LouvainError::UnknownNode(_))
        ));
        assert!(matches!(
            builder.add_edge("a", "b", -1.0),
            Err(LouvainError::InvalidEdgeWeight { .. })
        ));

        let layered = builder.build();
        assert_eq!(layered.edge_count(), 2);
        assert!((layered.total_weight() - 3.5).abs() < 1e-12);
        assert_eq!(layered.type_totals(), array![1.0, 1.0]);
        assert_eq!(layered.node_id(1), Some("b"));
    }
}
