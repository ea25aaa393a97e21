//! Node-typed directed graph representation

use ndarray::Array1;
use petgraph::graph::{DiGraph, NodeIndex};

/// Per-node vector counting how many original nodes of each type it holds
pub type TypeVector = Array1<f64>;

/// Directed, edge-weighted graph whose nodes carry type vectors
pub type TypedDiGraph = DiGraph<TypeVector, f64>;

/// One-hot type vector for a leaf node of the given layer
pub fn one_hot(layer: usize, num_types: usize) -> TypeVector {
    let mut vector = Array1::zeros(num_types);
    if layer < num_types {
        vector[layer] = 1.0;
    }
    vector
}

/// A multipartite graph together with the external ids of its nodes
#[derive(Debug, Clone)]
pub struct LayeredGraph {
    /// Node-typed weighted digraph; node index i belongs to `node_ids[i]`
    pub graph: TypedDiGraph,

    /// Original string ids, indexed by node index
    pub node_ids: Vec<String>,

    /// Length of every type vector
    pub num_types: usize,
}

impl LayeredGraph {
    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of (possibly parallel) edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Sum of all edge weights
    pub fn total_weight(&self) -> f64 {
        total_weight(&self.graph)
    }

    /// Element-wise sum of every node's type vector
    pub fn type_totals(&self) -> TypeVector {
        type_totals(&self.graph, self.num_types)
    }

    /// External id of a node index
    pub fn node_id(&self, node: usize) -> Option<&str> {
        self.node_ids.get(node).map(String::as_str)
    }

    /// Type vector of a node index
    pub fn type_vector(&self, node: usize) -> Option<&TypeVector> {
        self.graph.node_weight(NodeIndex::new(node))
    }
}

/// Sum of all edge weights in a typed digraph
pub fn total_weight(graph: &TypedDiGraph) -> f64 {
    graph.edge_weights().sum()
}

/// Element-wise sum of the type vectors of a typed digraph
pub fn type_totals(graph: &TypedDiGraph, num_types: usize) -> TypeVector {
    graph
        .node_weights()
        .fold(Array1::zeros(num_types), |acc, vector| acc + vector)
}
