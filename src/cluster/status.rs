//! Aggregate statistics of a graph under a candidate partition

use crate::cluster::Partition;
use crate::error::{LouvainError, Result};
use crate::graph::TypeVector;
use ndarray::{Array2, ArrayView1};
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::EdgeType;

/// Degrees, internal weights and type composition of every community.
///
/// Community ids are dense slots in `0..node_count`, so every aggregate is an
/// index-addressed array. A status belongs to one level's graph and is
/// rebuilt from scratch when the next level starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    /// Community of each node; `None` while the node is being moved
    pub(crate) node2com: Vec<Option<usize>>,
    /// Weighted in-degree of each node, self-loops included
    pub(crate) g_in_degree: Vec<f64>,
    /// Weighted out-degree of each node, self-loops included
    pub(crate) g_out_degree: Vec<f64>,
    /// Self-loop weight of each node
    pub(crate) loops: Vec<f64>,
    /// Sum of member in-degrees per community
    pub(crate) in_degrees: Vec<f64>,
    /// Sum of member out-degrees per community
    pub(crate) out_degrees: Vec<f64>,
    /// Edge weight with both ends inside the community
    pub(crate) internals: Vec<f64>,
    /// Row c holds the type counts of community c
    pub(crate) com_nodes: Array2<f64>,
    pub(crate) total_weight: f64,
}

impl Status {
    /// Compute every aggregate of `graph` under `part_init`, or under
    /// singletons when no initial partition is given.
    ///
    /// Fails when the graph is undirected, when a type vector is not
    /// `num_types` long, or when `part_init` does not cover every node.
    pub fn new<Ty: EdgeType>(
        graph: &Graph<TypeVector, f64, Ty>,
        num_types: usize,
        part_init: Option<&Partition>,
    ) -> Result<Self> {
        if !graph.is_directed() {
            return Err(LouvainError::InvalidGraphType);
        }

        let node_count = graph.node_count();
        for node in graph.node_indices() {
            let found = graph[node].len();
            if found != num_types {
                return Err(LouvainError::InconsistentTypeVectorLength {
                    node: node.index(),
                    expected: num_types,
                    found,
                });
            }
        }

        let assignment = match part_init {
            Some(partition) if partition.len() != node_count => {
                return Err(LouvainError::PartitionLengthMismatch {
                    expected: node_count,
                    found: partition.len(),
                });
            }
            Some(partition) => partition.renumber(),
            None => Partition::singletons(node_count),
        };

        let mut status = Self {
            node2com: assignment.iter().map(|&com| Some(com)).collect(),
            g_in_degree: vec![0.0; node_count],
            g_out_degree: vec![0.0; node_count],
            loops: vec![0.0; node_count],
            in_degrees: vec![0.0; node_count],
            out_degrees: vec![0.0; node_count],
            internals: vec![0.0; node_count],
            com_nodes: Array2::zeros((node_count, num_types)),
            total_weight: 0.0,
        };

        for edge in graph.edge_references() {
            let (src, dst) = (edge.source().index(), edge.target().index());
            let weight = *edge.weight();

            status.g_out_degree[src] += weight;
            status.g_in_degree[dst] += weight;
            status.total_weight += weight;

            if src == dst {
                status.loops[src] += weight;
            }
            if assignment[src] == assignment[dst] {
                status.internals[assignment[src]] += weight;
            }
        }

        for node in 0..node_count {
            let com = assignment[node];
            status.in_degrees[com] += status.g_in_degree[node];
            status.out_degrees[com] += status.g_out_degree[node];
            let mut row = status.com_nodes.row_mut(com);
            row += &graph[NodeIndex::new(node)];
        }

        Ok(status)
    }

    /// Take `node` out of `com`; `shared_weight` is the weight of the
    /// node's non-loop edges (both directions) to other members of `com`.
    pub(crate) fn remove(&mut self, node: usize, com: usize, shared_weight: f64, types: &TypeVector) {
        self.in_degrees[com] -= self.g_in_degree[node];
        self.out_degrees[com] -= self.g_out_degree[node];
        self.internals[com] -= shared_weight + self.loops[node];
        let mut row = self.com_nodes.row_mut(com);
        row -= types;
        self.node2com[node] = None;
    }

    /// Put an unassigned `node` into `com`; mirror image of [`Status::remove`].
    pub(crate) fn insert(&mut self, node: usize, com: usize, shared_weight: f64, types: &TypeVector) {
        self.node2com[node] = Some(com);
        self.in_degrees[com] += self.g_in_degree[node];
        self.out_degrees[com] += self.g_out_degree[node];
        self.internals[com] += shared_weight + self.loops[node];
        let mut row = self.com_nodes.row_mut(com);
        row += types;
    }

    /// Current assignment, renumbered contiguously from 0
    pub fn partition(&self) -> Partition {
        // Nodes are only unassigned in the middle of a move.
        Partition::renumbered(
            self.node2com
                .iter()
                .enumerate()
                .map(|(node, com)| com.unwrap_or(node)),
        )
    }

    /// Number of nodes tracked
    pub fn node_count(&self) -> usize {
        self.node2com.len()
    }

    /// Community currently holding `node`
    pub fn community_of(&self, node: usize) -> Option<usize> {
        self.node2com.get(node).copied().flatten()
    }

    /// Sum of all edge weights of the level's graph
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Summed in-degree of a community
    pub fn community_in_degree(&self, com: usize) -> f64 {
        self.in_degrees.get(com).copied().unwrap_or(0.0)
    }

    /// Summed out-degree of a community
    pub fn community_out_degree(&self, com: usize) -> f64 {
        self.out_degrees.get(com).copied().unwrap_or(0.0)
    }

    /// Internal weight of a community, member loops included
    pub fn community_internal_weight(&self, com: usize) -> f64 {
        self.internals.get(com).copied().unwrap_or(0.0)
    }

    /// Type counts of a community
    pub fn community_types(&self, com: usize) -> ArrayView1<'_, f64> {
        self.com_nodes.row(com)
    }

    /// Ids of communities with at least one member, ascending
    pub fn active_communities(&self) -> Vec<usize> {
        let mut present = vec![false; self.internals.len()];
        for com in self.node2com.iter().flatten() {
            present[*com] = true;
        }
        present
            .iter()
            .enumerate()
            .filter_map(|(com, &used)| used.then_some(com))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{one_hot, TypedDiGraph};
    use ndarray::{array, Array1, Axis};
    use petgraph::graph::UnGraph;

    /// 0 -> 1 (2.0), 1 -> 2 (1.0), 2 -> 0 (3.0), 1 -> 1 (0.5); types 0, 1, 0
    fn triangle() -> TypedDiGraph {
        let mut graph = TypedDiGraph::new();
        let a = graph.add_node(one_hot(0, 2));
        let b = graph.add_node(one_hot(1, 2));
        let c = graph.add_node(one_hot(0, 2));
        graph.add_edge(a, b, 2.0);
        graph.add_edge(b, c, 1.0);
        graph.add_edge(c, a, 3.0);
        graph.add_edge(b, b, 0.5);
        graph
    }

    fn assert_degree_sums(status: &Status) {
        let in_sum: f64 = status.in_degrees.iter().sum();
        let out_sum: f64 = status.out_degrees.iter().sum();
        let g_in_sum: f64 = status.g_in_degree.iter().sum();
        assert!((in_sum - status.total_weight).abs() < 1e-12);
        assert!((out_sum - status.total_weight).abs() < 1e-12);
        assert!((g_in_sum - status.total_weight).abs() < 1e-12);
    }

    #[test]
    fn test_singleton_init() {
        let graph = triangle();
        let status = Status::new(&graph, 2, None).unwrap();

        assert_eq!(status.total_weight(), 6.5);
        assert_eq!(status.g_out_degree, vec![2.0, 1.5, 3.0]);
        assert_eq!(status.g_in_degree, vec![3.0, 2.5, 1.0]);
        assert_eq!(status.loops, vec![0.0, 0.5, 0.0]);
        // only the loop is internal to a singleton
        assert_eq!(status.internals, vec![0.0, 0.5, 0.0]);
        assert_eq!(status.active_communities(), vec![0, 1, 2]);
        assert_degree_sums(&status);
    }

    #[test]
    fn test_init_with_partition() {
        let graph = triangle();
        let part = Partition::new(vec![5, 5, 2]);
        let status = Status::new(&graph, 2, Some(&part)).unwrap();

        assert_eq!(status.community_of(0), Some(0));
        assert_eq!(status.community_of(2), Some(1));
        assert_eq!(status.community_internal_weight(0), 2.5);
        assert_eq!(status.community_internal_weight(1), 0.0);
        assert_eq!(status.community_types(0), array![1.0, 1.0]);
        assert_eq!(status.community_in_degree(0), 5.5);
        assert_eq!(status.community_out_degree(1), 3.0);
        assert_degree_sums(&status);
    }

    #[test]
    fn test_remove_then_insert_restores_status() {
        let graph = triangle();
        let part = Partition::new(vec![0, 0, 0]);
        let original = Status::new(&graph, 2, Some(&part)).unwrap();
        let mut status = original.clone();

        // node 1 shares 2.0 (in from 0) + 1.0 (out to 2) with its community
        let types = graph[NodeIndex::new(1)].clone();
        status.remove(1, 0, 3.0, &types);
        assert_eq!(status.community_of(1), None);
        assert_eq!(status.community_internal_weight(0), 3.0);
        assert_eq!(status.community_types(0), array![2.0, 0.0]);

        status.insert(1, 0, 3.0, &types);
        assert_eq!(status, original);
    }

    #[test]
    fn test_type_counts_conserved() {
        let graph = triangle();
        let status = Status::new(&graph, 2, Some(&Partition::new(vec![1, 0, 1]))).unwrap();
        let totals: Array1<f64> = status.com_nodes.sum_axis(Axis(0));
        assert_eq!(totals, array![2.0, 1.0]);
    }

    #[test]
    fn test_rejects_undirected() {
        let mut graph: UnGraph<TypeVector, f64> = UnGraph::new_undirected();
        let a = graph.add_node(one_hot(0, 1));
        let b = graph.add_node(one_hot(0, 1));
        graph.add_edge(a, b, 1.0);
        assert!(matches!(
            Status::new(&graph, 1, None),
            Err(LouvainError::InvalidGraphType)
        ));
    }

    #[test]
    fn test_rejects_type_length_mismatch() {
        let graph = triangle();
        assert!(matches!(
            Status::new(&graph, 3, None),
            Err(LouvainError::InconsistentTypeVectorLength { node: 0, expected: 3, found: 2 })
        ));
    }

    #[test]
    fn test_rejects_short_partition() {
        let graph = triangle();
        let part = Partition::new(vec![0]);
        assert!(matches!(
            Status::new(&graph, 2, Some(&part)),
            Err(LouvainError::PartitionLengthMismatch { expected: 3, found: 1 })
        ));
    }
}
