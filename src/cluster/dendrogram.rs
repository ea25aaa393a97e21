//! Multi-level Louvain driver and dendrogram projection
//!
//! ## The Algorithm
//!
//! 1. **Local moving**: starting from singletons (or an initial partition),
//!    move nodes between neighboring communities while the directed,
//!    type-penalized modularity improves.
//! 2. **Induction**: collapse each community into one node; edge weights are
//!    summed and type vectors added, so internal edges become self-loops.
//! 3. **Iterate** on the induced graph until a level improves modularity by
//!    less than [`MIN_MODULARITY_GAIN`].
//!
//! Each accepted level contributes one [`Partition`] to the [`Dendrogram`];
//! [`partition_at_level`] composes them back onto the original nodes.

use crate::cluster::local_search::{one_level, SearchParams};
use crate::cluster::modularity::status_modularity;
use crate::cluster::{Partition, Status};
use crate::config::{IncomingWeights, LouvainConfig, MIN_MODULARITY_GAIN};
use crate::error::{LouvainError, Result};
use crate::graph::{induce, TypeVector, TypedDiGraph};
use ndarray::Array1;
use petgraph::graph::Graph;
use petgraph::visit::EdgeRef;
use petgraph::EdgeType;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Layered partition history, finest level first.
///
/// Level 0 partitions the original nodes; level i > 0 partitions the nodes of
/// the graph induced by level i - 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dendrogram {
    levels: Vec<Partition>,
    /// Modularity reached at each level, when recorded by a run
    #[serde(default)]
    modularity: Vec<f64>,
}

impl Dendrogram {
    /// Dendrogram from hand-made levels, without modularity values
    pub fn new(levels: Vec<Partition>) -> Self {
        Self {
            levels,
            modularity: Vec::new(),
        }
    }

    fn with_modularity(levels: Vec<Partition>, modularity: Vec<f64>) -> Self {
        Self { levels, modularity }
    }

    /// Number of levels
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn levels(&self) -> &[Partition] {
        &self.levels
    }

    pub fn level(&self, level: usize) -> Option<&Partition> {
        self.levels.get(level)
    }

    /// Modularity recorded when `level` was accepted
    pub fn modularity_at(&self, level: usize) -> Option<f64> {
        self.modularity.get(level).copied()
    }

    /// Partition of the original nodes at `level`
    pub fn partition_at_level(&self, level: usize) -> Result<Partition> {
        partition_at_level(self, level)
    }

    /// Partition of the original nodes at the coarsest level
    pub fn best_partition(&self) -> Result<Partition> {
        let last = self.len().checked_sub(1).ok_or(LouvainError::LevelOutOfRange {
            level: 0,
            levels: 0,
        })?;
        partition_at_level(self, last)
    }
}

/// Flatten `dendrogram` up to `level` into a mapping over the original nodes
pub fn partition_at_level(dendrogram: &Dendrogram, level: usize) -> Result<Partition> {
    let levels = dendrogram.levels();
    if level >= levels.len() {
        return Err(LouvainError::LevelOutOfRange {
            level,
            levels: levels.len(),
        });
    }

    let mut assignment = levels[0].as_slice().to_vec();
    for next in &levels[1..=level] {
        for community in assignment.iter_mut() {
            *community = next.community_of(*community).ok_or(
                LouvainError::PartitionLengthMismatch {
                    expected: *community + 1,
                    found: next.len(),
                },
            )?;
        }
    }

    Ok(Partition::new(assignment))
}

/// Multipartite Louvain community detection
#[derive(Debug, Clone, Default)]
pub struct Louvain {
    config: LouvainConfig,
}

impl Louvain {
    /// Create a detector with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detector from a full configuration
    pub fn from_config(config: LouvainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LouvainConfig {
        &self.config
    }

    /// Set resolution parameter.
    ///
    /// Higher values produce smaller communities.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.config.resolution = resolution;
        self
    }

    /// Set the per-type penalty vector
    pub fn with_beta_penalty(mut self, beta: Vec<f64>) -> Self {
        self.config.beta_penalty = Some(beta);
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Set how incoming neighbor weights are aggregated
    pub fn with_incoming_weights(mut self, incoming: IncomingWeights) -> Self {
        self.config.incoming = incoming;
        self
    }

    /// Stop after `levels` accepted levels
    pub fn with_max_levels(mut self, levels: usize) -> Self {
        self.config.max_levels = Some(levels);
        self
    }

    /// Cap the sweeps of each local search
    pub fn with_max_sweeps(mut self, sweeps: usize) -> Self {
        self.config.max_sweeps = Some(sweeps);
        self
    }

    /// Best partition found: the coarsest dendrogram level, flattened
    pub fn best_partition<Ty: EdgeType>(
        &self,
        graph: &Graph<TypeVector, f64, Ty>,
        part_init: Option<&Partition>,
    ) -> Result<Partition> {
        self.generate_dendrogram(graph, part_init)?.best_partition()
    }

    /// Build the dendrogram of `graph`.
    ///
    /// Fails on undirected graphs, invalid parameters, negative or non-finite
    /// edge weights, and type vectors whose length differs from the beta
    /// penalty. A graph without edges yields a single level of singletons.
    pub fn generate_dendrogram<Ty: EdgeType>(
        &self,
        graph: &Graph<TypeVector, f64, Ty>,
        part_init: Option<&Partition>,
    ) -> Result<Dendrogram> {
        if !graph.is_directed() {
            return Err(LouvainError::InvalidGraphType);
        }
        self.validate_parameters()?;
        validate_weights(graph)?;

        if graph.edge_count() == 0 {
            log::info!(
                "Graph has no edges, returning {} singleton communities",
                graph.node_count()
            );
            return Ok(Dendrogram::with_modularity(
                vec![Partition::singletons(graph.node_count())],
                vec![0.0],
            ));
        }

        let beta = self.resolve_beta(graph);
        let num_types = beta.len();
        let params = SearchParams {
            resolution: self.config.resolution,
            beta: &beta,
            incoming: self.config.incoming,
            max_sweeps: self.config.max_sweeps,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);

        log::info!(
            "Running multipartite Louvain on {} nodes and {} edges (resolution {}, seed {})",
            graph.node_count(),
            graph.edge_count(),
            self.config.resolution,
            self.config.seed
        );

        let mut current: TypedDiGraph = graph.clone().into_edge_type();
        let mut status = Status::new(&current, num_types, part_init)?;
        let mut levels: Vec<Partition> = Vec::new();
        let mut modularity: Vec<f64> = Vec::new();

        loop {
            let sweeps = one_level(&current, &mut status, &params, &mut rng);
            let new_mod = status_modularity(&status, self.config.resolution, &beta);

            if let Some(&previous) = modularity.last() {
                if new_mod - previous < MIN_MODULARITY_GAIN {
                    log::info!(
                        "Converged after {} levels, modularity {:.6}",
                        levels.len(),
                        previous
                    );
                    break;
                }
            }

            let partition = status.partition();
            log::info!(
                "Level {}: {} communities after {} sweeps, modularity {:.6}",
                levels.len(),
                partition.num_communities(),
                sweeps,
                new_mod
            );

            let capped = self
                .config
                .max_levels
                .is_some_and(|cap| levels.len() + 1 >= cap);
            let next = if capped {
                None
            } else {
                Some(induce(&current, &partition)?)
            };

            levels.push(partition);
            modularity.push(new_mod);

            let Some(next) = next else {
                log::info!("Level cap of {} reached", levels.len());
                break;
            };

            // The previous level's graph is dropped here; only the induced
            // graph survives into the next cycle.
            current = next;
            status = Status::new(&current, num_types, None)?;
        }

        Ok(Dendrogram::with_modularity(levels, modularity))
    }

    fn validate_parameters(&self) -> Result<()> {
        let resolution = self.config.resolution;
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(LouvainError::InvalidParameter {
                name: "resolution",
                message: format!("must be a positive number, got {resolution}"),
            });
        }
        if let Some(beta) = &self.config.beta_penalty {
            if let Some(bad) = beta.iter().find(|b| !(b.is_finite() && **b >= 0.0)) {
                return Err(LouvainError::InvalidParameter {
                    name: "beta_penalty",
                    message: format!("entries must be non-negative numbers, got {bad}"),
                });
            }
        }
        if self.config.max_levels == Some(0) {
            return Err(LouvainError::InvalidParameter {
                name: "max_levels",
                message: "must be at least 1".to_string(),
            });
        }
        if self.config.max_sweeps == Some(0) {
            return Err(LouvainError::InvalidParameter {
                name: "max_sweeps",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Configured penalty, or zeros as long as the first node's type vector
    fn resolve_beta<Ty: EdgeType>(&self, graph: &Graph<TypeVector, f64, Ty>) -> Array1<f64> {
        match &self.config.beta_penalty {
            Some(beta) => Array1::from(beta.clone()),
            None => {
                let width = graph.node_weights().next().map_or(0, |types| types.len());
                Array1::zeros(width)
            }
        }
    }
}

fn validate_weights<Ty: EdgeType>(graph: &Graph<TypeVector, f64, Ty>) -> Result<()> {
    match graph
        .edge_references()
        .find(|edge| !(edge.weight().is_finite() && *edge.weight() >= 0.0))
    {
        Some(edge) => Err(LouvainError::InvalidEdgeWeight {
            source_node: edge.source().index().to_string(),
            target: edge.target().index().to_string(),
            weight: *edge.weight(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::modularity::modularity;
    use crate::graph::one_hot;
    use petgraph::graph::{NodeIndex, UnGraph};

    /// Two directed 4-cliques (reciprocal edges) joined by a reciprocal bridge
    fn two_cliques() -> TypedDiGraph {
        let mut graph = TypedDiGraph::new();
        let n: Vec<NodeIndex> = (0..8).map(|_| graph.add_node(one_hot(0, 1))).collect();
        for block in [&n[0..4], &n[4..8]] {
            for &a in block {
                for &b in block {
                    if a != b {
                        graph.add_edge(a, b, 1.0);
                    }
                }
            }
        }
        graph.add_edge(n[3], n[4], 1.0);
        graph.add_edge(n[4], n[3], 1.0);
        graph
    }

    fn hand_dendrogram() -> Dendrogram {
        Dendrogram::new(vec![
            Partition::new(vec![0, 0, 1, 2, 2, 3]),
            Partition::new(vec![1, 0, 1, 0]),
        ])
    }

    #[test]
    fn test_louvain_two_cliques() {
        let graph = two_cliques();
        let communities = Louvain::new().best_partition(&graph, None).unwrap();

        assert_eq!(communities.len(), 8);
        assert!((1..4).all(|i| communities[i] == communities[0]));
        assert!((5..8).all(|i| communities[i] == communities[4]));
        assert_ne!(communities[0], communities[4]);
    }

    #[test]
    fn test_louvain_empty_graph() {
        let graph = TypedDiGraph::new();
        let dendrogram = Louvain::new().generate_dendrogram(&graph, None).unwrap();
        assert_eq!(dendrogram.len(), 1);
        assert!(dendrogram.level(0).unwrap().is_empty());
    }

    #[test]
    fn test_louvain_single_node() {
        let mut graph = TypedDiGraph::new();
        graph.add_node(one_hot(0, 2));

        let dendrogram = Louvain::new().generate_dendrogram(&graph, None).unwrap();
        assert_eq!(dendrogram.len(), 1);
        assert_eq!(dendrogram.level(0).unwrap().as_slice(), &[0]);
        assert_eq!(dendrogram.modularity_at(0), Some(0.0));
    }

    #[test]
    fn test_louvain_disconnected() {
        let mut graph = TypedDiGraph::new();
        for layer in [0, 1, 0] {
            graph.add_node(one_hot(layer, 2));
        }
        let dendrogram = Louvain::new().generate_dendrogram(&graph, None).unwrap();
        assert_eq!(dendrogram.len(), 1);
        assert_eq!(dendrogram.level(0).unwrap().as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn test_louvain_rejects_undirected() {
        let mut graph: UnGraph<TypeVector, f64> = UnGraph::new_undirected();
        graph.add_node(one_hot(0, 1));
        let err = Louvain::new().generate_dendrogram(&graph, None).unwrap_err();
        assert!(matches!(err, LouvainError::InvalidGraphType));
    }

    #[test]
    fn test_louvain_rejects_beta_length_mismatch() {
        let graph = two_cliques();
        let err = Louvain::new()
            .with_beta_penalty(vec![0.0, 1.0])
            .generate_dendrogram(&graph, None)
            .unwrap_err();
        assert!(matches!(
            err,
            LouvainError::InconsistentTypeVectorLength { expected: 2, found: 1, .. }
        ));
    }

    #[test]
    fn test_louvain_rejects_bad_parameters() {
        let graph = two_cliques();
        assert!(matches!(
            Louvain::new().with_resolution(-1.0).generate_dendrogram(&graph, None),
            Err(LouvainError::InvalidParameter { name: "resolution", .. })
        ));
        assert!(matches!(
            Louvain::new()
                .with_beta_penalty(vec![-0.5])
                .generate_dendrogram(&graph, None),
            Err(LouvainError::InvalidParameter { name: "beta_penalty", .. })
        ));
    }

    #[test]
    fn test_louvain_rejects_zero_caps() {
        let graph = two_cliques();
        assert!(matches!(
            Louvain::new().with_max_levels(0).generate_dendrogram(&graph, None),
            Err(LouvainError::InvalidParameter { name: "max_levels", .. })
        ));
        assert!(matches!(
            Louvain::new().with_max_sweeps(0).generate_dendrogram(&graph, None),
            Err(LouvainError::InvalidParameter { name: "max_sweeps", .. })
        ));
        assert!(Louvain::new()
            .with_max_levels(1)
            .with_max_sweeps(1)
            .generate_dendrogram(&graph, None)
            .is_ok());
    }

    #[test]
    fn test_louvain_rejects_negative_weight() {
        let mut graph = two_cliques();
        graph.add_edge(NodeIndex::new(0), NodeIndex::new(7), -2.0);
        assert!(matches!(
            Louvain::new().generate_dendrogram(&graph, None),
            Err(LouvainError::InvalidEdgeWeight { .. })
        ));
    }

    #[test]
    fn test_levels_are_contiguous_and_improving() {
        let graph = two_cliques();
        let dendrogram = Louvain::new().generate_dendrogram(&graph, None).unwrap();

        for level in dendrogram.levels() {
            assert!(level.is_contiguous());
        }
        for i in 1..dendrogram.len() {
            let gain = dendrogram.modularity_at(i).unwrap() - dendrogram.modularity_at(i - 1).unwrap();
            assert!(gain >= MIN_MODULARITY_GAIN);
        }
    }

    #[test]
    fn test_recorded_modularity_matches_flattened_partition() {
        let graph = two_cliques();
        let dendrogram = Louvain::new().generate_dendrogram(&graph, None).unwrap();
        let last = dendrogram.len() - 1;
        let flat = dendrogram.partition_at_level(last).unwrap();
        let q = modularity(&graph, &flat, 1.0, &[0.0]).unwrap();
        assert!((q - dendrogram.modularity_at(last).unwrap()).abs() < 1e-9);
    }

    #[test]
    fn test_initial_partition_is_respected() {
        let graph = two_cliques();
        // already optimal: nothing moves and the first level keeps it
        let init = Partition::new(vec![4, 4, 4, 4, 9, 9, 9, 9]);
        let dendrogram = Louvain::new()
            .generate_dendrogram(&graph, Some(&init))
            .unwrap();
        assert_eq!(
            dendrogram.level(0).unwrap().as_slice(),
            &[0, 0, 0, 0, 1, 1, 1, 1]
        );
    }

    #[test]
    fn test_max_levels_caps_dendrogram() {
        let graph = two_cliques();
        let dendrogram = Louvain::new()
            .with_max_levels(1)
            .generate_dendrogram(&graph, None)
            .unwrap();
        assert_eq!(dendrogram.len(), 1);
    }

    #[test]
    fn test_partition_at_level_composes_levels() {
        let dendrogram = hand_dendrogram();
        assert_eq!(
            partition_at_level(&dendrogram, 0).unwrap().as_slice(),
            &[0, 0, 1, 2, 2, 3]
        );
        assert_eq!(
            partition_at_level(&dendrogram, 1).unwrap().as_slice(),
            &[1, 1, 0, 1, 1, 0]
        );
        assert_eq!(
            dendrogram.best_partition().unwrap(),
            partition_at_level(&dendrogram, 1).unwrap()
        );
    }

    #[test]
    fn test_partition_at_level_out_of_range() {
        let dendrogram = hand_dendrogram();
        assert!(matches!(
            partition_at_level(&dendrogram, 2),
            Err(LouvainError::LevelOutOfRange { level: 2, levels: 2 })
        ));
        assert!(Dendrogram::new(Vec::new()).best_partition().is_err());
    }
}
