//! Community detection for multipartite directed graphs
//!
//! A Louvain-style, multi-level optimizer of a directed modularity extended
//! with a per-type penalty, used to find communities that span the layers of
//! a multipartite graph rather than grouping same-layer nodes together.
//!
//! ```rust
//! use multipartite_louvain::{GraphBuilder, Louvain};
//!
//! let mut builder = GraphBuilder::new(2);
//! builder.add_layer_node("a0", 0).unwrap();
//! builder.add_layer_node("b0", 1).unwrap();
//! builder.add_edge("a0", "b0", 1.0).unwrap();
//! builder.add_edge("b0", "a0", 1.0).unwrap();
//! let graph = builder.build();
//!
//! let louvain = Louvain::new().with_beta_penalty(vec![1.0, 1.0]).with_seed(7);
//! let dendrogram = louvain.generate_dendrogram(&graph.graph, None).unwrap();
//! let partition = dendrogram.best_partition().unwrap();
//! assert_eq!(partition.len(), 2);
//! ```

pub mod cluster;
pub mod config;
pub mod error;
pub mod graph;
pub mod storage;

pub use cluster::metrics::summarize_communities;
pub use cluster::{
    modularity, partition_at_level, CommunitySummary, Dendrogram, Louvain, Partition, Status,
};
pub use config::{IncomingWeights, LouvainConfig, MIN_MODULARITY_GAIN};
pub use error::{LouvainError, Result};
pub use graph::{induce, one_hot, GraphBuilder, LayeredGraph, TypeVector, TypedDiGraph};
