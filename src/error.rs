//! Error types for community detection

use thiserror::Error;

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, LouvainError>;

/// Errors raised by graph construction, community detection and persistence
#[derive(Debug, Error)]
pub enum LouvainError {
    /// The input graph is undirected
    #[error("bad graph type, use only directed graphs")]
    InvalidGraphType,

    /// A node's type vector does not match the beta penalty length
    #[error("node {node} has a type vector of length {found}, expected {expected}")]
    InconsistentTypeVectorLength {
        node: usize,
        expected: usize,
        found: usize,
    },

    /// A partition does not assign exactly one community per node
    #[error("partition covers {found} nodes, graph has {expected}")]
    PartitionLengthMismatch { expected: usize, found: usize },

    /// Requested dendrogram level does not exist
    #[error("level {level} out of range for a dendrogram with {levels} levels")]
    LevelOutOfRange { level: usize, levels: usize },

    /// A configuration value is outside its domain
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter { name: &'static str, message: String },

    /// An edge weight is negative, NaN or infinite
    #[error("edge {source_node} -> {target} has invalid weight {weight}")]
    InvalidEdgeWeight {
        source_node: String,
        target: String,
        weight: f64,
    },

    /// An edge refers to a node id that was never declared
    #[error("unknown node id: {0}")]
    UnknownNode(String),

    /// A node or edge lacks a required attribute, or it has the wrong shape
    #[error("{owner} has no usable '{key}' attribute")]
    MissingAttribute { owner: String, key: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
