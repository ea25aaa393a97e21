//! Community detection on multipartite directed graphs
//!
//! Communities are found by a Louvain-style optimization of a directed
//! modularity that also penalizes communities for holding many nodes of the
//! same type. See [`modularity`] for the objective and [`dendrogram`] for
//! the multi-level driver.

pub mod dendrogram;
pub(crate) mod local_search;
pub mod metrics;
pub mod modularity;
pub mod partition;
pub mod status;

pub use dendrogram::{partition_at_level, Dendrogram, Louvain};
pub use modularity::modularity;
pub use partition::Partition;
pub use status::Status;

use serde::{Deserialize, Serialize};

/// Statistics of one detected community
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunitySummary {
    /// Community id in the flattened partition
    pub id: usize,

    /// Members of this community (node indices)
    pub members: Vec<usize>,

    /// Size of the community
    pub size: usize,

    /// Number of members of each type
    pub type_counts: Vec<f64>,

    /// Weight of edges with both ends inside, self-loops included
    pub internal_weight: f64,

    /// Density: internal non-loop edges / potential edges
    pub density: f64,

    /// Share of the most frequent type among the members
    pub type_concentration: f64,
}
