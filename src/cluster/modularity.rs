//! Directed, type-penalized modularity
//!
//! ```text
//! Q = 1/m * Σ_c [ L_c − γ · K_in(c) · K_out(c) / m − ⟨β, T_c²⟩ ]
//! ```
//!
//! - m = total edge weight
//! - L_c = weight of edges inside community c (self-loops included)
//! - K_in(c), K_out(c) = summed in/out degrees of c's members
//! - T_c = type-count vector of c, squared element-wise
//! - β = per-type penalty, γ = resolution
//!
//! The penalty term grows quadratically with the number of same-type nodes
//! sharing a community, which pushes the optimizer toward communities that
//! mix layers of a multipartite graph.

use crate::cluster::{Partition, Status};
use crate::error::{LouvainError, Result};
use crate::graph::TypeVector;
use ndarray::Array1;
use petgraph::graph::Graph;
use petgraph::EdgeType;

/// Modularity of the partition held by `status`.
///
/// Returns 0 for a graph without edge weight.
pub fn status_modularity(status: &Status, resolution: f64, beta: &Array1<f64>) -> f64 {
    let links = status.total_weight;
    if links <= 0.0 {
        return 0.0;
    }

    status
        .active_communities()
        .into_iter()
        .map(|com| {
            let penalty = status.com_nodes.row(com).mapv(|count| count * count).dot(beta);
            status.internals[com] / links
                - resolution * status.in_degrees[com] * status.out_degrees[com] / (links * links)
                - penalty / links
        })
        .sum()
}

/// Modularity of an arbitrary partition of `graph`
pub fn modularity<Ty: EdgeType>(
    graph: &Graph<TypeVector, f64, Ty>,
    partition: &Partition,
    resolution: f64,
    beta: &[f64],
) -> Result<f64> {
    if !(resolution.is_finite() && resolution > 0.0) {
        return Err(LouvainError::InvalidParameter {
            name: "resolution",
            message: format!("must be a positive number, got {resolution}"),
        });
    }
    let status = Status::new(graph, beta.len(), Some(partition))?;
    Ok(status_modularity(&status, resolution, &Array1::from(beta.to_vec())))
}
