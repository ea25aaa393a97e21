//! Community statistics and metrics

use crate::cluster::{CommunitySummary, Partition};
use crate::error::{LouvainError, Result};
use crate::graph::TypedDiGraph;
use ndarray::Array1;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use rayon::prelude::*;

/// Partitions with at least this many communities are summarized in parallel
const PARALLEL_THRESHOLD: usize = 1000;

/// Per-community edge tallies gathered in one pass over the edges
#[derive(Debug, Clone, Default)]
struct EdgeTally {
    internal_weight: f64,
    internal_edges: usize,
}

/// Summarize every community of `partition` on `graph`, largest first
pub fn summarize_communities(
    graph: &TypedDiGraph,
    partition: &Partition,
) -> Result<Vec<CommunitySummary>> {
    if partition.len() != graph.node_count() {
        return Err(LouvainError::PartitionLengthMismatch {
            expected: graph.node_count(),
            found: partition.len(),
        });
    }

    let members = partition.members();
    let mut tallies = vec![EdgeTally::default(); members.len()];
    for edge in graph.edge_references() {
        let com = partition[edge.source().index()];
        if com == partition[edge.target().index()] {
            tallies[com].internal_weight += *edge.weight();
            if edge.source() != edge.target() {
                tallies[com].internal_edges += 1;
            }
        }
    }

    let communities: Vec<(usize, (Vec<usize>, EdgeTally))> = members
        .into_iter()
        .zip(tallies)
        .enumerate()
        .filter(|(_, (nodes, _))| !nodes.is_empty())
        .collect();

    let mut summaries: Vec<CommunitySummary> = if communities.len() >= PARALLEL_THRESHOLD {
        communities
            .into_par_iter()
            .map(|(id, (nodes, tally))| build_summary(graph, id, nodes, &tally))
            .collect()
    } else {
        communities
            .into_iter()
            .map(|(id, (nodes, tally))| build_summary(graph, id, nodes, &tally))
            .collect()
    };

    summaries.sort_by(|a, b| b.size.cmp(&a.size).then(a.id.cmp(&b.id)));

    log::debug!("Summarized {} communities", summaries.len());

    Ok(summaries)
}

fn build_summary(
    graph: &TypedDiGraph,
    id: usize,
    members: Vec<usize>,
    tally: &EdgeTally,
) -> CommunitySummary {
    let num_types = graph.node_weights().next().map_or(0, |types| types.len());
    let type_counts = members
        .iter()
        .fold(Array1::<f64>::zeros(num_types), |acc, &node| {
            acc + &graph[NodeIndex::new(node)]
        });

    let size = members.len();
    CommunitySummary {
        id,
        size,
        type_concentration: type_concentration(type_counts.as_slice().unwrap_or(&[])),
        density: directed_density(size, tally.internal_edges),
        internal_weight: tally.internal_weight,
        type_counts: type_counts.to_vec(),
        members,
    }
}

/// Share of a community taken by its most frequent type (0 when empty)
pub fn type_concentration(type_counts: &[f64]) -> f64 {
    let total: f64 = type_counts.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    type_counts.iter().copied().fold(0.0, f64::max) / total
}

/// Calculate density (actual edges / potential edges) of a directed community
pub fn directed_density(size: usize, internal_edges: usize) -> f64 {
    if size <= 1 {
        return 1.0; // By convention, singleton communities have density 1
    }
    // Potential edges = n * (n - 1) for a directed graph
    internal_edges as f64 / (size * (size - 1)) as f64
}

/// Largest same-type count found in any community
pub fn max_type_count(summaries: &[CommunitySummary]) -> f64 {
    summaries
        .iter()
        .flat_map(|summary| summary.type_counts.iter().copied())
        .fold(0.0, f64::max)
}
