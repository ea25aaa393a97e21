//! One level of randomized local moving
//!
//! Every sweep visits the nodes in a shuffled order and moves each one to the
//! neighboring community with the largest positive modularity gain. Gains are
//! kept in units of m (the level's total weight), like the status aggregates.

use crate::cluster::modularity::status_modularity;
use crate::cluster::Status;
use crate::config::{IncomingWeights, MIN_MODULARITY_GAIN};
use crate::graph::TypedDiGraph;
use itertools::Itertools;
use ndarray::Array1;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

/// Parameters shared by every sweep of a run
#[derive(Debug, Clone, Copy)]
pub(crate) struct SearchParams<'a> {
    pub resolution: f64,
    pub beta: &'a Array1<f64>,
    pub incoming: IncomingWeights,
    pub max_sweeps: Option<usize>,
}

/// Edge weight between a node and each neighboring community
#[derive(Debug, Default, PartialEq)]
pub(crate) struct NeighborWeights {
    /// From predecessors, keyed by their community
    pub incoming: BTreeMap<usize, f64>,
    /// To successors, keyed by their community
    pub outgoing: BTreeMap<usize, f64>,
    /// Historical predecessor buckets, only filled in
    /// [`IncomingWeights::Legacy`] mode and only used to rank moves
    pub legacy_incoming: Option<BTreeMap<usize, f64>>,
}

impl NeighborWeights {
    /// Total weight exchanged with `com` in both directions
    pub fn shared(&self, com: usize) -> f64 {
        self.incoming.get(&com).copied().unwrap_or(0.0)
            + self.outgoing.get(&com).copied().unwrap_or(0.0)
    }

    /// Weight exchanged with `com` as seen by the gain formula. Equal to
    /// [`NeighborWeights::shared`] unless legacy buckets are present.
    pub fn gain_shared(&self, com: usize) -> f64 {
        match &self.legacy_incoming {
            Some(legacy) => {
                legacy.get(&com).copied().unwrap_or(0.0)
                    + self.outgoing.get(&com).copied().unwrap_or(0.0)
            }
            None => self.shared(com),
        }
    }

    /// Union of neighboring community ids, ascending
    pub fn communities(&self) -> Vec<usize> {
        self.incoming
            .keys()
            .merge(self.outgoing.keys())
            .dedup()
            .copied()
            .collect()
    }
}

/// Group the weights of `node`'s non-loop edges by neighbor community.
///
/// The accumulated buckets are always exact; `mode` only decides whether
/// the historical buckets are kept alongside them for ranking moves.
pub(crate) fn neighbor_weights(
    graph: &TypedDiGraph,
    status: &Status,
    node: usize,
    mode: IncomingWeights,
) -> NeighborWeights {
    let idx = NodeIndex::new(node);
    let mut weights = NeighborWeights {
        legacy_incoming: (mode == IncomingWeights::Legacy).then(BTreeMap::new),
        ..NeighborWeights::default()
    };

    for edge in graph.edges_directed(idx, Direction::Outgoing) {
        let neighbor = edge.target().index();
        if neighbor == node {
            continue;
        }
        if let Some(com) = status.community_of(neighbor) {
            *weights.outgoing.entry(com).or_insert(0.0) += *edge.weight();
        }
    }

    for edge in graph.edges_directed(idx, Direction::Incoming) {
        let neighbor = edge.source().index();
        if neighbor == node {
            continue;
        }
        if let Some(com) = status.community_of(neighbor) {
            let weight = *edge.weight();
            *weights.incoming.entry(com).or_insert(0.0) += weight;
            if let Some(legacy) = weights.legacy_incoming.as_mut() {
                let base = weights.outgoing.get(&com).copied().unwrap_or(0.0);
                legacy.insert(com, base + weight);
            }
        }
    }

    weights
}

/// Pick the destination of a node among `(community, gain)` candidates.
///
/// Starts from `(current, 0.0)` and only switches on a strictly greater
/// gain: among equal gains the first candidate wins, and the node stays put
/// when no candidate gains anything.
pub(crate) fn pick_best<I>(current: usize, candidates: I) -> (usize, f64)
where
    I: IntoIterator<Item = (usize, f64)>,
{
    candidates
        .into_iter()
        .fold((current, 0.0), |best, (com, gain)| {
            if gain > best.1 {
                (com, gain)
            } else {
                best
            }
        })
}

/// Run sweeps on `graph` until one moves nothing or improves modularity by
/// less than [`MIN_MODULARITY_GAIN`]. Returns the number of sweeps run.
pub(crate) fn one_level<R: Rng + ?Sized>(
    graph: &TypedDiGraph,
    status: &mut Status,
    params: &SearchParams<'_>,
    rng: &mut R,
) -> usize {
    let total_weight = status.total_weight;
    if total_weight <= 0.0 {
        return 0;
    }
    let res_over_m = params.resolution / total_weight;
    let beta = params.beta;

    let mut new_mod = status_modularity(status, params.resolution, beta);
    let mut sweeps = 0;

    loop {
        let cur_mod = new_mod;
        let mut moves = 0usize;

        let mut order: Vec<usize> = (0..graph.node_count()).collect();
        order.shuffle(rng);

        for node in order {
            let Some(own) = status.community_of(node) else {
                continue;
            };
            let types = &graph[NodeIndex::new(node)];
            let k_in = status.g_in_degree[node];
            let k_out = status.g_out_degree[node];
            let neighbors = neighbor_weights(graph, status, node, params.incoming);
            let own_shared = neighbors.shared(own);

            let remaining = &status.com_nodes.row(own) - types;
            let remove_delta = -neighbors.gain_shared(own)
                + ((status.in_degrees[own] - k_in) * k_out
                    + (status.out_degrees[own] - k_out) * k_in)
                    * res_over_m
                + 2.0 * (&remaining * types).dot(beta);

            status.remove(node, own, own_shared, types);

            let mut candidates = neighbors.communities();
            candidates.shuffle(rng);

            let (best, _) = {
                let status = &*status;
                pick_best(
                    own,
                    candidates.iter().map(|&com| {
                        let gain = remove_delta + neighbors.gain_shared(com)
                            - (k_in * status.out_degrees[com] + k_out * status.in_degrees[com])
                                * res_over_m
                            - 2.0 * (&status.com_nodes.row(com) * types).dot(beta);
                        (com, gain)
                    }),
                )
            };

            status.insert(node, best, neighbors.shared(best), types);
            if best != own {
                moves += 1;
            }
        }

        sweeps += 1;
        new_mod = status_modularity(status, params.resolution, beta);
        log::debug!(
            "Sweep {}: {} moves, modularity {:.8} -> {:.8}",
            sweeps,
            moves,
            cur_mod,
            new_mod
        );

        if moves == 0 || new_mod - cur_mod < MIN_MODULARITY_GAIN {
            break;
        }
        if params.max_sweeps.is_some_and(|cap| sweeps >= cap) {
            log::debug!("Sweep cap of {} reached", sweeps);
            break;
        }
    }

    sweeps
}
