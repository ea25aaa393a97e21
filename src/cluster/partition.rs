//! Node to community assignments

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Index;

/// Mapping from node index to community id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Partition(Vec<usize>);

impl Partition {
    /// Wrap an assignment as-is (ids are not renumbered)
    pub fn new(assignment: Vec<usize>) -> Self {
        Self(assignment)
    }

    /// Every node in its own community
    pub fn singletons(node_count: usize) -> Self {
        Self((0..node_count).collect())
    }

    /// Build a partition whose ids are renumbered from 0 by first appearance
    pub fn renumbered<I>(assignment: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut new_ids: HashMap<usize, usize> = HashMap::new();
        Self(
            assignment
                .into_iter()
                .map(|community| {
                    let next = new_ids.len();
                    *new_ids.entry(community).or_insert(next)
                })
                .collect(),
        )
    }

    /// Same grouping with ids renumbered from 0 by first appearance
    pub fn renumber(&self) -> Self {
        Self::renumbered(self.0.iter().copied())
    }

    /// Number of nodes covered
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Community of a node, if the node is covered
    pub fn community_of(&self, node: usize) -> Option<usize> {
        self.0.get(node).copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &usize> + '_ {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<usize> {
        self.0
    }

    /// Number of distinct community ids
    pub fn num_communities(&self) -> usize {
        self.0.iter().unique().count()
    }

    /// One more than the largest id (0 for an empty partition)
    pub fn num_slots(&self) -> usize {
        self.0.iter().max().map_or(0, |&max| max + 1)
    }

    /// True when the ids are exactly `0..num_communities`
    pub fn is_contiguous(&self) -> bool {
        self.num_slots() == self.num_communities()
    }

    /// Member nodes of every community, indexed by community id
    pub fn members(&self) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.num_slots()];
        for (node, &community) in self.0.iter().enumerate() {
            members[community].push(node);
        }
        members
    }
}

impl Index<usize> for Partition {
    type Output = usize;

    fn index(&self, node: usize) -> &usize {
        &self.0[node]
    }
}

impl From<Vec<usize>> for Partition {
    fn from(assignment: Vec<usize>) -> Self {
        Self(assignment)
    }
}
