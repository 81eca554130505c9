//! Connected components and node partitions.
//!
//! A partition is stored as `labels[i] = community_id`, with ids contiguous in `0..k`.
//! The Girvan-Newman driver derives every candidate partition from connected components,
//! so communities are always pairwise disjoint and cover every node (isolated nodes are
//! singleton communities).

use std::collections::{HashMap, VecDeque};

use crate::graph::Graph;
use crate::{Error, Result};

/// Renumber arbitrary labels to `0..k` in first-seen order.
fn renumber(labels: &mut [usize]) -> usize {
    let mut map: HashMap<usize, usize> = HashMap::new();
    let mut next = 0usize;
    for l in labels.iter_mut() {
        let id = *map.entry(*l).or_insert_with(|| {
            let cur = next;
            next += 1;
            cur
        });
        *l = id;
    }
    next
}

/// Connected components of an undirected graph, using BFS.
///
/// Components are numbered in order of their smallest node index, so the labelling is
/// deterministic for a given graph state.
pub fn connected_components<G: Graph>(graph: &G) -> Vec<usize> {
    let n = graph.node_count();
    let mut labels = vec![usize::MAX; n];
    let mut queue: VecDeque<usize> = VecDeque::new();

    let mut comp = 0usize;
    for start in 0..n {
        if labels[start] != usize::MAX {
            continue;
        }
        labels[start] = comp;
        queue.push_back(start);
        while let Some(u) = queue.pop_front() {
            for v in graph.neighbors(u) {
                if v >= n {
                    // Adapter contract violation; ignore out-of-range neighbor.
                    continue;
                }
                if labels[v] == usize::MAX {
                    labels[v] = comp;
                    queue.push_back(v);
                }
            }
        }
        comp += 1;
    }
    labels
}

/// Number of connected components.
pub fn component_count<G: Graph>(graph: &G) -> usize {
    connected_components(graph)
        .into_iter()
        .max()
        .map_or(0, |k| k + 1)
}

/// A node partition backed by contiguous labels.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Partition {
    labels: Vec<usize>,
    count: usize,
}

impl Partition {
    /// Wrap arbitrary labels; they are renumbered to `0..k` in first-seen order.
    pub fn from_labels(mut labels: Vec<usize>) -> Self {
        let count = renumber(&mut labels);
        Self { labels, count }
    }

    /// Partition given by the connected components of `graph`.
    pub fn components<G: Graph>(graph: &G) -> Self {
        Self::from_labels(connected_components(graph))
    }

    /// Number of communities.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn community_of(&self, node: usize) -> Result<usize> {
        self.labels
            .get(node)
            .copied()
            .ok_or(Error::IndexOutOfBounds(node))
    }

    /// Member lists in label order; members ascend by node index.
    pub fn communities(&self) -> Vec<Vec<usize>> {
        let mut out = vec![Vec::new(); self.count];
        for (node, &label) in self.labels.iter().enumerate() {
            out[label].push(node);
        }
        out
    }
}
