//! Graph adapters and the owned weighted undirected graph store.
//!
//! Algorithms in this crate are written against the index-based [`Graph`] /
//! [`WeightedGraph`] traits, so any adjacency structure can be analysed without copying it
//! into [`UnGraph`]. [`UnGraph`] is the store the Girvan-Newman driver mutates.
//!
//! Adapter contract:
//! - node ids are `0..node_count()`;
//! - the graph is undirected: `v ∈ neighbors(u)` iff `u ∈ neighbors(v)`, with equal weights;
//! - no self-loops, no parallel edges.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::{Error, Result};

/// Minimal index-based graph view.
///
/// Neighbors are borrowed iterators so per-node traversal does not allocate.
pub trait Graph {
    fn node_count(&self) -> usize;
    fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> + '_;

    fn out_degree(&self, node: usize) -> usize {
        self.neighbors(node).count()
    }
}

/// A [`Graph`] whose edges carry real weights.
pub trait WeightedGraph: Graph {
    /// Weight of the edge `source -- target`, or `0.0` if there is none.
    fn edge_weight(&self, source: usize, target: usize) -> f64;

    /// Neighbors paired with the incident edge weight.
    fn weighted_neighbors(&self, node: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.neighbors(node).map(move |v| (v, self.edge_weight(node, v)))
    }
}

/// Dense adjacency-matrix adapter; a non-zero entry is an edge.
///
/// Handy for small fixtures. The matrix must be symmetric to satisfy the undirected contract.
#[derive(Debug, Clone, Copy)]
pub struct AdjacencyMatrix<'a>(pub &'a [Vec<f64>]);

impl Graph for AdjacencyMatrix<'_> {
    fn node_count(&self) -> usize {
        self.0.len()
    }

    fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.0[node]
            .iter()
            .enumerate()
            .filter(move |&(j, &w)| j != node && w != 0.0)
            .map(|(j, _)| j)
    }
}

impl WeightedGraph for AdjacencyMatrix<'_> {
    fn edge_weight(&self, source: usize, target: usize) -> f64 {
        self.0[source][target]
    }
}

/// Mutable weighted undirected graph keyed by arbitrary node ids.
///
/// Invariants:
/// - node indices follow insertion order and never change (edges are removed, nodes never are);
/// - no self-loops, at most one edge per unordered pair;
/// - every stored weight is finite and strictly positive.
///
/// `Clone` is a deep copy.
#[derive(Debug, Clone)]
pub struct UnGraph<N> {
    nodes: Vec<N>,
    index: HashMap<N, usize>,
    adj: Vec<BTreeMap<usize, f64>>,
    edge_count: usize,
}

impl<N> Default for UnGraph<N> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            adj: Vec::new(),
            edge_count: 0,
        }
    }
}

impl<N: Clone + Eq + Hash> UnGraph<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(u, v, weight)` triples; a missing weight means `1.0`.
    ///
    /// Triples rejected by [`UnGraph::add_edge`] are skipped.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (N, N, Option<f64>)>,
    {
        let mut g = Self::new();
        g.extend(edges);
        g
    }

    /// Register `node` (isolated if new) and return its index.
    pub fn add_node(&mut self, node: N) -> usize {
        if let Some(&i) = self.index.get(&node) {
            return i;
        }
        let i = self.nodes.len();
        self.index.insert(node.clone(), i);
        self.nodes.push(node);
        self.adj.push(BTreeMap::new());
        i
    }

    /// Insert or overwrite the edge `{u, v}`.
    ///
    /// Self-loops and weights that are not finite and strictly positive are skipped without
    /// registering either endpoint. Returns whether the edge was stored.
    pub fn add_edge(&mut self, u: N, v: N, weight: f64) -> bool {
        if u == v {
            tracing::trace!("skipping self-loop");
            return false;
        }
        if !(weight.is_finite() && weight > 0.0) {
            tracing::trace!(weight, "skipping edge with non-positive weight");
            return false;
        }
        let a = self.add_node(u);
        let b = self.add_node(v);
        if self.adj[a].insert(b, weight).is_none() {
            self.edge_count += 1;
        }
        self.adj[b].insert(a, weight);
        true
    }

    /// [`UnGraph::add_edge`] with the default weight `1.0`.
    pub fn add_edge_default(&mut self, u: N, v: N) -> bool {
        self.add_edge(u, v, 1.0)
    }

    /// Strict variant of [`UnGraph::add_edge`].
    ///
    /// NaN, infinite and negative weights are errors. Self-loops and zero weights are still
    /// tolerated and reported as `Ok(false)`.
    pub fn try_add_edge(&mut self, u: N, v: N, weight: f64) -> Result<bool> {
        if !weight.is_finite() {
            return Err(Error::InvalidParameter(
                "edge weight must be finite".to_string(),
            ));
        }
        if weight < 0.0 {
            return Err(Error::InvalidParameter(
                "edge weight must be non-negative".to_string(),
            ));
        }
        Ok(self.add_edge(u, v, weight))
    }

    /// Remove the edge `{u, v}`; absent edges and unknown nodes are a no-op.
    pub fn remove_edge(&mut self, u: &N, v: &N) -> bool {
        match (self.index_of(u), self.index_of(v)) {
            (Some(a), Some(b)) => self.remove_edge_by_index(a, b),
            _ => false,
        }
    }

    /// Index-level [`UnGraph::remove_edge`].
    pub fn remove_edge_by_index(&mut self, a: usize, b: usize) -> bool {
        if a >= self.adj.len() || b >= self.adj.len() {
            return false;
        }
        let removed = self.adj[a].remove(&b).is_some();
        if removed {
            self.adj[b].remove(&a);
            self.edge_count -= 1;
        }
        removed
    }

    pub fn index_of(&self, node: &N) -> Option<usize> {
        self.index.get(node).copied()
    }

    pub fn node(&self, index: usize) -> Option<&N> {
        self.nodes.get(index)
    }

    /// Node ids in index order.
    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn contains_edge(&self, u: &N, v: &N) -> bool {
        self.edge_weight(u, v).is_some()
    }

    pub fn edge_weight(&self, u: &N, v: &N) -> Option<f64> {
        let a = self.index_of(u)?;
        let b = self.index_of(v)?;
        self.adj[a].get(&b).copied()
    }

    /// Every edge once as `(lo, hi, weight)` with `lo < hi`, ordered by `(lo, hi)`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.adj.iter().enumerate().flat_map(|(u, nbrs)| {
            nbrs.range(u + 1..).map(move |(&v, &w)| (u, v, w))
        })
    }

    /// Sum of incident edge weights of `node` in the current state (`0.0` if unknown).
    pub fn weighted_degree(&self, node: &N) -> f64 {
        self.index_of(node)
            .map(|i| self.adj[i].values().sum())
            .unwrap_or(0.0)
    }

    /// Weighted degree of every node, indexed like [`UnGraph::nodes`].
    pub fn degree_table(&self) -> Vec<f64> {
        crate::modularity::degree_table(self)
    }

    /// Total edge weight `m`: each edge counted once.
    pub fn total_weight(&self) -> f64 {
        self.edges().map(|(_, _, w)| w).sum()
    }

    /// Connected components resolved to node ids, in first-seen order.
    pub fn connected_components(&self) -> Vec<Vec<N>> {
        crate::partition::Partition::from_labels(crate::partition::connected_components(self))
            .communities()
            .into_iter()
            .map(|members| members.into_iter().map(|i| self.nodes[i].clone()).collect())
            .collect()
    }

    pub fn component_count(&self) -> usize {
        crate::partition::component_count(self)
    }
}

impl<N: Clone + Eq + Hash> Extend<(N, N, Option<f64>)> for UnGraph<N> {
    fn extend<I: IntoIterator<Item = (N, N, Option<f64>)>>(&mut self, iter: I) {
        for (u, v, w) in iter {
            self.add_edge(u, v, w.unwrap_or(1.0));
        }
    }
}

impl<N: Clone + Eq + Hash> FromIterator<(N, N, Option<f64>)> for UnGraph<N> {
    fn from_iter<I: IntoIterator<Item = (N, N, Option<f64>)>>(iter: I) -> Self {
        Self::from_edges(iter)
    }
}

impl<N> Graph for UnGraph<N> {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.adj[node].keys().copied()
    }

    fn out_degree(&self, node: usize) -> usize {
        self.adj[node].len()
    }
}

impl<N> WeightedGraph for UnGraph<N> {
    fn edge_weight(&self, source: usize, target: usize) -> f64 {
        self.adj[source].get(&target).copied().unwrap_or(0.0)
    }

    fn weighted_neighbors(&self, node: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.adj[node].iter().map(|(&v, &w)| (v, w))
    }
}

#[cfg(feature = "petgraph")]
mod petgraph_adapter {
    //! `petgraph` undirected graphs with `f64` edge weights.
    //!
    //! Parallel edges are not supported: `edge_weight` reports the first one found.
    //! Neighbor lists are sorted and deduplicated, so this adapter allocates per call.

    use super::{Graph, WeightedGraph};
    use petgraph::graph::{IndexType, NodeIndex};
    use petgraph::Undirected;

    impl<N, Ix: IndexType> Graph for petgraph::Graph<N, f64, Undirected, Ix> {
        fn node_count(&self) -> usize {
            petgraph::Graph::node_count(self)
        }

        fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
            let mut out: Vec<usize> = petgraph::Graph::neighbors(self, NodeIndex::new(node))
                .map(|n| n.index())
                .filter(|&v| v != node)
                .collect();
            out.sort_unstable();
            out.dedup();
            out.into_iter()
        }
    }

    impl<N, Ix: IndexType> WeightedGraph for petgraph::Graph<N, f64, Undirected, Ix> {
        fn edge_weight(&self, source: usize, target: usize) -> f64 {
            self.find_edge(NodeIndex::new(source), NodeIndex::new(target))
                .map(|e| self[e])
                .unwrap_or(0.0)
        }
    }
}
