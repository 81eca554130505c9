//! Edge betweenness centrality (Brandes accumulation, weighted or unweighted).
//!
//! For every source node we build the shortest-path DAG (BFS when every edge has the same
//! length, Dijkstra otherwise), count shortest paths `sigma`, then walk the DAG backwards
//! accumulating each pair's share onto the edges it uses. When several shortest paths join
//! a pair, each gets `1 / sigma` of it.
//!
//! Public invariants:
//! - one score per undirected edge, edges reported as `(lo, hi)` with `lo < hi`, sorted;
//! - scores are finite and non-negative; unreachable pairs contribute 0;
//! - the result is recomputed from scratch on every call.
//!
//! Normalization: summing over all sources counts each unordered pair twice. Raw scores are
//! halved, so an un-normalized score is a (fractional) count of node pairs. Normalized
//! scores are further divided by the number of unordered pairs, `n (n - 1) / 2`.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};

use crate::graph::WeightedGraph;

/// How stored edge weights translate into shortest-path lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WeightMode {
    /// Weight is the path length (lower = closer).
    #[default]
    Cost,
    /// Weight is connection strength (higher = closer); path length is `1 / weight`.
    Strength,
    /// Ignore weights; path length is the hop count.
    Unweighted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BetweennessConfig {
    pub weight_mode: WeightMode,
    pub normalized: bool,
}

impl Default for BetweennessConfig {
    fn default() -> Self {
        Self {
            weight_mode: WeightMode::Cost,
            normalized: true,
        }
    }
}

/// Edge betweenness scores, one per undirected edge.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeBetweenness {
    edges: Vec<(usize, usize)>,
    scores: Vec<f64>,
}

impl EdgeBetweenness {
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), f64)> + '_ {
        self.edges.iter().copied().zip(self.scores.iter().copied())
    }

    /// Score of the edge `{u, v}` in either orientation.
    pub fn get(&self, u: usize, v: usize) -> Option<f64> {
        let key = if u < v { (u, v) } else { (v, u) };
        self.edges
            .binary_search(&key)
            .ok()
            .map(|i| self.scores[i])
    }

    /// Largest score, `0.0` when there are no edges.
    pub fn max(&self) -> f64 {
        self.scores.iter().copied().fold(0.0, f64::max)
    }

    /// Every edge whose score is within `tolerance` (relative to the maximum) of the maximum.
    ///
    /// A negative or NaN tolerance is treated as exact comparison, so a non-empty result
    /// always contains the maximal edges.
    pub fn argmax_all(&self, tolerance: f64) -> Vec<(usize, usize)> {
        let max = self.max();
        let tolerance = if tolerance.is_nan() { 0.0 } else { tolerance };
        let floor = (max - tolerance * max.abs()).min(max);
        self.iter()
            .filter(|&(_, s)| s >= floor)
            .map(|(e, _)| e)
            .collect()
    }

    pub fn into_map(self) -> HashMap<(usize, usize), f64> {
        self.edges.into_iter().zip(self.scores).collect()
    }
}

/// Index-based copy of the graph with path lengths resolved once per call.
struct Snapshot {
    edges: Vec<(usize, usize)>,
    // (neighbor, edge id, length)
    adj: Vec<Vec<(usize, usize, f64)>>,
    hop_lengths: bool,
    // Shortest edge length; caps the tie tolerance.
    min_len: f64,
}

impl Snapshot {
    fn build<G: WeightedGraph>(graph: &G, mode: WeightMode) -> Self {
        let n = graph.node_count();
        let mut edges = Vec::new();
        let mut adj: Vec<Vec<(usize, usize, f64)>> = vec![Vec::new(); n];
        let mut first_len: Option<f64> = None;
        let mut uniform = true;
        let mut min_len = f64::INFINITY;

        for u in 0..n {
            let mut nbrs: Vec<(usize, f64)> = graph.weighted_neighbors(u).collect();
            nbrs.sort_by_key(|&(v, _)| v);
            for (v, w) in nbrs {
                // Each undirected edge is taken from its lower endpoint.
                if v <= u || v >= n || !(w.is_finite() && w > 0.0) {
                    continue;
                }
                let len = match mode {
                    WeightMode::Cost => w,
                    WeightMode::Strength => 1.0 / w,
                    WeightMode::Unweighted => 1.0,
                };
                if let Some(l) = first_len {
                    uniform &= l == len;
                } else {
                    first_len = Some(len);
                }
                min_len = min_len.min(len);
                let id = edges.len();
                edges.push((u, v));
                adj[u].push((v, id, len));
                adj[v].push((u, id, len));
            }
        }

        Self {
            edges,
            adj,
            hop_lengths: uniform,
            min_len,
        }
    }

    fn node_count(&self) -> usize {
        self.adj.len()
    }

    fn finish(self, raw: Vec<f64>, normalized: bool) -> EdgeBetweenness {
        let n = self.node_count();
        let scale = if normalized {
            if n > 1 {
                1.0 / (n as f64 * (n as f64 - 1.0))
            } else {
                1.0
            }
        } else {
            0.5
        };
        EdgeBetweenness {
            edges: self.edges,
            scores: raw.into_iter().map(|s| s * scale).collect(),
        }
    }
}

/// Per-source scratch space, reused across sources.
struct Workspace {
    order: Vec<usize>,
    preds: Vec<Vec<(usize, usize)>>,
    sigma: Vec<f64>,
    dist: Vec<f64>,
    delta: Vec<f64>,
    settled: Vec<bool>,
    queue: VecDeque<usize>,
    heap: BinaryHeap<HeapEntry>,
}

impl Workspace {
    fn new(n: usize) -> Self {
        Self {
            order: Vec::with_capacity(n),
            preds: vec![Vec::new(); n],
            sigma: vec![0.0; n],
            dist: vec![f64::INFINITY; n],
            delta: vec![0.0; n],
            settled: vec![false; n],
            queue: VecDeque::new(),
            heap: BinaryHeap::new(),
        }
    }

    fn reset(&mut self) {
        self.order.clear();
        for p in &mut self.preds {
            p.clear();
        }
        self.sigma.fill(0.0);
        self.dist.fill(f64::INFINITY);
        self.delta.fill(0.0);
        self.settled.fill(false);
        self.queue.clear();
        self.heap.clear();
    }
}

/// Min-heap entry for Dijkstra; ties pop in node order.
#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    dist: f64,
    node: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap.
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Path lengths this close are the same length.
///
/// The tolerance is relative (`1e-12`) but never reaches half the shortest edge, so a path
/// that is longer by at least one edge is never tied with a shorter one. When an edge is
/// shorter than the rounding error of the distances it is added to, ties through it are
/// not detected.
fn same_length(a: f64, b: f64, min_len: f64) -> bool {
    let tolerance = (1e-12 * a.abs().max(b.abs()).max(1.0)).min(0.5 * min_len);
    (a - b).abs() <= tolerance
}

fn shortest_paths_bfs(snap: &Snapshot, s: usize, ws: &mut Workspace) {
    ws.dist[s] = 0.0;
    ws.sigma[s] = 1.0;
    ws.queue.push_back(s);
    while let Some(v) = ws.queue.pop_front() {
        ws.order.push(v);
        let dv = ws.dist[v];
        for &(w, e, _) in &snap.adj[v] {
            if ws.dist[w].is_infinite() {
                ws.dist[w] = dv + 1.0;
                ws.queue.push_back(w);
            }
            if ws.dist[w] == dv + 1.0 {
                ws.sigma[w] += ws.sigma[v];
                ws.preds[w].push((v, e));
            }
        }
    }
}

fn shortest_paths_dijkstra(snap: &Snapshot, s: usize, ws: &mut Workspace) {
    ws.dist[s] = 0.0;
    ws.sigma[s] = 1.0;
    ws.heap.push(HeapEntry { dist: 0.0, node: s });
    while let Some(HeapEntry { node: v, .. }) = ws.heap.pop() {
        if ws.settled[v] {
            continue;
        }
        ws.settled[v] = true;
        ws.order.push(v);
        let dv = ws.dist[v];
        for &(w, e, len) in &snap.adj[v] {
            if ws.settled[w] {
                continue;
            }
            let candidate = dv + len;
            let known = ws.dist[w];
            if known.is_infinite()
                || (candidate < known && !same_length(candidate, known, snap.min_len))
            {
                ws.dist[w] = candidate;
                ws.sigma[w] = ws.sigma[v];
                ws.preds[w].clear();
                ws.preds[w].push((v, e));
                ws.heap.push(HeapEntry {
                    dist: candidate,
                    node: w,
                });
            } else if same_length(candidate, known, snap.min_len) {
                ws.sigma[w] += ws.sigma[v];
                ws.preds[w].push((v, e));
            }
        }
    }
}

/// Single-source pass: add this source's dependencies onto `acc` (indexed by edge id).
fn accumulate_source(snap: &Snapshot, s: usize, ws: &mut Workspace, acc: &mut [f64]) {
    ws.reset();
    if snap.hop_lengths {
        shortest_paths_bfs(snap, s, ws);
    } else {
        shortest_paths_dijkstra(snap, s, ws);
    }

    while let Some(w) = ws.order.pop() {
        let coeff = (1.0 + ws.delta[w]) / ws.sigma[w];
        for &(v, e) in &ws.preds[w] {
            let c = ws.sigma[v] * coeff;
            acc[e] += c;
            ws.delta[v] += c;
        }
    }
}

/// Edge betweenness centrality of every edge in `graph`.
///
/// Edges with a non-finite or non-positive weight are ignored (they are not edges of the
/// weighted graph). Returns an empty result for a graph without edges.
pub fn edge_betweenness<G: WeightedGraph>(graph: &G, config: BetweennessConfig) -> EdgeBetweenness {
    let snap = Snapshot::build(graph, config.weight_mode);
    let n = snap.node_count();
    let mut raw = vec![0.0; snap.edges.len()];
    if !raw.is_empty() {
        let mut ws = Workspace::new(n);
        for s in 0..n {
            accumulate_source(&snap, s, &mut ws, &mut raw);
        }
    }
    snap.finish(raw, config.normalized)
}

/// [`edge_betweenness`] with sources split across the rayon pool.
///
/// Per-thread partial sums are merged by element-wise addition, so results match the serial
/// version up to floating-point summation order.
#[cfg(feature = "parallel")]
pub fn edge_betweenness_parallel<G: WeightedGraph>(
    graph: &G,
    config: BetweennessConfig,
) -> EdgeBetweenness {
    use rayon::prelude::*;

    let snap = Snapshot::build(graph, config.weight_mode);
    let n = snap.node_count();
    let m = snap.edges.len();
    if m == 0 {
        return snap.finish(Vec::new(), config.normalized);
    }
    let raw = (0..n)
        .into_par_iter()
        .fold(
            || (Workspace::new(n), vec![0.0; m]),
            |(mut ws, mut acc), s| {
                accumulate_source(&snap, s, &mut ws, &mut acc);
                (ws, acc)
            },
        )
        .map(|(_, acc)| acc)
        .reduce(
            || vec![0.0; m],
            |mut a, b| {
                for (x, y) in a.iter_mut().zip(b) {
                    *x += y;
                }
                a
            },
        );
    snap.finish(raw, config.normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AdjacencyMatrix, UnGraph};
    use proptest::prelude::*;

    fn raw() -> BetweennessConfig {
        BetweennessConfig {
            normalized: false,
            ..BetweennessConfig::default()
        }
    }

    fn path(n: usize) -> UnGraph<usize> {
        UnGraph::from_edges((0..n - 1).map(|i| (i, i + 1, None)))
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn path_graph_matches_closed_form() {
        let n = 6;
        let bc = edge_betweenness(&path(n), raw());
        assert_eq!(bc.len(), n - 1);
        for i in 0..n - 1 {
            let expected = ((i + 1) * (n - 1 - i)) as f64;
            assert_close(bc.get(i, i + 1).unwrap(), expected);
        }
        // Innermost edges carry the most.
        assert_eq!(bc.argmax_all(1e-9), vec![(2, 3)]);
    }

    #[test]
    fn path_graph_normalized_by_pair_count() {
        let bc = edge_betweenness(&path(4), BetweennessConfig::default());
        assert_close(bc.get(0, 1).unwrap(), 3.0 / 6.0);
        assert_close(bc.get(2, 1).unwrap(), 4.0 / 6.0);
        assert_close(bc.get(2, 3).unwrap(), 3.0 / 6.0);
    }

    #[test]
    fn bridge_between_triangles_is_unique_maximum() {
        let g = UnGraph::from_edges([
            (0u8, 1u8, None),
            (1, 2, None),
            (2, 0, None),
            (3, 4, None),
            (4, 5, None),
            (5, 3, None),
            (2, 3, None),
        ]);
        let bc = edge_betweenness(&g, raw());
        let bridge = (g.index_of(&2).unwrap(), g.index_of(&3).unwrap());
        assert_close(bc.get(bridge.0, bridge.1).unwrap(), 9.0);
        assert_eq!(bc.argmax_all(1e-9), vec![bridge]);
    }

    #[test]
    fn equal_shortest_paths_share_credit() {
        // 4-cycle: every edge carries its own pair plus half of two opposite pairs.
        let g = UnGraph::from_edges([(0u8, 1u8, None), (1, 2, None), (2, 3, None), (3, 0, None)]);
        let bc = edge_betweenness(&g, raw());
        for (_, s) in bc.iter() {
            assert_close(s, 2.0);
        }
        assert_eq!(bc.argmax_all(1e-9).len(), 4);
    }

    #[test]
    fn heavy_edge_is_avoided_as_cost_but_preferred_as_strength() {
        // Square 0-1-2-3-0, edge 0-1 has weight 10.
        let g = UnGraph::from_edges([
            (0u8, 1u8, Some(10.0)),
            (1, 2, None),
            (2, 3, None),
            (3, 0, None),
        ]);
        let cost = edge_betweenness(&g, raw());
        assert_close(cost.get(0, 1).unwrap(), 0.0);

        let strength = edge_betweenness(
            &g,
            BetweennessConfig {
                weight_mode: WeightMode::Strength,
                normalized: false,
            },
        );
        assert_eq!(strength.argmax_all(1e-9), vec![(0, 1)]);
    }

    #[test]
    fn uniform_weights_match_unweighted() {
        let g = UnGraph::from_edges([
            (0u8, 1u8, Some(2.5)),
            (1, 2, Some(2.5)),
            (2, 3, Some(2.5)),
            (3, 0, Some(2.5)),
            (0, 2, Some(2.5)),
        ]);
        let weighted = edge_betweenness(&g, raw());
        let hops = edge_betweenness(
            &g,
            BetweennessConfig {
                weight_mode: WeightMode::Unweighted,
                normalized: false,
            },
        );
        assert_eq!(weighted, hops);
    }

    #[test]
    fn dijkstra_counts_tied_weighted_paths() {
        // Two routes of length 3 from 0 to 3: 0-1-3 (1 + 2) and 0-2-3 (2 + 1).
        let g = UnGraph::from_edges([
            (0u8, 1u8, Some(1.0)),
            (1, 3, Some(2.0)),
            (0, 2, Some(2.0)),
            (2, 3, Some(1.0)),
        ]);
        let bc = edge_betweenness(&g, raw());
        // Ids 0, 1, 3, 2 are inserted in that order; scores are keyed by index.
        let e = |a: u8, b: u8| {
            bc.get(g.index_of(&a).unwrap(), g.index_of(&b).unwrap())
                .unwrap()
        };
        assert_close(e(0, 1), e(2, 3));
        assert_close(e(1, 3), e(0, 2));
        // Own pair, plus half of 0-3 and half of 1-2, which both split over two routes.
        assert_close(e(0, 1), 2.0);
        assert_close(e(1, 3), 2.0);
    }

    #[test]
    fn tiny_edge_does_not_tie_a_strictly_longer_path() {
        // 0-1 direct (1e6) is shorter than 0-2-1 (1e6 + 1e-7) by the tiny edge.
        let g = UnGraph::from_edges([
            (0u8, 1u8, Some(1e6)),
            (0, 2, Some(1e6)),
            (2, 1, Some(1e-7)),
        ]);
        let bc = edge_betweenness(&g, raw());
        // Every pair is joined by its direct edge alone.
        for (_, s) in bc.iter() {
            assert_close(s, 1.0);
        }
    }

    #[test]
    fn argmax_all_keeps_the_maximum_for_bad_tolerances() {
        let bc = edge_betweenness(&path(4), raw());
        assert_eq!(bc.argmax_all(-0.5), vec![(1, 2)]);
        assert_eq!(bc.argmax_all(f64::NAN), vec![(1, 2)]);
        assert_eq!(bc.argmax_all(0.0), vec![(1, 2)]);
    }

    #[test]
    fn empty_graph_has_no_scores() {
        let g: UnGraph<u8> = UnGraph::new();
        let bc = edge_betweenness(&g, BetweennessConfig::default());
        assert!(bc.is_empty());
        assert_eq!(bc.max(), 0.0);
        assert!(bc.argmax_all(1e-9).is_empty());

        let mut isolated: UnGraph<u8> = UnGraph::new();
        isolated.add_node(0);
        isolated.add_node(1);
        assert!(edge_betweenness(&isolated, BetweennessConfig::default()).is_empty());
    }

    #[test]
    fn adjacency_matrix_adapter_is_supported() {
        let adj = vec![
            vec![0.0, 1.0, 0.0],
            vec![1.0, 0.0, 1.0],
            vec![0.0, 1.0, 0.0],
        ];
        let bc = edge_betweenness(&AdjacencyMatrix(&adj), raw());
        let map = bc.into_map();
        assert_eq!(map.len(), 2);
        assert_close(map[&(0, 1)], 2.0);
        assert_close(map[&(1, 2)], 2.0);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_matches_serial() {
        let g = UnGraph::from_edges([
            (0u8, 1u8, Some(1.0)),
            (1, 2, Some(3.0)),
            (2, 3, Some(1.0)),
            (3, 0, Some(2.0)),
            (1, 3, Some(1.5)),
            (3, 4, None),
        ]);
        let a = edge_betweenness(&g, BetweennessConfig::default());
        let b = edge_betweenness_parallel(&g, BetweennessConfig::default());
        assert_eq!(a.edges(), b.edges());
        for (x, y) in a.scores().iter().zip(b.scores()) {
            assert_close(*x, *y);
        }
    }

    proptest! {
        #[test]
        fn prop_scores_are_nonnegative_and_cover_own_pair(
            n in 2usize..12,
            edges in proptest::collection::vec((0usize..12, 0usize..12, 1u8..5), 0..30),
        ) {
            let g: UnGraph<usize> = edges
                .into_iter()
                .filter(|&(u, v, _)| u < n && v < n)
                .map(|(u, v, w)| (u, v, Some(w as f64)))
                .collect();
            let hops = edge_betweenness(&g, BetweennessConfig {
                weight_mode: WeightMode::Unweighted,
                normalized: false,
            });
            prop_assert_eq!(hops.len(), g.edge_count());
            for (_, s) in hops.iter() {
                prop_assert!(s.is_finite());
                // The edge is the only shortest path between its own endpoints.
                prop_assert!(s >= 1.0 - 1e-9, "score={}", s);
            }

            let weighted = edge_betweenness(&g, BetweennessConfig::default());
            for (_, s) in weighted.iter() {
                prop_assert!(s.is_finite() && s >= 0.0, "score={}", s);
            }
        }
    }
}
