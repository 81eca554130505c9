//! Modularity of the partition induced by the current connected components.
//!
//! The null model is frozen: expected community weight comes from the degree table of the
//! *original* graph, while the observed weight comes from the graph as it is now. For a
//! community `C` with current degree sum `k_C` and original degree sum `d_C`:
//!
//! ```text
//! Q = (1 / 2m) * Σ_C [ k_C - d_C² / (2m) ]
//! ```
//!
//! where `m` is the original total edge weight.

use crate::graph::WeightedGraph;
use crate::partition::Partition;
use crate::{Error, Result};

/// Weighted degree of every node in the current state.
///
/// Negative and NaN weights count as `0.0`.
pub fn degree_table<G: WeightedGraph>(graph: &G) -> Vec<f64> {
    (0..graph.node_count())
        .map(|u| {
            graph
                .weighted_neighbors(u)
                .filter(|&(v, _)| v != u)
                .map(|(_, w)| w.max(0.0))
                .sum()
        })
        .collect()
}

/// Total edge weight `m` (each undirected edge once).
pub fn total_weight<G: WeightedGraph>(graph: &G) -> f64 {
    degree_table(graph).iter().sum::<f64>() / 2.0
}

/// Modularity of `graph`'s connected components against the original degrees.
///
/// `orig_deg` is indexed by node; missing entries count as `0.0`. A non-positive (or NaN)
/// `total_weight` has no defined modularity and yields `0.0`.
pub fn modularity<G: WeightedGraph>(graph: &G, orig_deg: &[f64], total_weight: f64) -> f64 {
    if total_weight.is_nan() || total_weight <= 0.0 {
        return 0.0;
    }
    let current = degree_table(graph);
    let partition = Partition::components(graph);

    let mut observed = vec![0.0; partition.len()];
    let mut expected = vec![0.0; partition.len()];
    for (u, &c) in partition.labels().iter().enumerate() {
        observed[c] += current[u];
        expected[c] += orig_deg.get(u).copied().unwrap_or(0.0);
    }

    let two_m = 2.0 * total_weight;
    let q: f64 = observed
        .iter()
        .zip(&expected)
        .map(|(k, d)| k - d * d / two_m)
        .sum();
    q / two_m
}

/// Checked [`modularity`].
///
/// Rejects a degree table whose length differs from the node count, and a non-finite or
/// negative total weight.
pub fn modularity_checked<G: WeightedGraph>(
    graph: &G,
    orig_deg: &[f64],
    total_weight: f64,
) -> Result<f64> {
    if orig_deg.len() != graph.node_count() {
        return Err(Error::InvalidParameter(format!(
            "degree table length must equal node_count (len={} node_count={})",
            orig_deg.len(),
            graph.node_count()
        )));
    }
    if !total_weight.is_finite() || total_weight < 0.0 {
        return Err(Error::InvalidParameter(
            "total weight must be finite and non-negative".to_string(),
        ));
    }
    Ok(modularity(graph, orig_deg, total_weight))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::UnGraph;

    fn two_triangles() -> UnGraph<u8> {
        UnGraph::from_edges([
            (0, 1, None),
            (1, 2, None),
            (2, 0, None),
            (3, 4, None),
            (4, 5, None),
            (5, 3, None),
            (2, 3, None),
        ])
    }

    #[test]
    fn single_component_scores_zero() {
        let g = two_triangles();
        let deg = degree_table(&g);
        let q = modularity(&g, &deg, total_weight(&g));
        assert!(q.abs() < 1e-12, "q={q}");
    }

    #[test]
    fn splitting_the_bridge_is_positive() {
        let mut g = two_triangles();
        let deg = g.degree_table();
        let m = g.total_weight();
        assert_eq!(m, 7.0);
        g.remove_edge(&2, &3);
        let q = modularity(&g, &deg, m);
        assert!((q - 5.0 / 14.0).abs() < 1e-12, "q={q}");
    }

    #[test]
    fn weights_enter_the_degrees() {
        let g = UnGraph::from_edges([(0u8, 1u8, Some(3.0)), (1, 2, Some(1.0))]);
        assert_eq!(degree_table(&g), vec![3.0, 4.0, 1.0]);
        assert_eq!(total_weight(&g), 4.0);
    }

    #[test]
    fn all_singletons_score_negative() {
        let mut g = two_triangles();
        let deg = g.degree_table();
        let m = g.total_weight();
        let edges: Vec<(usize, usize)> = g.edges().map(|(u, v, _)| (u, v)).collect();
        for (u, v) in edges {
            g.remove_edge_by_index(u, v);
        }
        let q = modularity(&g, &deg, m);
        // Σ d² = 4 * 4 + 2 * 9 = 34
        assert!((q + 34.0 / 196.0).abs() < 1e-12, "q={q}");
    }

    #[test]
    fn zero_total_weight_is_zero_by_convention() {
        let mut g: UnGraph<u8> = UnGraph::new();
        g.add_node(0);
        assert_eq!(modularity(&g, &[0.0], 0.0), 0.0);
        assert_eq!(modularity(&g, &[0.0], f64::NAN), 0.0);
    }

    #[test]
    fn checked_rejects_mismatched_degree_table() {
        let g = two_triangles();
        let err = modularity_checked(&g, &[1.0, 2.0], 7.0).unwrap_err();
        assert!(format!("{err}").contains("degree table length"));
        assert!(modularity_checked(&g, &g.degree_table(), -1.0).is_err());
        assert!(modularity_checked(&g, &g.degree_table(), 7.0).is_ok());
    }
}
