//! `girvan-newman`: divisive community detection on weighted undirected graphs.
//!
//! Repeatedly delete the edge(s) of highest betweenness, score every resulting partition
//! with modularity, and return the best one.
//!
//! ```
//! use girvan_newman::{girvan_newman, GirvanNewmanConfig, UnGraph};
//!
//! // Two triangles joined by the bridge 2-3.
//! let g = UnGraph::from_edges([
//!     (0, 1, None), (1, 2, None), (2, 0, None),
//!     (3, 4, None), (4, 5, None), (5, 3, None),
//!     (2, 3, None),
//! ]);
//! let best = girvan_newman(g, GirvanNewmanConfig::default()).into_best().unwrap();
//! assert_eq!(best.communities, vec![vec![0, 1, 2], vec![3, 4, 5]]);
//! assert!(best.modularity > 0.0);
//! ```
//!
//! Public invariants (must not drift):
//! - **Node order**: index-based outputs are indexed by node id \(0..n-1\); for [`UnGraph`]
//!   that is insertion order.
//! - **Determinism**: serial operators are deterministic given identical inputs + configs.
//!   The parallel betweenness engine matches up to floating-point summation order.
//! - **Recompute, never patch**: betweenness and components are recomputed from scratch
//!   after every structural change.
//! - **Frozen null model**: modularity always compares against the original degrees.
//!
//! Swappable (allowed to change without breaking the contract):
//! - iteration strategy (serial vs parallel)
//! - internal data structures (so long as invariants hold)

pub mod betweenness;
pub mod driver;
pub mod graph;
pub mod modularity;
pub mod partition;

#[cfg(feature = "parallel")]
pub use betweenness::edge_betweenness_parallel;
pub use betweenness::{edge_betweenness, BetweennessConfig, EdgeBetweenness, WeightMode};
pub use driver::{
    girvan_newman, girvan_newman_checked, girvan_newman_checked_run, girvan_newman_run,
    girvan_newman_step, BestSplit, GirvanNewmanConfig, GirvanNewmanRun, Outcome, StepRecord,
    StepReport,
};
pub use graph::{AdjacencyMatrix, Graph, UnGraph, WeightedGraph};
pub use modularity::{degree_table, modularity, modularity_checked, total_weight};
pub use partition::{component_count, connected_components, Partition};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("index out of bounds: {0}")]
    IndexOutOfBounds(usize),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, Error>;
