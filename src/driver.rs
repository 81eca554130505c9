//! Girvan-Newman divisive community detection.
//!
//! Each step removes the edge(s) of highest betweenness until the component count grows.
//! Every edge tied for the maximum is removed in the same round, so one round can delete
//! several edges. After each step the new components are scored with [`modularity`] against
//! the original degrees, and the best-scoring snapshot is kept. The run ends when no edges
//! remain.
//!
//! The search is greedy: it only visits the partitions this removal order produces.

use std::hash::Hash;

use crate::betweenness::{edge_betweenness, BetweennessConfig, EdgeBetweenness};
use crate::graph::UnGraph;
use crate::modularity::modularity;
use crate::{Error, Result};

macro_rules! progress {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+)
        } else {
            tracing::debug!($($arg)+)
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GirvanNewmanConfig {
    pub betweenness: BetweennessConfig,
    /// Edges scoring at least `max * (1 - tie_tolerance)` count as tied for the maximum.
    pub tie_tolerance: f64,
    /// Use the rayon betweenness engine (needs the `parallel` feature; ignored otherwise).
    pub parallel: bool,
    /// Report per-step progress at `info` instead of `debug`.
    pub verbose: bool,
}

impl Default for GirvanNewmanConfig {
    fn default() -> Self {
        Self {
            betweenness: BetweennessConfig::default(),
            tie_tolerance: 1e-9,
            parallel: false,
            verbose: false,
        }
    }
}

impl GirvanNewmanConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.tie_tolerance.is_finite() {
            return Err(Error::InvalidParameter(
                "tie_tolerance must be finite".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.tie_tolerance) {
            return Err(Error::InvalidParameter(
                "tie_tolerance must be in [0,1)".to_string(),
            ));
        }
        Ok(())
    }
}

/// What one call to [`girvan_newman_step`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport<N> {
    /// Removed edges, in removal order.
    pub removed: Vec<(N, N)>,
    /// Number of betweenness recomputations.
    pub rounds: usize,
    pub components_before: usize,
    pub components_after: usize,
}

/// One visited partition.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepRecord {
    /// 1-based step number.
    pub step: usize,
    pub removed_edges: usize,
    pub communities: usize,
    pub modularity: f64,
}

/// The best-modularity state seen during a run.
#[derive(Debug, Clone)]
pub struct BestSplit<N> {
    /// The working graph right after the step that produced this split.
    pub graph: UnGraph<N>,
    /// Its connected components, in first-seen node order.
    pub communities: Vec<Vec<N>>,
    pub modularity: f64,
    pub step: usize,
}

#[derive(Debug, Clone)]
pub enum Outcome<N> {
    /// A split with positive modularity was found.
    Best(BestSplit<N>),
    /// No visited partition scored above zero (e.g. the graph has no edges).
    NoImprovingSplit {
        /// Highest modularity among the visited partitions.
        best_modularity: f64,
    },
}

impl<N> Outcome<N> {
    pub fn best(&self) -> Option<&BestSplit<N>> {
        match self {
            Outcome::Best(b) => Some(b),
            Outcome::NoImprovingSplit { .. } => None,
        }
    }

    pub fn into_best(self) -> Option<BestSplit<N>> {
        match self {
            Outcome::Best(b) => Some(b),
            Outcome::NoImprovingSplit { .. } => None,
        }
    }

    pub fn is_split(&self) -> bool {
        matches!(self, Outcome::Best(_))
    }
}

#[derive(Debug, Clone)]
pub struct GirvanNewmanRun<N> {
    pub outcome: Outcome<N>,
    /// Modularity of every partition visited, in order.
    pub history: Vec<StepRecord>,
    pub steps: usize,
    /// Total betweenness recomputations across all steps.
    pub rounds: usize,
}

#[cfg(feature = "parallel")]
fn betweenness_for<N>(graph: &UnGraph<N>, config: GirvanNewmanConfig) -> EdgeBetweenness {
    if config.parallel {
        crate::betweenness::edge_betweenness_parallel(graph, config.betweenness)
    } else {
        edge_betweenness(graph, config.betweenness)
    }
}

#[cfg(not(feature = "parallel"))]
fn betweenness_for<N>(graph: &UnGraph<N>, config: GirvanNewmanConfig) -> EdgeBetweenness {
    edge_betweenness(graph, config.betweenness)
}

/// Remove maximum-betweenness edges until the number of components increases.
///
/// Does nothing when the graph is already split into singletons.
pub fn girvan_newman_step<N: Clone + Eq + Hash>(
    graph: &mut UnGraph<N>,
    config: GirvanNewmanConfig,
) -> StepReport<N> {
    let before = graph.component_count();
    let n = graph.node_count();
    let mut after = before;
    let mut rounds = 0usize;
    let mut removed = Vec::new();

    while after <= before && before != n && graph.edge_count() > 0 {
        let bc = betweenness_for(graph, config);
        let tied = bc.argmax_all(config.tie_tolerance);
        if tied.is_empty() {
            break;
        }
        for &(u, v) in &tied {
            graph.remove_edge_by_index(u, v);
            removed.push((graph.nodes()[u].clone(), graph.nodes()[v].clone()));
        }
        rounds += 1;
        after = graph.component_count();
        tracing::debug!(
            round = rounds,
            max_betweenness = bc.max(),
            removed = tied.len(),
            components = after,
            "removed max-betweenness edges"
        );
    }

    StepReport {
        removed,
        rounds,
        components_before: before,
        components_after: after,
    }
}

/// Run Girvan-Newman to exhaustion and keep the best-modularity split.
///
/// `graph` is consumed as the working copy; clone it first to keep the original.
pub fn girvan_newman_run<N: Clone + Eq + Hash>(
    mut graph: UnGraph<N>,
    config: GirvanNewmanConfig,
) -> GirvanNewmanRun<N> {
    let orig_deg = graph.degree_table();
    let total_weight = graph.total_weight();
    progress!(
        config.verbose,
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        total_weight,
        "starting girvan-newman"
    );

    let mut best: Option<BestSplit<N>> = None;
    let mut best_q = 0.0;
    let mut history = Vec::new();
    let mut rounds = 0usize;

    loop {
        let step = history.len() + 1;
        let report = girvan_newman_step(&mut graph, config);
        rounds += report.rounds;
        let q = modularity(&graph, &orig_deg, total_weight);
        history.push(StepRecord {
            step,
            removed_edges: report.removed.len(),
            communities: report.components_after,
            modularity: q,
        });
        progress!(
            config.verbose,
            step,
            removed = report.removed.len(),
            communities = report.components_after,
            modularity = q,
            "step complete"
        );

        if q > best_q {
            best_q = q;
            let communities = graph.connected_components();
            progress!(
                config.verbose,
                step,
                modularity = q,
                communities = communities.len(),
                "new best split"
            );
            best = Some(BestSplit {
                graph: graph.clone(),
                communities,
                modularity: q,
                step,
            });
        }

        if graph.edge_count() == 0 {
            break;
        }
        if report.removed.is_empty() {
            tracing::warn!(
                step,
                edges = graph.edge_count(),
                tie_tolerance = config.tie_tolerance,
                "step removed no edges; stopping"
            );
            break;
        }
    }

    let outcome = match best {
        Some(b) => {
            progress!(
                config.verbose,
                modularity = b.modularity,
                communities = b.communities.len(),
                "max modularity found"
            );
            Outcome::Best(b)
        }
        None => {
            let best_modularity = history
                .iter()
                .map(|r| r.modularity)
                .fold(f64::NEG_INFINITY, f64::max);
            progress!(
                config.verbose,
                best_modularity,
                "no split with positive modularity"
            );
            Outcome::NoImprovingSplit { best_modularity }
        }
    };

    GirvanNewmanRun {
        outcome,
        steps: history.len(),
        history,
        rounds,
    }
}

pub fn girvan_newman<N: Clone + Eq + Hash>(
    graph: UnGraph<N>,
    config: GirvanNewmanConfig,
) -> Outcome<N> {
    girvan_newman_run(graph, config).outcome
}

/// Checked Girvan-Newman: validates `config` first.
pub fn girvan_newman_checked<N: Clone + Eq + Hash>(
    graph: UnGraph<N>,
    config: GirvanNewmanConfig,
) -> Result<Outcome<N>> {
    config.validate()?;
    Ok(girvan_newman(graph, config))
}

pub fn girvan_newman_checked_run<N: Clone + Eq + Hash>(
    graph: UnGraph<N>,
    config: GirvanNewmanConfig,
) -> Result<GirvanNewmanRun<N>> {
    config.validate()?;
    Ok(girvan_newman_run(graph, config))
}
