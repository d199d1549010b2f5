//! The percolation engine.
//!
//! A run owns a private clone of the caller's graph and walks an attack
//! order through it, stopping at each checkpoint to measure the giant
//! component. Runs are lazy: [`PercolationRun`] is an iterator that does
//! only the removals needed to reach the next checkpoint, so a caller can
//! stop early by dropping it.
//!
//! ```text
//! Initialized → AdvancingToCheckpoint → CheckpointReached → … → Complete
//! ```

use crate::attack::{random_attack, AttackOrder};
use crate::components::{average_shortest_path_length, largest_component_size, ComponentSummary};
use crate::spectral::{SpectralAnalyzer, SpectralConfig, SpectralSummary, DEFAULT_KIRCHHOFF_MAX_N};
use percolate_core::error::{PercolateError, Result};
use percolate_core::graph::NetworkGraph;
use percolate_core::types::{ComponentKind, MetricsRecord, NodeId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Ascending removal counts at which metrics are taken.
///
/// Always starts at 0 and ends at `n`, without duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoints(Vec<usize>);

impl Checkpoints {
    /// Every count `0..=n` when `num_steps` is `None` or at least `n`;
    /// otherwise `num_steps + 1` evenly spaced counts, rounded half to even
    /// and deduplicated.
    pub fn new(n: usize, num_steps: Option<usize>) -> Result<Self> {
        let steps = match num_steps {
            Some(0) => {
                return Err(PercolateError::invalid_config(
                    "num_steps",
                    "must be at least 1",
                ))
            }
            Some(steps) if steps < n => steps,
            _ => return Ok(Self((0..=n).collect())),
        };

        let spacing = n as f64 / steps as f64;
        let mut points: Vec<usize> = (0..=steps)
            .map(|i| (i as f64 * spacing).round_ties_even() as usize)
            .collect();
        points.dedup();
        if let Some(first) = points.first_mut() {
            *first = 0;
        }
        if let Some(last) = points.last_mut() {
            *last = n;
        }
        Ok(Self(points))
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Settings for a percolation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PercolationConfig {
    /// Checkpoint budget; `None` measures after every removal.
    pub num_steps: Option<usize>,
    /// Connectivity notion used for the giant component.
    pub kind: ComponentKind,
    /// Use edge weights as lengths for the average path length.
    pub weighted_paths: bool,
    /// Giant components above this size get no Kirchhoff index.
    pub kirchhoff_max_n: usize,
    pub spectral: SpectralConfig,
}

impl Default for PercolationConfig {
    fn default() -> Self {
        Self {
            num_steps: None,
            kind: ComponentKind::Weak,
            weighted_paths: false,
            kirchhoff_max_n: DEFAULT_KIRCHHOFF_MAX_N,
            spectral: SpectralConfig::default(),
        }
    }
}

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Working copy made, nothing removed yet.
    Initialized,
    /// Removing nodes on the way to `target` removals.
    AdvancingToCheckpoint { target: usize },
    /// A record was emitted for this removal count.
    CheckpointReached { checkpoint: usize },
    /// Every checkpoint has been processed.
    Complete,
}

/// A lazily driven percolation run over a private copy of the graph.
#[derive(Debug)]
pub struct PercolationRun {
    working: NetworkGraph,
    order: Vec<NodeId>,
    checkpoints: Checkpoints,
    next_checkpoint: usize,
    removed: usize,
    /// Node count of the original graph; all fractions are relative to it.
    n: usize,
    config: PercolationConfig,
    analyzer: SpectralAnalyzer,
    state: RunState,
}

impl PercolationRun {
    /// Start a run. The order is re-checked against `graph` and the
    /// checkpoints are derived up front, so every error surfaces here.
    pub fn new(graph: &NetworkGraph, order: &AttackOrder, config: PercolationConfig) -> Result<Self> {
        let order = AttackOrder::validated(graph, order.as_slice().to_vec())?.into_vec();
        let n = graph.node_count();
        let checkpoints = Checkpoints::new(n, config.num_steps)?;

        info!(
            nodes = n,
            checkpoints = checkpoints.len(),
            kind = %config.kind,
            "percolation run started"
        );

        Ok(Self {
            working: graph.clone(),
            order,
            checkpoints,
            next_checkpoint: 0,
            removed: 0,
            n,
            analyzer: SpectralAnalyzer::new(config.spectral.clone()),
            config,
            state: RunState::Initialized,
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn checkpoints(&self) -> &Checkpoints {
        &self.checkpoints
    }

    /// The graph as it stands after the removals made so far.
    pub fn working_graph(&self) -> &NetworkGraph {
        &self.working
    }

    pub fn removed(&self) -> usize {
        self.removed
    }

    fn advance_to(&mut self, target: usize) {
        self.state = RunState::AdvancingToCheckpoint { target };
        remove_prefix(&mut self.working, &self.order, &mut self.removed, target);
    }

    /// Metrics of the working copy as it stands.
    fn measure(&self) -> MetricsRecord {
        if self.n == 0 {
            return MetricsRecord::empty();
        }
        let kind = self.config.kind;
        let components = ComponentSummary::of(&self.working, kind);

        let mut giant = self.working.induced_subgraph(&components.giant);
        if giant.is_directed() && kind.ignores_direction() {
            giant = giant.to_undirected();
        }
        let avg_path = average_shortest_path_length(&giant, self.config.weighted_paths);

        // Spectral indices are undefined below two nodes.
        let spectral = if giant.node_count() >= 2 {
            self.analyzer.summary(&giant, self.config.kirchhoff_max_n)
        } else {
            SpectralSummary::default()
        };

        MetricsRecord {
            removed_fraction: self.removed as f64 / self.n as f64,
            removed_nodes: self.removed,
            gcc_fraction: components.giant_size() as f64 / self.n as f64,
            gcc_size: components.giant_size(),
            num_components: components.count,
            avg_shortest_path_gcc: avg_path,
            algebraic_connectivity_gcc: spectral.algebraic_connectivity,
            spectral_gap_ratio_gcc: spectral.spectral_gap_ratio,
            kirchhoff_index_gcc: spectral.kirchhoff_index,
        }
    }
}

impl Iterator for PercolationRun {
    type Item = MetricsRecord;

    fn next(&mut self) -> Option<MetricsRecord> {
        let Some(&target) = self.checkpoints.as_slice().get(self.next_checkpoint) else {
            if self.state != RunState::Complete {
                self.state = RunState::Complete;
                info!(removed = self.removed, "percolation run complete");
            }
            return None;
        };

        self.advance_to(target);
        let record = self.measure();
        self.next_checkpoint += 1;
        self.state = RunState::CheckpointReached { checkpoint: target };

        debug!(
            removed = record.removed_nodes,
            gcc_size = record.gcc_size,
            components = record.num_components,
            "checkpoint reached"
        );
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.checkpoints.len() - self.next_checkpoint;
        (remaining, Some(remaining))
    }
}

/// Remove `order[*removed..target]` from `working`, skipping nodes that are
/// already gone.
fn remove_prefix(working: &mut NetworkGraph, order: &[NodeId], removed: &mut usize, target: usize) {
    let end = target.min(order.len());
    while *removed < end {
        working.remove_node(&order[*removed]);
        *removed += 1;
    }
}

/// Run to completion and collect every record.
pub fn run_percolation(
    graph: &NetworkGraph,
    order: &AttackOrder,
    config: &PercolationConfig,
) -> Result<Vec<MetricsRecord>> {
    Ok(PercolationRun::new(graph, order, config.clone())?.collect())
}

/// Giant-component fraction against removed fraction, without the path and
/// spectral metrics.
///
/// With no order a random one is drawn from `seed`. Returns
/// `(removed_fractions, gcc_fractions)`; the empty graph gives `([0], [0])`.
pub fn percolation_curve(
    graph: &NetworkGraph,
    order: Option<&AttackOrder>,
    num_steps: Option<usize>,
    kind: ComponentKind,
    seed: Option<u64>,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let n = graph.node_count();
    if n == 0 {
        return Ok((vec![0.0], vec![0.0]));
    }

    let order = match order {
        Some(order) => AttackOrder::validated(graph, order.as_slice().to_vec())?,
        None => random_attack(graph, seed),
    };
    let checkpoints = Checkpoints::new(n, num_steps)?;

    let mut working = graph.clone();
    let mut removed = 0;
    let mut removed_fractions = Vec::with_capacity(checkpoints.len());
    let mut gcc_fractions = Vec::with_capacity(checkpoints.len());

    for &target in checkpoints.as_slice() {
        remove_prefix(&mut working, order.as_slice(), &mut removed, target);
        removed_fractions.push(removed as f64 / n as f64);
        gcc_fractions.push(largest_component_size(&working, kind) as f64 / n as f64);
    }
    Ok((removed_fractions, gcc_fractions))
}
