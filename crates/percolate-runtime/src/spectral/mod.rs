//! Spectral robustness indices.
//!
//! Every quantity here is read off the combinatorial Laplacian `L = D - A`
//! of the graph's undirected view:
//!
//! - algebraic connectivity `λ₂` and its eigenvector (the Fiedler vector)
//! - spectral gap ratio `λₙ / λ₂`
//! - Kirchhoff index `n · Σ 1/λᵢ` over the nonzero eigenvalues
//!
//! Graphs with at most [`SpectralConfig::dense_max_nodes`] nodes are
//! decomposed densely with nalgebra. Larger graphs only ever need one
//! extremal eigenpair at a time, which a matrix-free thick-restart Lanczos
//! iteration extracts without materialising the `n × n` matrix. The bottom
//! of a Laplacian spectrum is often tightly clustered, so `λ₂` is found as
//! `1/θ` for the largest eigenvalue `θ` of the pseudo-inverse, applied by
//! conjugate gradients. Disconnected input is detected by a traversal and
//! answered exactly. A sparse solve that misses its tolerance reports
//! [`PercolateError::NotComputable`]. The Kirchhoff index
//! needs the whole spectrum and is therefore refused above its own size
//! guard with [`PercolateError::TooLarge`].

mod cg;
pub mod laplacian;
mod lanczos;

pub use laplacian::{laplacian_matrix, LaplacianKind};

use crate::components::bfs_distances;
use cg::ConjugateGradient;
use lanczos::{apply_laplacian, Accuracy, Extremal, Lanczos};
use nalgebra::{Dyn, SymmetricEigen};
use percolate_core::error::{PercolateError, Result};
use percolate_core::graph::{Adjacency, EdgeView, NetworkGraph};
use percolate_core::types::NodeId;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default node limit for the Kirchhoff index.
pub const DEFAULT_KIRCHHOFF_MAX_N: usize = 1000;

const LANCZOS_SEED: u64 = 0x5eed;
/// Relative residual for the inner conjugate-gradient solves.
const CG_TOLERANCE: f64 = 1e-12;

/// Tuning for eigenvalue extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralConfig {
    /// Largest graph decomposed densely; above this Lanczos is used.
    #[serde(default = "default_dense_max_nodes")]
    pub dense_max_nodes: usize,
    /// Maximum Krylov subspace dimension for the sparse path.
    #[serde(default = "default_krylov_dim")]
    pub krylov_dim: usize,
    /// Relative residual at which a Ritz pair is accepted.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_dense_max_nodes() -> usize {
    1000
}
fn default_krylov_dim() -> usize {
    300
}
fn default_tolerance() -> f64 {
    1e-10
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            dense_max_nodes: default_dense_max_nodes(),
            krylov_dim: default_krylov_dim(),
            tolerance: default_tolerance(),
        }
    }
}

/// The three spectral indices of one graph. `None` marks an undefined value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpectralSummary {
    pub algebraic_connectivity: Option<f64>,
    pub spectral_gap_ratio: Option<f64>,
    pub kirchhoff_index: Option<f64>,
}

/// Computes spectral indices, choosing dense or sparse extraction by size.
#[derive(Debug, Clone, Default)]
pub struct SpectralAnalyzer {
    config: SpectralConfig,
}

impl SpectralAnalyzer {
    pub fn new(config: SpectralConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SpectralConfig {
        &self.config
    }

    fn is_dense(&self, n: usize) -> bool {
        n <= self.config.dense_max_nodes
    }

    fn lanczos(&self, n: usize) -> Lanczos {
        Lanczos {
            krylov_dim: self.config.krylov_dim,
            tolerance: self.config.tolerance,
            seed: LANCZOS_SEED,
            max_iterations: 10 * n,
        }
    }

    /// Second-smallest Laplacian eigenvalue. Zero on disconnected input.
    pub fn algebraic_connectivity(&self, graph: &NetworkGraph) -> Result<f64> {
        let adj = laplacian_input(graph)?;
        let n = adj.len();
        if self.is_dense(n) {
            Ok(dense_lambda2(&sorted_eigenvalues(&adj)))
        } else {
            debug!(n, "sparse path for algebraic connectivity");
            Ok(self.sparse_fiedler(&adj)?.0)
        }
    }

    /// Fiedler vector, one entry per node in graph order.
    ///
    /// The sign is fixed so the first clearly nonzero entry is positive.
    pub fn fiedler_vector(&self, graph: &NetworkGraph) -> Result<Vec<(NodeId, f64)>> {
        let adj = laplacian_input(graph)?;
        let n = adj.len();
        let mut vector = if self.is_dense(n) {
            let eigen = SymmetricEigen::new(laplacian::combinatorial(&adj));
            let order = ascending_order(&eigen);
            eigen.eigenvectors.column(order[1]).iter().copied().collect()
        } else {
            debug!(n, "sparse path for Fiedler vector");
            self.sparse_fiedler(&adj)?.1
        };

        if let Some(first) = vector.iter().copied().find(|x| x.abs() > 1e-12) {
            if first < 0.0 {
                vector.iter_mut().for_each(|x| *x = -*x);
            }
        }
        Ok(adj.nodes().iter().copied().zip(vector).collect())
    }

    /// Largest Laplacian eigenvalue.
    pub fn largest_eigenvalue(&self, graph: &NetworkGraph) -> Result<f64> {
        let adj = laplacian_input(graph)?;
        let n = adj.len();
        if self.is_dense(n) {
            Ok(sorted_eigenvalues(&adj)[n - 1])
        } else {
            self.sparse_largest(&adj)
        }
    }

    /// `λₙ / λ₂`. Not computable when `λ₂` is zero (disconnected input).
    pub fn spectral_gap_ratio(&self, graph: &NetworkGraph) -> Result<f64> {
        let adj = laplacian_input(graph)?;
        let n = adj.len();
        let zero = || PercolateError::not_computable("algebraic connectivity is zero");
        if self.is_dense(n) {
            let values = sorted_eigenvalues(&adj);
            let lambda2 = dense_lambda2(&values);
            if lambda2 == 0.0 {
                return Err(zero());
            }
            Ok(values[n - 1] / lambda2)
        } else {
            let lambda2 = self.sparse_fiedler(&adj)?.0;
            if lambda2 == 0.0 {
                return Err(zero());
            }
            Ok(self.sparse_largest(&adj)? / lambda2)
        }
    }

    /// Kirchhoff index from the full spectrum.
    ///
    /// Refused with `TooLarge` above `max_n` nodes before any work is done.
    pub fn kirchhoff_index(&self, graph: &NetworkGraph, max_n: usize) -> Result<f64> {
        let n = graph.node_count();
        if n < 2 {
            return Err(too_small(n));
        }
        if n > max_n {
            warn!(nodes = n, max_nodes = max_n, "kirchhoff index skipped by size guard");
            return Err(PercolateError::TooLarge {
                nodes: n,
                max_nodes: max_n,
            });
        }
        let adj = graph.adjacency(EdgeView::Undirected);
        Ok(kirchhoff_from(&sorted_eigenvalues(&adj)))
    }

    /// All three indices, sharing one decomposition where the graph is small
    /// enough. Undefined, guarded and non-finite values come back as `None`.
    pub fn summary(&self, graph: &NetworkGraph, kirchhoff_max_n: usize) -> SpectralSummary {
        let n = graph.node_count();
        if n < 2 {
            return SpectralSummary::default();
        }
        let adj = graph.adjacency(EdgeView::Undirected);

        let dense = self.is_dense(n) || n <= kirchhoff_max_n;
        let spectrum = if dense { Some(sorted_eigenvalues(&adj)) } else { None };

        let (lambda2, lambda_max) = match &spectrum {
            Some(values) => (Some(dense_lambda2(values)), Some(values[n - 1])),
            None => {
                let lambda2 = self.sparse_fiedler(&adj).ok().map(|(value, _)| value);
                let lambda_max = match lambda2 {
                    Some(value) if value > 0.0 => self.sparse_largest(&adj).ok(),
                    _ => None,
                };
                (lambda2, lambda_max)
            }
        };

        let kirchhoff = if n <= kirchhoff_max_n {
            spectrum.as_deref().map(kirchhoff_from)
        } else {
            debug!(nodes = n, max_nodes = kirchhoff_max_n, "kirchhoff index skipped by size guard");
            None
        };

        SpectralSummary {
            algebraic_connectivity: lambda2.and_then(finite),
            spectral_gap_ratio: match (lambda2, lambda_max) {
                (Some(l2), Some(ln)) if l2 > 0.0 => finite(ln / l2),
                _ => None,
            },
            kirchhoff_index: kirchhoff.and_then(finite),
        }
    }

    /// Smallest eigenpair orthogonal to the constant vector.
    ///
    /// Runs Lanczos on the pseudo-inverse, whose top eigenvalue `1/λ₂` is
    /// well separated even when the bottom of the Laplacian spectrum is not.
    fn sparse_fiedler(&self, adj: &Adjacency) -> Result<(f64, Vec<f64>)> {
        let n = adj.len();
        if let Some(vector) = split_vector(adj) {
            debug!(n, "disconnected input; algebraic connectivity is zero");
            return Ok((0.0, vector));
        }

        let cg = ConjugateGradient {
            tolerance: CG_TOLERANCE,
            max_iterations: 20 * n,
        };
        let mut solved = true;
        let constant = vec![1.0 / (n as f64).sqrt(); n];
        let pair = self.lanczos(n).extremal(
            n,
            |x, y| solved &= cg.solve(adj, x, y),
            Extremal::Largest,
            Accuracy::Vector,
            &[constant],
        )?;
        if !solved {
            warn!(n, "conjugate gradient missed its tolerance");
            return Err(PercolateError::not_computable(
                "conjugate gradient did not converge",
            ));
        }
        if !(pair.value.is_finite() && pair.value > 0.0) {
            return Err(PercolateError::not_computable(format!(
                "pseudo-inverse eigenvalue {} is not positive",
                pair.value
            )));
        }
        Ok((1.0 / pair.value, pair.vector))
    }

    fn sparse_largest(&self, adj: &Adjacency) -> Result<f64> {
        let n = adj.len();
        let pair = self.lanczos(n).extremal(
            n,
            |x, y| apply_laplacian(adj, x, y),
            Extremal::Largest,
            Accuracy::Value,
            &[],
        )?;
        Ok(pair.value)
    }
}

/// For disconnected input, a unit null vector of `L` orthogonal to the
/// constant vector: the centred indicator of the component holding the
/// first node. `None` when the graph is connected.
fn split_vector(adj: &Adjacency) -> Option<Vec<f64>> {
    let n = adj.len();
    let reached = bfs_distances(adj, 0);
    let inside = reached.iter().filter(|d| d.is_some()).count();
    if inside == n {
        return None;
    }
    let mean = inside as f64 / n as f64;
    let mut vector: Vec<f64> = reached
        .iter()
        .map(|d| if d.is_some() { 1.0 - mean } else { -mean })
        .collect();
    let length = vector.iter().map(|x| x * x).sum::<f64>().sqrt();
    vector.iter_mut().for_each(|x| *x /= length);
    Some(vector)
}

fn too_small(n: usize) -> PercolateError {
    PercolateError::not_computable(format!("graph has {} node(s), need at least 2", n))
}

fn laplacian_input(graph: &NetworkGraph) -> Result<Adjacency> {
    let n = graph.node_count();
    if n < 2 {
        return Err(too_small(n));
    }
    Ok(graph.adjacency(EdgeView::Undirected))
}

/// Eigenvalues only, ascending.
fn sorted_eigenvalues(adj: &Adjacency) -> Vec<f64> {
    let mut values: Vec<f64> = laplacian::combinatorial(adj)
        .symmetric_eigenvalues()
        .iter()
        .copied()
        .collect();
    values.sort_by(f64::total_cmp);
    values
}

fn ascending_order(eigen: &SymmetricEigen<f64, Dyn>) -> Vec<usize> {
    let values = &eigen.eigenvalues;
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    order
}

/// `λ₂` from an ascending spectrum, with round-off zeros clamped.
fn dense_lambda2(sorted: &[f64]) -> f64 {
    clamp_zero(sorted[1], sorted[sorted.len() - 1])
}

fn zero_tolerance(lambda_max: f64) -> f64 {
    1e-9 * lambda_max.abs().max(1.0)
}

/// Round-off below the zero tolerance (including tiny negatives) becomes 0.
fn clamp_zero(value: f64, lambda_max: f64) -> f64 {
    if value < zero_tolerance(lambda_max) {
        0.0
    } else {
        value
    }
}

/// `n · Σ 1/λ` over eigenvalues above the zero tolerance.
fn kirchhoff_from(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    let tol = zero_tolerance(sorted.last().copied().unwrap_or(0.0));
    let sum: f64 = sorted.iter().filter(|&&l| l > tol).map(|l| 1.0 / l).sum();
    n as f64 * sum
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// [`SpectralAnalyzer::algebraic_connectivity`] with default settings.
pub fn algebraic_connectivity(graph: &NetworkGraph) -> Result<f64> {
    SpectralAnalyzer::default().algebraic_connectivity(graph)
}

/// [`SpectralAnalyzer::fiedler_vector`] with default settings.
pub fn fiedler_vector(graph: &NetworkGraph) -> Result<Vec<(NodeId, f64)>> {
    SpectralAnalyzer::default().fiedler_vector(graph)
}

/// [`SpectralAnalyzer::spectral_gap_ratio`] with default settings.
pub fn spectral_gap_ratio(graph: &NetworkGraph) -> Result<f64> {
    SpectralAnalyzer::default().spectral_gap_ratio(graph)
}

/// [`SpectralAnalyzer::kirchhoff_index`] with default settings.
pub fn kirchhoff_index(graph: &NetworkGraph, max_n: usize) -> Result<f64> {
    SpectralAnalyzer::default().kirchhoff_index(graph, max_n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use percolate_core::generators::{complete_graph, cycle_graph, erdos_renyi_graph, path_graph};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol * b.abs().max(1.0)
    }

    #[test]
    fn complete_graph_connectivity_equals_n() {
        let lambda2 = algebraic_connectivity(&complete_graph(7)).unwrap();
        assert!(close(lambda2, 7.0, 1e-9));
        // All nonzero eigenvalues equal n, so the gap ratio is one.
        assert!(close(spectral_gap_ratio(&complete_graph(7)).unwrap(), 1.0, 1e-9));
    }

    #[test]
    fn tiny_graphs_are_not_computable() {
        let mut single = NetworkGraph::new_undirected();
        single.add_node(NodeId(0));
        for graph in [NetworkGraph::new_undirected(), single] {
            assert!(matches!(
                algebraic_connectivity(&graph),
                Err(PercolateError::NotComputable(_))
            ));
            assert!(matches!(fiedler_vector(&graph), Err(PercolateError::NotComputable(_))));
            assert!(matches!(
                kirchhoff_index(&graph, DEFAULT_KIRCHHOFF_MAX_N),
                Err(PercolateError::NotComputable(_))
            ));
        }
    }

    #[test]
    fn disconnected_graph_has_zero_connectivity_and_no_gap_ratio() {
        let mut graph = path_graph(3);
        graph.add_edge(NodeId(10), NodeId(11));
        assert_eq!(algebraic_connectivity(&graph).unwrap(), 0.0);
        assert!(matches!(
            spectral_gap_ratio(&graph),
            Err(PercolateError::NotComputable(_))
        ));
    }

    #[test]
    fn path_fiedler_vector_is_antisymmetric() {
        let vector = fiedler_vector(&path_graph(5)).unwrap();
        let values: Vec<f64> = vector.iter().map(|(_, v)| *v).collect();
        assert!(values[0] > 0.0);
        assert!(values[2].abs() < 1e-9);
        assert!(close(values[0], -values[4], 1e-9));
        assert!(close(values[1], -values[3], 1e-9));
        assert!(values[0].abs() > values[1].abs());
    }

    #[test]
    fn kirchhoff_of_cycle_matches_closed_form() {
        // Kf(C_n) = (n^3 - n) / 12
        let kf = kirchhoff_index(&cycle_graph(1000), DEFAULT_KIRCHHOFF_MAX_N).unwrap();
        assert!(close(kf, 83_333_250.0, 1e-6), "{}", kf);

        let small = kirchhoff_index(&cycle_graph(8), DEFAULT_KIRCHHOFF_MAX_N).unwrap();
        assert!(close(small, 42.0, 1e-9));
    }

    #[test]
    fn kirchhoff_refuses_graphs_above_the_guard() {
        let err = kirchhoff_index(&path_graph(1001), DEFAULT_KIRCHHOFF_MAX_N).unwrap_err();
        assert_eq!(
            err,
            PercolateError::TooLarge {
                nodes: 1001,
                max_nodes: 1000
            }
        );
        assert!(kirchhoff_index(&path_graph(5), 4).is_err());
    }

    #[test]
    fn sparse_path_agrees_with_dense() {
        let graph = erdos_renyi_graph(200, 0.1, &mut StdRng::seed_from_u64(5)).unwrap();
        let dense = SpectralAnalyzer::default();
        let sparse = SpectralAnalyzer::new(SpectralConfig {
            dense_max_nodes: 50,
            ..SpectralConfig::default()
        });

        let d2 = dense.algebraic_connectivity(&graph).unwrap();
        let s2 = sparse.algebraic_connectivity(&graph).unwrap();
        assert!(close(d2, s2, 1e-6), "dense {} sparse {}", d2, s2);

        let dn = dense.largest_eigenvalue(&graph).unwrap();
        let sn = sparse.largest_eigenvalue(&graph).unwrap();
        assert!(close(dn, sn, 1e-6), "dense {} sparse {}", dn, sn);

        let dr = dense.spectral_gap_ratio(&graph).unwrap();
        let sr = sparse.spectral_gap_ratio(&graph).unwrap();
        assert!(close(dr, sr, 1e-6), "dense {} sparse {}", dr, sr);
    }

    #[test]
    fn long_path_connectivity_matches_closed_form() {
        // λ₂(P_n) = 2 - 2cos(π/n) = 4 sin²(π/2n); the bottom of the spectrum
        // is tightly clustered, which a plain Krylov pass cannot resolve.
        let n = 1500;
        let exact = 4.0 * (std::f64::consts::PI / (2.0 * n as f64)).sin().powi(2);
        let lambda2 = algebraic_connectivity(&path_graph(n)).unwrap();
        assert!(
            ((lambda2 - exact) / exact).abs() < 1e-6,
            "sparse {} exact {}",
            lambda2,
            exact
        );
    }

    #[test]
    fn long_path_fiedler_vector_is_a_cosine() {
        // v_i ∝ cos(π (i + ½) / n)
        let n = 1200;
        let vector = fiedler_vector(&path_graph(n)).unwrap();
        let values: Vec<f64> = vector.iter().map(|(_, v)| *v).collect();
        let shape = |i: usize| (std::f64::consts::PI * (i as f64 + 0.5) / n as f64).cos();
        let scale = values[0] / shape(0);
        for i in [0, 1, 17, 300, 599, 600, 901, 1199] {
            assert!((values[i] - scale * shape(i)).abs() < 1e-7, "entry {}", i);
        }
    }

    #[test]
    fn large_disconnected_graph_is_answered_without_iteration() {
        let mut graph = path_graph(600);
        for i in 1000..1599 {
            graph.add_edge(NodeId(i), NodeId(i + 1));
        }
        assert_eq!(graph.node_count(), 1200);
        assert_eq!(algebraic_connectivity(&graph).unwrap(), 0.0);
        assert!(matches!(
            spectral_gap_ratio(&graph),
            Err(PercolateError::NotComputable(_))
        ));

        let summary = SpectralAnalyzer::default().summary(&graph, DEFAULT_KIRCHHOFF_MAX_N);
        assert_eq!(summary.algebraic_connectivity, Some(0.0));
        assert_eq!(summary.spectral_gap_ratio, None);
        assert_eq!(summary.kirchhoff_index, None);

        // A null vector orthogonal to the constant one.
        let vector = fiedler_vector(&graph).unwrap();
        let sum: f64 = vector.iter().map(|(_, v)| v).sum();
        assert!(sum.abs() < 1e-9);
        assert!(close(vector[0].1, vector[599].1, 1e-12));
        assert!(vector[0].1 * vector[600].1 < 0.0);
    }

    #[test]
    fn summary_matches_individual_calls() {
        let graph = cycle_graph(12);
        let summary = SpectralAnalyzer::default()
            .summary(&graph, DEFAULT_KIRCHHOFF_MAX_N);
        let lambda2 = algebraic_connectivity(&graph).unwrap();
        assert!(close(summary.algebraic_connectivity.unwrap(), lambda2, 1e-9));
        assert!(close(
            summary.spectral_gap_ratio.unwrap(),
            spectral_gap_ratio(&graph).unwrap(),
            1e-9
        ));
        assert!(close(summary.kirchhoff_index.unwrap(), (1728.0 - 12.0) / 12.0, 1e-9));

        let capped = SpectralAnalyzer::default().summary(&graph, 10);
        assert_eq!(capped.kirchhoff_index, None);
        assert!(capped.algebraic_connectivity.is_some());
    }

    #[test]
    fn summary_of_a_disconnected_graph_has_no_gap_ratio() {
        let mut graph = complete_graph(3);
        graph.add_edge(NodeId(7), NodeId(8));
        let summary = SpectralAnalyzer::default().summary(&graph, 1000);
        assert_eq!(summary.algebraic_connectivity, Some(0.0));
        assert_eq!(summary.spectral_gap_ratio, None);
        assert!(summary.kirchhoff_index.is_some());
    }
}
