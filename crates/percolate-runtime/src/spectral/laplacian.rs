//! Laplacian matrices.
//!
//! All variants read edge weights. The combinatorial and symmetric
//! normalised Laplacians use the undirected view of the graph; the
//! random-walk variant follows edge direction.

use percolate_core::graph::{Adjacency, EdgeView, NetworkGraph};
use percolate_core::types::NodeId;
use nalgebra::{DMatrix, DVector};

const STATIONARY_MAX_ITER: usize = 10_000;
const STATIONARY_TOL: f64 = 1e-12;

/// Laplacian variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaplacianKind {
    /// `L = D - A`
    Combinatorial,
    /// `I - D^-1/2 A D^-1/2`
    SymmetricNormalized,
    /// Directed random-walk Laplacian `I - (Φ^1/2 P Φ^-1/2 + Φ^-1/2 Pᵀ Φ^1/2) / 2`.
    RandomWalk,
}

/// Build a Laplacian. Row `i` corresponds to the `i`-th returned node id.
pub fn laplacian_matrix(graph: &NetworkGraph, kind: LaplacianKind) -> (DMatrix<f64>, Vec<NodeId>) {
    match kind {
        LaplacianKind::Combinatorial => {
            let adj = graph.adjacency(EdgeView::Undirected);
            (combinatorial(&adj), adj.nodes().to_vec())
        }
        LaplacianKind::SymmetricNormalized => {
            let adj = graph.adjacency(EdgeView::Undirected);
            (symmetric_normalized(&adj), adj.nodes().to_vec())
        }
        LaplacianKind::RandomWalk => {
            let adj = graph.adjacency(EdgeView::Outgoing);
            (random_walk(&adj), adj.nodes().to_vec())
        }
    }
}

pub(crate) fn combinatorial(adj: &Adjacency) -> DMatrix<f64> {
    let n = adj.len();
    let mut laplacian = DMatrix::<f64>::zeros(n, n);
    for u in 0..n {
        laplacian[(u, u)] = adj.weighted_degree(u);
        for &(v, weight) in adj.neighbors(u) {
            laplacian[(u, v)] -= weight;
        }
    }
    laplacian
}

fn symmetric_normalized(adj: &Adjacency) -> DMatrix<f64> {
    let n = adj.len();
    let inv_sqrt: Vec<f64> = (0..n)
        .map(|u| {
            let d = adj.weighted_degree(u);
            if d > 0.0 { 1.0 / d.sqrt() } else { 0.0 }
        })
        .collect();

    let mut laplacian = DMatrix::<f64>::identity(n, n);
    for u in 0..n {
        for &(v, weight) in adj.neighbors(u) {
            laplacian[(u, v)] -= inv_sqrt[u] * weight * inv_sqrt[v];
        }
    }
    laplacian
}

fn random_walk(adj: &Adjacency) -> DMatrix<f64> {
    let n = adj.len();
    if n == 0 {
        return DMatrix::zeros(0, 0);
    }

    // Row-stochastic transition matrix; dangling nodes jump uniformly.
    let mut transition = DMatrix::<f64>::zeros(n, n);
    for u in 0..n {
        let out = adj.weighted_degree(u);
        if out > 0.0 {
            for &(v, weight) in adj.neighbors(u) {
                transition[(u, v)] += weight / out;
            }
        } else {
            for v in 0..n {
                transition[(u, v)] = 1.0 / n as f64;
            }
        }
    }

    let phi = stationary_distribution(&transition);
    let sqrt_phi: Vec<f64> = phi.iter().map(|p| p.sqrt()).collect();
    let inv_sqrt_phi: Vec<f64> = sqrt_phi
        .iter()
        .map(|&s| if s > 0.0 { 1.0 / s } else { 0.0 })
        .collect();

    let mut scaled = transition.clone();
    for u in 0..n {
        for v in 0..n {
            scaled[(u, v)] = sqrt_phi[u] * transition[(u, v)] * inv_sqrt_phi[v];
        }
    }
    let symmetric = (&scaled + scaled.transpose()) * 0.5;
    DMatrix::<f64>::identity(n, n) - symmetric
}

/// Power iteration on the lazy chain `(I + P) / 2`, which shares the
/// stationary distribution of `P` but is aperiodic.
fn stationary_distribution(transition: &DMatrix<f64>) -> DVector<f64> {
    let n = transition.nrows();
    let transposed = transition.transpose();
    let mut phi = DVector::<f64>::from_element(n, 1.0 / n as f64);

    for _ in 0..STATIONARY_MAX_ITER {
        let mut next = (&transposed * &phi + &phi) * 0.5;
        let total = next.sum();
        if total > 0.0 {
            next /= total;
        }
        let change = (&next - &phi).abs().sum();
        phi = next;
        if change < STATIONARY_TOL {
            break;
        }
    }
    phi
}
