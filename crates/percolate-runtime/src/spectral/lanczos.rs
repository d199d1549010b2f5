//! Thick-restart Lanczos for extremal eigenpairs of large symmetric operators.
//!
//! The operator is applied matrix-free, so memory stays linear in the number
//! of edges plus `krylov_dim` basis vectors. Every new basis vector is
//! reorthogonalised against the whole basis and against any deflated
//! vectors. When the basis is full and the wanted pair has not converged,
//! the best half of the Ritz vectors is kept and the iteration continues
//! from the last residual direction. Running out of operator applications
//! is an error, never a silently returned estimate.

use nalgebra::{DMatrix, SymmetricEigen};
use percolate_core::error::{PercolateError, Result};
use percolate_core::graph::Adjacency;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

const BREAKDOWN: f64 = 1e-12;
/// First convergence check within a cycle; later checks double the distance.
const FIRST_CHECK: usize = 8;

/// Which end of the spectrum to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Extremal {
    Smallest,
    Largest,
}

/// What has to be accurate before a Ritz pair is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Accuracy {
    /// Only the eigenvalue; accepted on the `r² / gap` bound.
    Value,
    /// The eigenvector as well; accepted on the residual norm.
    Vector,
}

/// An eigenpair that met the requested accuracy.
#[derive(Debug, Clone)]
pub(crate) struct RitzPair {
    pub value: f64,
    pub vector: Vec<f64>,
}

#[derive(Debug, Clone)]
pub(crate) struct Lanczos {
    pub krylov_dim: usize,
    pub tolerance: f64,
    pub seed: u64,
    /// Operator applications allowed across all restarts.
    pub max_iterations: usize,
}

impl Lanczos {
    /// Extremal eigenpair of a symmetric operator on `R^n`, restricted to
    /// the orthogonal complement of `deflate` (orthonormal vectors).
    pub fn extremal<F>(
        &self,
        n: usize,
        mut apply: F,
        which: Extremal,
        accuracy: Accuracy,
        deflate: &[Vec<f64>],
    ) -> Result<RitzPair>
    where
        F: FnMut(&[f64], &mut [f64]),
    {
        let free = n.saturating_sub(deflate.len());
        if free == 0 {
            return Err(PercolateError::not_computable(
                "no dimensions left after deflation",
            ));
        }
        let dim = self.krylov_dim.max(2).min(free);
        let keep = dim / 2;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut start: Vec<f64> = (0..n).map(|_| rng.gen::<f64>() - 0.5).collect();
        for d in deflate {
            orthogonalize(&mut start, d);
        }
        normalize(&mut start);

        let mut basis: Vec<Vec<f64>> = Vec::with_capacity(dim);
        basis.push(start);
        // Upper triangle holds v_iᵀ A v_j for i <= j.
        let mut projected = DMatrix::<f64>::zeros(dim, dim);
        let mut w = vec![0.0; n];
        let mut scale: f64 = 1.0;
        let mut cycle_step = 0;
        let mut next_check = FIRST_CHECK;
        let mut restarts = 0;

        for iteration in 1..=self.max_iterations {
            let j = basis.len() - 1;
            apply(&basis[j], &mut w);

            // Full reorthogonalisation, applied twice.
            for _ in 0..2 {
                for d in deflate {
                    orthogonalize(&mut w, d);
                }
                for (i, v) in basis.iter().enumerate() {
                    projected[(i, j)] += orthogonalize(&mut w, v);
                }
            }
            let b = norm(&w);
            scale = scale.max(projected[(j, j)].abs()).max(b);

            let k = j + 1;
            cycle_step += 1;
            let spans_everything = k == free;
            let breakdown = b <= BREAKDOWN * scale;
            let full = k == dim;

            if full || breakdown || spans_everything || cycle_step == next_check {
                let ritz = RitzValues::of(&projected, k, which);
                let s = ritz.vector(0);
                let theta = ritz.value(0);
                let residual = b * s[k - 1].abs();
                let bound = match accuracy {
                    Accuracy::Vector => residual,
                    Accuracy::Value => residual.min(residual * residual / ritz.gap()),
                };

                if breakdown || spans_everything || bound <= self.tolerance * theta.abs().max(1.0) {
                    debug!(n, iterations = iteration, restarts, value = theta, "lanczos converged");
                    return Ok(RitzPair {
                        value: theta,
                        vector: combine(&basis, &s, n),
                    });
                }
                next_check *= 2;

                if full {
                    let mut kept: Vec<Vec<f64>> = (0..keep)
                        .map(|r| combine(&basis, &ritz.vector(r), n))
                        .collect();
                    kept.push(w.iter().map(|x| x / b).collect());
                    basis = kept;

                    projected.fill(0.0);
                    for r in 0..keep {
                        projected[(r, r)] = ritz.value(r);
                    }
                    cycle_step = 0;
                    next_check = FIRST_CHECK;
                    restarts += 1;
                    continue;
                }
            }

            basis.push(w.iter().map(|x| x / b).collect());
        }

        warn!(n, krylov_dim = dim, max_iterations = self.max_iterations, "lanczos did not converge");
        Err(PercolateError::not_computable(format!(
            "lanczos did not converge within {} operator applications",
            self.max_iterations
        )))
    }
}

/// Eigen-decomposition of the projected matrix, ordered from the wanted end.
struct RitzValues {
    eigen: SymmetricEigen<f64, nalgebra::Dyn>,
    order: Vec<usize>,
}

impl RitzValues {
    fn of(projected: &DMatrix<f64>, k: usize, which: Extremal) -> Self {
        let t = DMatrix::from_fn(k, k, |r, c| {
            if r <= c {
                projected[(r, c)]
            } else {
                projected[(c, r)]
            }
        });
        let eigen = SymmetricEigen::new(t);
        let values = &eigen.eigenvalues;
        let mut order: Vec<usize> = (0..k).collect();
        order.sort_by(|&a, &b| match which {
            Extremal::Smallest => values[a].total_cmp(&values[b]),
            Extremal::Largest => values[b].total_cmp(&values[a]),
        });
        Self { eigen, order }
    }

    fn value(&self, rank: usize) -> f64 {
        self.eigen.eigenvalues[self.order[rank]]
    }

    fn vector(&self, rank: usize) -> Vec<f64> {
        self.eigen.eigenvectors.column(self.order[rank]).iter().copied().collect()
    }

    /// Distance from the wanted value to the next Ritz value.
    fn gap(&self) -> f64 {
        if self.order.len() < 2 {
            return f64::INFINITY;
        }
        (self.value(0) - self.value(1)).abs().max(f64::MIN_POSITIVE)
    }
}

/// `Σ coefficients[i] · basis[i]`, normalised.
fn combine(basis: &[Vec<f64>], coefficients: &[f64], n: usize) -> Vec<f64> {
    let mut vector = vec![0.0; n];
    for (v, &c) in basis.iter().zip(coefficients.iter()) {
        for (x, &vi) in vector.iter_mut().zip(v.iter()) {
            *x += c * vi;
        }
    }
    normalize(&mut vector);
    vector
}

/// `y = L x` for the weighted combinatorial Laplacian of `adj`.
pub(crate) fn apply_laplacian(adj: &Adjacency, x: &[f64], y: &mut [f64]) {
    for (i, out) in y.iter_mut().enumerate() {
        let mut acc = adj.weighted_degree(i) * x[i];
        for &(j, weight) in adj.neighbors(i) {
            acc -= weight * x[j];
        }
        *out = acc;
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

fn normalize(v: &mut [f64]) {
    let length = norm(v);
    if length > BREAKDOWN {
        for x in v.iter_mut() {
            *x /= length;
        }
    }
}

/// Remove the component of `v` along the unit vector `u`; returns it.
fn orthogonalize(v: &mut [f64], u: &[f64]) -> f64 {
    let projection = dot(v, u);
    for (x, &ui) in v.iter_mut().zip(u.iter()) {
        *x -= projection * ui;
    }
    projection
}

#[cfg(test)]
mod tests {
    use super::*;
    use percolate_core::generators::path_graph;
    use percolate_core::graph::EdgeView;

    fn diagonal_operator(diag: Vec<f64>) -> impl FnMut(&[f64], &mut [f64]) {
        move |x, y| {
            for i in 0..x.len() {
                y[i] = diag[i] * x[i];
            }
        }
    }

    fn solver(krylov_dim: usize) -> Lanczos {
        Lanczos {
            krylov_dim,
            tolerance: 1e-10,
            seed: 17,
            max_iterations: 5_000,
        }
    }

    #[test]
    fn finds_both_ends_of_a_diagonal_spectrum() {
        let diag: Vec<f64> = (1..=40).map(|i| i as f64).collect();
        let largest = solver(50)
            .extremal(40, diagonal_operator(diag.clone()), Extremal::Largest, Accuracy::Vector, &[])
            .unwrap();
        let smallest = solver(50)
            .extremal(40, diagonal_operator(diag), Extremal::Smallest, Accuracy::Vector, &[])
            .unwrap();

        assert!((largest.value - 40.0).abs() < 1e-8);
        assert!((smallest.value - 1.0).abs() < 1e-8);
        assert!(largest.vector[39].abs() > 0.999);
    }

    #[test]
    fn deflation_skips_the_known_vector() {
        let diag: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let mut e0 = vec![0.0; 20];
        e0[0] = 1.0;
        let pair = solver(50)
            .extremal(20, diagonal_operator(diag), Extremal::Smallest, Accuracy::Vector, &[e0])
            .unwrap();

        assert!((pair.value - 1.0).abs() < 1e-8);
        assert!(pair.vector[0].abs() < 1e-8);
    }

    #[test]
    fn restarts_until_a_small_basis_converges() {
        let mut diag: Vec<f64> = (0..400).map(|i| i as f64 / 4.0).collect();
        diag[123] = 150.0;
        let pair = solver(10)
            .extremal(400, diagonal_operator(diag), Extremal::Largest, Accuracy::Vector, &[])
            .unwrap();
        assert!((pair.value - 150.0).abs() < 1e-8, "{}", pair.value);
        assert!(pair.vector[123].abs() > 0.999);
    }

    #[test]
    fn exhausted_budget_is_an_error() {
        let adj = path_graph(600).adjacency(EdgeView::Undirected);
        let lanczos = Lanczos {
            krylov_dim: 4,
            tolerance: 1e-14,
            seed: 1,
            max_iterations: 12,
        };
        let result = lanczos.extremal(
            600,
            |x, y| apply_laplacian(&adj, x, y),
            Extremal::Largest,
            Accuracy::Vector,
            &[],
        );
        assert!(matches!(result, Err(PercolateError::NotComputable(_))));
    }
}
