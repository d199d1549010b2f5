//! Conjugate gradients for `L x = b` on a connected graph.
//!
//! The combinatorial Laplacian of a connected graph is singular only along
//! the constant vector, so on its orthogonal complement it is symmetric
//! positive definite and CG applies. Right-hand side, iterates and residual
//! are all kept centred; the solution is the pseudo-inverse applied to `b`.

use super::lanczos::apply_laplacian;
use percolate_core::graph::Adjacency;

#[derive(Debug, Clone)]
pub(crate) struct ConjugateGradient {
    /// Residual target relative to `‖b‖`.
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl ConjugateGradient {
    /// Solve into `x`. Returns false if the residual target was not reached.
    pub fn solve(&self, adj: &Adjacency, b: &[f64], x: &mut [f64]) -> bool {
        let n = b.len();
        x.iter_mut().for_each(|xi| *xi = 0.0);

        let mut r = b.to_vec();
        center(&mut r);
        let target = self.tolerance * dot(&r, &r).sqrt();
        if target == 0.0 {
            return true;
        }

        let mut p = r.clone();
        let mut ap = vec![0.0; n];
        let mut rr = dot(&r, &r);

        for _ in 0..self.max_iterations {
            apply_laplacian(adj, &p, &mut ap);
            let pap = dot(&p, &ap);
            if pap.is_nan() || pap <= 0.0 {
                return false;
            }
            let alpha = rr / pap;
            for i in 0..n {
                x[i] += alpha * p[i];
                r[i] -= alpha * ap[i];
            }
            center(&mut r);

            let rr_next = dot(&r, &r);
            if rr_next.sqrt() <= target {
                center(x);
                return true;
            }
            let beta = rr_next / rr;
            for i in 0..n {
                p[i] = r[i] + beta * p[i];
            }
            rr = rr_next;
        }
        center(x);
        false
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Subtract the mean, projecting out the constant vector.
fn center(v: &mut [f64]) {
    if v.is_empty() {
        return;
    }
    let mean = v.iter().sum::<f64>() / v.len() as f64;
    v.iter_mut().for_each(|x| *x -= mean);
}

#[cfg(test)]
mod tests {
    use super::*;
    use percolate_core::generators::{cycle_graph, path_graph};
    use percolate_core::graph::EdgeView;

    fn solver(n: usize) -> ConjugateGradient {
        ConjugateGradient {
            tolerance: 1e-12,
            max_iterations: 20 * n,
        }
    }

    #[test]
    fn solution_reproduces_the_right_hand_side() {
        let adj = cycle_graph(40).adjacency(EdgeView::Undirected);
        let mut b: Vec<f64> = (0..40).map(|i| ((i * 7) % 11) as f64).collect();
        center(&mut b);

        let mut x = vec![0.0; 40];
        assert!(solver(40).solve(&adj, &b, &mut x));

        let mut lx = vec![0.0; 40];
        apply_laplacian(&adj, &x, &mut lx);
        for (got, want) in lx.iter().zip(b.iter()) {
            assert!((got - want).abs() < 1e-9, "{} vs {}", got, want);
        }
        assert!(x.iter().sum::<f64>().abs() < 1e-9);
    }

    #[test]
    fn path_endpoint_difference_matches_resistance() {
        // Unit current in at one end and out at the other of P_n: the
        // potential drop equals the effective resistance n - 1.
        let n = 300;
        let adj = path_graph(n).adjacency(EdgeView::Undirected);
        let mut b = vec![0.0; n];
        b[0] = 1.0;
        b[n - 1] = -1.0;

        let mut x = vec![0.0; n];
        assert!(solver(n).solve(&adj, &b, &mut x));
        assert!((x[0] - x[n - 1] - (n - 1) as f64).abs() < 1e-6);
    }

    #[test]
    fn zero_right_hand_side_gives_zero() {
        let adj = path_graph(5).adjacency(EdgeView::Undirected);
        let mut x = vec![1.0; 5];
        assert!(solver(5).solve(&adj, &[2.0; 5], &mut x));
        assert!(x.iter().all(|&v| v == 0.0));
    }
}
