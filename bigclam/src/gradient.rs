//! Partial derivatives of the approximate log-likelihood.
//!
//! # Gradient at one factor entry
//!
//! ```text
//! ∂/∂F[i,j] = -λ F[i,j]
//!             + Σ_{u ∈ N(i)}        F[u,j] / p(i,u)
//!             - Σ_{v ∉ N(i), v ≠ i} F[v,j] / (1 - q(i,v))
//!
//! p(i,u) = q(i,u) = 1 - exp(-F[i]·F[u])
//! ```
//!
//! Both denominators are floored at δ; every floor hit is counted.

use crate::factor_matrix::FactorMatrix;
use crate::graph::Graph;

/// One evaluated partial derivative
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Partial {
    pub value: f64,
    /// Number of denominators that had to be floored at δ
    pub clamped: usize,
}

/// Modeled probability of an edge given the affinity overlap `dot`,
/// `1 - exp(-dot)`.
#[inline]
pub fn edge_probability(dot: f64) -> f64 {
    -(-dot).exp_m1()
}

#[inline]
fn floored(x: f64, floor: f64, clamped: &mut usize) -> f64 {
    if x < floor || x.is_nan() {
        *clamped += 1;
        floor
    } else {
        x
    }
}

/// Dot products `F[i]·F[v]` for a fixed node `i` against every `v`.
///
/// While row `i` is being updated only `F[i]` changes, so a change of
/// `F[i,j]` by `delta` shifts each `F[i]·F[v]` (`v ≠ i`) by
/// `delta * F[v,j]`; this avoids re-running the k-length dot products.
pub struct RowDots {
    node: usize,
    values: Vec<f64>,
}

impl RowDots {
    pub fn new(factors: &FactorMatrix, node: usize) -> Self {
        let fi = factors.row(node);
        let values = (0..factors.nrows())
            .map(|v| fi.dot(&factors.row(v)))
            .collect();
        RowDots { node, values }
    }

    pub fn node(&self) -> usize {
        self.node
    }

    #[inline]
    pub fn get(&self, v: usize) -> f64 {
        self.values[v]
    }

    /// Account for `F[node, j] += delta`. The entry for `node` itself
    /// is not maintained.
    pub fn shift(&mut self, factors: &FactorMatrix, j: usize, delta: f64) {
        if delta == 0.0 {
            return;
        }
        for (v, d) in self.values.iter_mut().enumerate() {
            *d += delta * factors.get(v, j);
        }
    }
}

/// Evaluates partial derivatives of the regularized log-likelihood for
/// a fixed graph.
pub struct GradientEngine<'a> {
    graph: &'a Graph,
    lambda: f64,
    prob_floor: f64,
}

impl<'a> GradientEngine<'a> {
    /// * `graph` - observed graph
    /// * `lambda` - L2 regularization coefficient λ
    /// * `prob_floor` - floor δ for both denominators
    pub fn new(graph: &'a Graph, lambda: f64, prob_floor: f64) -> Self {
        GradientEngine {
            graph,
            lambda,
            prob_floor,
        }
    }

    pub fn graph(&self) -> &Graph {
        self.graph
    }

    /// Gradient at `F[i,j]`, evaluating every dot product afresh.
    /// O(n k).
    pub fn partial(&self, factors: &FactorMatrix, i: usize, j: usize) -> Partial {
        self.accumulate(factors, i, j, |v| factors.dot(i, v))
    }

    /// Gradient at `F[node,j]` reading overlaps from a row cache. O(n).
    pub fn partial_cached(&self, factors: &FactorMatrix, dots: &RowDots, j: usize) -> Partial {
        self.accumulate(factors, dots.node(), j, |v| dots.get(v))
    }

    /// Gradients at `F[i,0..k]` without touching the matrix
    pub fn row_partials(&self, factors: &FactorMatrix, i: usize) -> Vec<Partial> {
        let dots = RowDots::new(factors, i);
        (0..factors.ncols())
            .map(|j| self.partial_cached(factors, &dots, j))
            .collect()
    }

    fn accumulate<D>(&self, factors: &FactorMatrix, i: usize, j: usize, overlap: D) -> Partial
    where
        D: Fn(usize) -> f64,
    {
        let mut clamped = 0;
        let mut value = -self.lambda * factors.get(i, j);

        for &u in self.graph.neighbors(i) {
            let p = floored(edge_probability(overlap(u)), self.prob_floor, &mut clamped);
            value += factors.get(u, j) / p;
        }

        // 1 - q(i,v) = exp(-F[i]·F[v])
        for v in 0..self.graph.num_nodes() {
            if v == i || self.graph.is_neighbor(i, v) {
                continue;
            }
            let s = floored((-overlap(v)).exp(), self.prob_floor, &mut clamped);
            value -= factors.get(v, j) / s;
        }

        Partial { value, clamped }
    }
}
