use rand::Rng;

/// Operations to sample random matrices, only works for
/// `ndarray::Array2`
pub trait SampleOps {
    type Mat;
    type Scalar;

    /// Sample a matrix from a uniform distribution `U[0,1)` using the
    /// thread-local generator
    fn runif(nrow: usize, ncol: usize) -> anyhow::Result<Self::Mat>;

    /// Sample a matrix from a uniform distribution `U[0,1)` drawing
    /// entries in row-major order from `rng`, so that a fixed seed
    /// always yields the same matrix
    fn runif_with<R: Rng>(nrow: usize, ncol: usize, rng: &mut R)
        -> anyhow::Result<Self::Mat>;
}

/// Nonnegative-orthant operations
pub trait NonNegOps {
    type Scalar;

    /// `x[i,j] <- max(x[i,j], 0)`; returns the number of entries
    /// that were moved
    fn project_nonneg_inplace(&mut self) -> usize;

    /// every entry is `>= 0`
    fn is_nonneg(&self) -> bool;

    /// no `NaN` or infinity anywhere
    fn all_finite(&self) -> bool;

    /// For each column `j`, the rows `i` with `x[i,j] > cutoff`, in
    /// ascending row order
    fn rows_above_per_column(&self, cutoff: Self::Scalar) -> Vec<Vec<usize>>;
}
