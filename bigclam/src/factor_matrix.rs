//! Nonnegative n×k matrix of node-community affinities.

use crate::error::{ClamError, Result};
use matrix_util::traits::{NonNegOps, SampleOps};
use ndarray::{Array2, ArrayView1};
use rand::Rng;

/// Row `i` is the affinity vector of node `i` over the `k`
/// communities. Every entry stays `>= 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorMatrix {
    values: Array2<f64>,
}

impl FactorMatrix {
    /// Every entry drawn independently from `U[0,1)` with the
    /// thread-local generator
    pub fn random_unseeded(n: usize, k: usize) -> Result<Self> {
        check_dims(n, k)?;
        let values = Array2::<f64>::runif(n, k)
            .map_err(|e| ClamError::InvalidConfiguration(e.to_string()))?;
        Ok(Self { values })
    }

    /// Every entry drawn independently from `U[0,1)`, reproducible
    /// for a seeded `rng`
    pub fn random<R: Rng>(n: usize, k: usize, rng: &mut R) -> Result<Self> {
        check_dims(n, k)?;
        let values = Array2::<f64>::runif_with(n, k, rng)
            .map_err(|e| ClamError::InvalidConfiguration(e.to_string()))?;
        Ok(Self { values })
    }

    /// Warm start from an existing matrix; entries must be finite and
    /// nonnegative.
    pub fn from_array(values: Array2<f64>) -> Result<Self> {
        let (n, k) = values.dim();
        check_dims(n, k)?;
        if !values.all_finite() {
            return Err(ClamError::InvalidConfiguration(
                "initial factors contain non-finite values".into(),
            ));
        }
        if !values.is_nonneg() {
            return Err(ClamError::InvalidConfiguration(
                "initial factors contain negative values".into(),
            ));
        }
        Ok(Self { values })
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[[i, j]]
    }

    /// Store `max(value, 0)`. A `NaN` also ends up as zero, so callers
    /// that care must check finiteness first.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.values[[i, j]] = value.max(0.0);
    }

    /// Affinity vector of node `i`
    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.values.row(i)
    }

    /// `F[i] · F[u]`
    #[inline]
    pub fn dot(&self, i: usize, u: usize) -> f64 {
        self.values.row(i).dot(&self.values.row(u))
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn into_array(self) -> Array2<f64> {
        self.values
    }

    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// Swap in a whole new matrix of the same shape, projected onto
    /// the nonnegative orthant; returns how many entries were moved
    pub(crate) fn replace_projected(&mut self, mut values: Array2<f64>) -> usize {
        debug_assert_eq!(values.dim(), self.values.dim());
        let moved = values.project_nonneg_inplace();
        self.values = values;
        moved
    }
}

fn check_dims(n: usize, k: usize) -> Result<()> {
    if n == 0 {
        return Err(ClamError::InvalidGraph(
            "number of nodes must be positive".into(),
        ));
    }
    if k == 0 {
        return Err(ClamError::InvalidConfiguration(
            "number of communities must be at least 1".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn random_init_in_unit_interval() -> anyhow::Result<()> {
        let mut rng = StdRng::seed_from_u64(42);
        let f = FactorMatrix::random(30, 4, &mut rng)?;
        assert_eq!((f.nrows(), f.ncols()), (30, 4));
        assert!(f.as_array().iter().all(|&x| (0.0..1.0).contains(&x)));

        let g = FactorMatrix::random_unseeded(7, 2)?;
        assert_eq!((g.nrows(), g.ncols()), (7, 2));
        assert!(g.as_array().iter().all(|&x| (0.0..1.0).contains(&x)));
        Ok(())
    }

    #[test]
    fn replace_projected_counts_negatives() -> anyhow::Result<()> {
        let mut f = FactorMatrix::from_array(array![[0.5, 0.2], [0.1, 0.1]])?;
        let moved = f.replace_projected(array![[-1.0, 0.3], [0.0, -0.2]]);
        assert_eq!(moved, 2);
        assert_eq!(f.as_array(), &array![[0.0, 0.3], [0.0, 0.0]]);
        Ok(())
    }

    #[test]
    fn set_projects_onto_nonnegative_orthant() -> anyhow::Result<()> {
        let mut f = FactorMatrix::from_array(array![[0.5, 0.2]])?;
        f.set(0, 0, -3.0);
        f.set(0, 1, 1.5);
        assert_eq!(f.get(0, 0), 0.0);
        assert_eq!(f.get(0, 1), 1.5);
        f.set(0, 1, f64::NAN);
        assert_eq!(f.get(0, 1), 0.0);
        Ok(())
    }

    #[test]
    fn dot_of_rows() -> anyhow::Result<()> {
        let f = FactorMatrix::from_array(array![[1.0, 2.0], [3.0, 0.5]])?;
        assert_abs_diff_eq!(f.dot(0, 1), 4.0, epsilon = 1e-12);
        assert_eq!(f.row(1).to_vec(), vec![3.0, 0.5]);
        assert_eq!(f.max_value(), 3.0);
        Ok(())
    }

    #[test]
    fn rejects_degenerate_shapes_and_values() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            FactorMatrix::random(3, 0, &mut rng),
            Err(ClamError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            FactorMatrix::random(4, usize::MAX / 2, &mut rng),
            Err(ClamError::InvalidConfiguration(_))
        ));
        assert!(FactorMatrix::from_array(array![[1.0, -0.1]]).is_err());
        assert!(FactorMatrix::from_array(array![[f64::INFINITY]]).is_err());
    }
}
