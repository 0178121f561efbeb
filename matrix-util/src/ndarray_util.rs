pub use ndarray::prelude::*;
pub use rand::Rng;
pub use rand_distr::Uniform;
pub use rayon::prelude::*;

use crate::traits::*;
use num_traits::{Float, FromPrimitive};

impl<T> SampleOps for ndarray::Array2<T>
where
    T: Float + FromPrimitive + Send,
{
    type Mat = Self;
    type Scalar = T;

    fn runif(nrow: usize, ncol: usize) -> anyhow::Result<Self::Mat> {
        let u01 = Uniform::new(0_f64, 1_f64)?;

        let mut rvec: Vec<T> = reserve_entries(nrow, ncol)?;
        rvec.par_extend(
            (0..(nrow * ncol))
                .into_par_iter()
                .map_init(rand::rng, |rng, _| {
                    T::from_f64(rng.sample(u01)).unwrap_or_else(T::zero)
                }),
        );

        Ok(Array2::from_shape_vec((nrow, ncol), rvec)?)
    }

    fn runif_with<R: Rng>(
        nrow: usize,
        ncol: usize,
        rng: &mut R,
    ) -> anyhow::Result<Self::Mat> {
        let u01 = Uniform::new(0_f64, 1_f64)?;

        let mut rvec: Vec<T> = reserve_entries(nrow, ncol)?;
        rvec.extend(
            (0..(nrow * ncol)).map(|_| T::from_f64(rng.sample(u01)).unwrap_or_else(T::zero)),
        );

        Ok(Array2::from_shape_vec((nrow, ncol), rvec)?)
    }
}

/// An empty vector with room for `nrow * ncol` entries, or an error
/// when that many cannot be allocated
fn reserve_entries<T>(nrow: usize, ncol: usize) -> anyhow::Result<Vec<T>> {
    let len = nrow
        .checked_mul(ncol)
        .ok_or_else(|| anyhow::anyhow!("{} x {} matrix is too large", nrow, ncol))?;
    let mut rvec = Vec::new();
    rvec.try_reserve_exact(len)
        .map_err(|e| anyhow::anyhow!("{} x {} matrix: {}", nrow, ncol, e))?;
    Ok(rvec)
}

impl<T> NonNegOps for ndarray::Array2<T>
where
    T: Float,
{
    type Scalar = T;

    fn project_nonneg_inplace(&mut self) -> usize {
        let mut moved = 0;
        self.mapv_inplace(|x| {
            if x < T::zero() {
                moved += 1;
                T::zero()
            } else {
                x
            }
        });
        moved
    }

    fn is_nonneg(&self) -> bool {
        self.iter().all(|&x| x >= T::zero())
    }

    fn all_finite(&self) -> bool {
        self.iter().all(|x| x.is_finite())
    }

    fn rows_above_per_column(&self, cutoff: T) -> Vec<Vec<usize>> {
        self.columns()
            .into_iter()
            .map(|col| {
                col.iter()
                    .enumerate()
                    .filter_map(|(i, &x)| if x > cutoff { Some(i) } else { None })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn runif_within_unit_interval() -> anyhow::Result<()> {
        let x = Array2::<f64>::runif(20, 3)?;
        assert_eq!(x.dim(), (20, 3));
        assert!(x.iter().all(|&v| (0.0..1.0).contains(&v)));
        Ok(())
    }

    #[test]
    fn runif_with_same_seed_same_matrix() -> anyhow::Result<()> {
        let a = Array2::<f64>::runif_with(5, 4, &mut StdRng::seed_from_u64(7))?;
        let b = Array2::<f64>::runif_with(5, 4, &mut StdRng::seed_from_u64(7))?;
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn runif_mean_near_half() -> anyhow::Result<()> {
        let x = Array2::<f64>::runif_with(200, 50, &mut StdRng::seed_from_u64(3))?;
        let mean = x.sum() / x.len() as f64;
        assert_abs_diff_eq!(mean, 0.5, epsilon = 0.02);
        Ok(())
    }

    #[test]
    fn oversized_shapes_are_errors() {
        assert!(Array2::<f64>::runif(usize::MAX / 2, 3).is_err());
        assert!(Array2::<f64>::runif_with(3, usize::MAX / 2, &mut StdRng::seed_from_u64(1)).is_err());
    }

    #[test]
    fn projection_counts_moves() {
        let mut x = array![[1.0, -0.5], [-2.0, 0.0]];
        assert!(!x.is_nonneg());
        assert_eq!(x.project_nonneg_inplace(), 2);
        assert!(x.is_nonneg());
        assert_abs_diff_eq!(x, array![[1.0, 0.0], [0.0, 0.0]]);
    }

    #[test]
    fn rows_above_cutoff_by_column() {
        let x = array![[2.0, 0.1], [0.5, 3.0], [1.5, 1.5]];
        let rows = x.rows_above_per_column(1.0);
        assert_eq!(rows, vec![vec![0, 2], vec![1, 2]]);
    }

    #[test]
    fn finiteness() {
        let mut x = array![[1.0, 2.0]];
        assert!(x.all_finite());
        x[[0, 1]] = f64::NAN;
        assert!(!x.all_finite());
    }
}
