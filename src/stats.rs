//! # Series Statistics
//!
//! $$
//! E = \sqrt{\tfrac{1}{2}\left(\sum_{i,j}\rho_{ij}^2 - \sum_i \rho_{ii}^2\right)}
//! $$
//!
//! Cross-series correlation structure: pairwise Pearson matrices and a scalar
//! off-diagonal energy that summarizes how much redundant risk a set of
//! series carries.

use ndarray::Array2;

use crate::error::Result;
use crate::series::ReturnSeries;
use crate::series::Window;

/// Pairwise Pearson correlation matrix over `window`.
///
/// Symmetric by construction with a unit diagonal; each off-diagonal entry
/// comes from [`ReturnSeries::pairwise_correlation`], so date alignment is
/// handled per pair.
pub fn correlation_matrix(series: &[&ReturnSeries], window: Window) -> Result<Array2<f64>> {
  let n = series.len();
  let mut corr = Array2::from_elem((n, n), 1.0);

  for i in 0..n {
    for j in (i + 1)..n {
      let r = series[i].pairwise_correlation(series[j], window)?;
      corr[(i, j)] = r;
      corr[(j, i)] = r;
    }
  }

  Ok(corr)
}

/// Scalar off-diagonal energy of the correlation matrix.
///
/// Near 0 means the series are largely uncorrelated; larger values mean more
/// redundant risk. The division by two folds the symmetric halves together.
pub fn correlation_energy(series: &[&ReturnSeries], window: Window) -> Result<f64> {
  let corr = correlation_matrix(series, window)?;

  let full: f64 = corr.iter().map(|x| x * x).sum();
  let diagonal: f64 = corr.diag().iter().map(|x| x * x).sum();

  Ok(((full - diagonal) / 2.0).sqrt())
}
