//! Candidate split enumeration over the weight simplex.
//!
//! Only the first N-1 coordinates are enumerated freely; the last weight is
//! the residual `1 - sum`, so every emitted vector sums to 1 by construction
//! and no valid split is lost to floating-point sum mismatch.

use crate::error::Error;
use crate::error::Result;

const ROUNDING: f64 = 1e5;
const SUM_TOLERANCE: f64 = 1e-9;

/// Round a weight to 5 decimals to keep the grid free of float drift.
pub(crate) fn round_weight(w: f64) -> f64 {
  (w * ROUNDING).round() / ROUNDING
}

/// Enumerates every admissible weight vector of `number_of_funds` entries on
/// a grid with step `granularity`. Pure function of its configuration: the
/// sequence is finite, deterministic, and restartable via [`Self::iter`].
#[derive(Clone, Copy, Debug)]
pub struct SplitEnumerator {
  number_of_funds: usize,
  granularity: f64,
}

impl SplitEnumerator {
  pub fn new(number_of_funds: usize, granularity: f64) -> Result<Self> {
    if number_of_funds < 1 {
      return Err(Error::configuration("number_of_funds must be at least 1"));
    }
    if !(granularity > 0.0 && granularity <= 1.0) {
      return Err(Error::configuration(format!(
        "split granularity must be in (0, 1], got {granularity}"
      )));
    }
    Ok(Self {
      number_of_funds,
      granularity,
    })
  }

  /// The weight grid: multiples of the granularity in `[0, 1]`.
  fn grid(&self) -> Vec<f64> {
    let steps = (1.0 / self.granularity).round() as usize;
    (0..=steps).map(|i| round_weight(self.granularity * i as f64)).collect()
  }

  /// Lazy lexicographic enumeration of admissible splits.
  pub fn iter(&self) -> SplitIter {
    SplitIter {
      grid: self.grid(),
      number_of_funds: self.number_of_funds,
      indices: vec![0; self.number_of_funds - 1],
      exhausted: false,
    }
  }
}

/// Iterator state: an odometer over the free coordinates, least-significant
/// digit last, which yields ascending lexicographic order.
#[derive(Clone, Debug)]
pub struct SplitIter {
  grid: Vec<f64>,
  number_of_funds: usize,
  indices: Vec<usize>,
  exhausted: bool,
}

impl SplitIter {
  fn advance(&mut self) {
    for position in (0..self.indices.len()).rev() {
      if self.indices[position] + 1 < self.grid.len() {
        self.indices[position] += 1;
        return;
      }
      self.indices[position] = 0;
    }
    self.exhausted = true;
  }
}

impl Iterator for SplitIter {
  type Item = Vec<f64>;

  fn next(&mut self) -> Option<Self::Item> {
    while !self.exhausted {
      let free: Vec<f64> = self.indices.iter().map(|&i| self.grid[i]).collect();
      let sum: f64 = free.iter().sum();

      if self.indices.is_empty() {
        self.exhausted = true;
      } else {
        self.advance();
      }

      if sum <= 1.0 + SUM_TOLERANCE {
        let mut split = Vec::with_capacity(self.number_of_funds);
        split.extend(free);
        split.push(round_weight(1.0 - sum).max(0.0));
        return Some(split);
      }
    }
    None
  }
}
