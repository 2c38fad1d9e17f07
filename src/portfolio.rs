//! # Portfolio
//!
//! $$
//! S = \frac{\mathbb E[R_p - R_f]}{\sigma(R_p - R_f)}
//! $$
//!
//! A weighted combination of return series. End values compound each fund's
//! sub-investment independently and sum the results; dispersion statistics
//! are taken on the combined weighted stream so cross-fund covariance is
//! captured (a weighted sum of per-fund variances would miss it).

use std::sync::Arc;

use ndarray::Array2;
use statrs::statistics::Statistics;

use crate::error::Error;
use crate::error::Result;
use crate::series::ReturnSeries;
use crate::series::Window;
use crate::stats;

/// Tolerance on `|sum(weights) - 1|`; weight vectors come out of
/// floating-point enumeration, so exact equality would reject valid splits.
pub const WEIGHT_TOLERANCE: f64 = 1e-9;

/// A fixed allocation over shared, read-only return series.
#[derive(Clone, Debug)]
pub struct Portfolio {
  members: Vec<Arc<ReturnSeries>>,
  weights: Vec<f64>,
}

impl Portfolio {
  /// Build a portfolio, validating weight count and unit sum.
  pub fn new(members: Vec<Arc<ReturnSeries>>, weights: Vec<f64>) -> Result<Self> {
    if members.is_empty() {
      return Err(Error::configuration("portfolio needs at least one member"));
    }
    if members.len() != weights.len() {
      return Err(Error::configuration(format!(
        "{} members but {} weights",
        members.len(),
        weights.len()
      )));
    }

    let total: f64 = weights.iter().sum();
    if (total - 1.0).abs() > WEIGHT_TOLERANCE {
      return Err(Error::configuration(format!(
        "weights sum to {total}, expected 1"
      )));
    }

    Ok(Self { members, weights })
  }

  pub fn members(&self) -> &[Arc<ReturnSeries>] {
    &self.members
  }

  pub fn weights(&self) -> &[f64] {
    &self.weights
  }

  /// End value of investing `initial_investment` split by weight and holding
  /// over `window`. Each fund's share compounds on its own; the shares are
  /// summed at the end.
  pub fn value_at_end(&self, window: Window, initial_investment: f64) -> Result<f64> {
    let mut total = 0.0;
    for (weight, member) in self.weights.iter().zip(&self.members) {
      total += member.windowed_product(window, initial_investment * weight)?;
    }
    Ok(total)
  }

  /// The combined weighted factor stream over `window`. All members must
  /// expose the same date index there.
  fn combined_factors(&self, window: Window) -> Result<Vec<f64>> {
    let first = &self.members[0];
    let base = first.observations_in(window);
    if base.is_empty() {
      return Err(Error::EmptyWindow {
        entity_id: first.entity_id().to_string(),
        from: window.from,
        to: window.to,
      });
    }

    let mut combined: Vec<f64> = base.iter().map(|o| o.factor * self.weights[0]).collect();

    for (weight, member) in self.weights.iter().zip(&self.members).skip(1) {
      let obs = member.observations_in(window);
      if obs.len() != base.len() || obs.iter().zip(base).any(|(a, b)| a.date != b.date) {
        return Err(Error::MisalignedSeries {
          left: first.entity_id().to_string(),
          right: member.entity_id().to_string(),
        });
      }
      for (acc, o) in combined.iter_mut().zip(obs) {
        *acc += o.factor * weight;
      }
    }

    Ok(combined)
  }

  /// Sample standard deviation of the combined weighted stream.
  pub fn volatility(&self, window: Window) -> Result<f64> {
    let combined = self.combined_factors(window)?;
    if combined.len() < 2 {
      return Err(Error::EmptyWindow {
        entity_id: self.members[0].entity_id().to_string(),
        from: window.from,
        to: window.to,
      });
    }
    Ok(combined.iter().std_dev())
  }

  /// Mean of the combined weighted stream.
  pub fn average_return(&self, window: Window) -> Result<f64> {
    let combined = self.combined_factors(window)?;
    Ok(combined.iter().mean())
  }

  /// Sharpe ratio against `risk_free` over `window`.
  ///
  /// The excess stream is the combined stream minus the risk-free stream at
  /// matching dates; zero excess variance leaves the ratio undefined.
  pub fn sharpe_ratio(&self, risk_free: &ReturnSeries, window: Window) -> Result<f64> {
    let combined = self.combined_factors(window)?;
    if combined.len() < 2 {
      return Err(Error::EmptyWindow {
        entity_id: self.members[0].entity_id().to_string(),
        from: window.from,
        to: window.to,
      });
    }
    let rf = risk_free.observations_in(window);

    let base = self.members[0].observations_in(window);
    if rf.len() != base.len() || rf.iter().zip(base).any(|(a, b)| a.date != b.date) {
      return Err(Error::MisalignedSeries {
        left: self.members[0].entity_id().to_string(),
        right: risk_free.entity_id().to_string(),
      });
    }

    let excess: Vec<f64> = combined
      .iter()
      .zip(rf)
      .map(|(p, o)| p - o.factor)
      .collect();

    let std = excess.iter().std_dev();
    if std == 0.0 {
      return Err(Error::DivisionByZero);
    }

    Ok(excess.iter().mean() / std)
  }

  /// Correlation matrix of the members over `window`.
  pub fn correlation_matrix(&self, window: Window) -> Result<Array2<f64>> {
    let refs: Vec<&ReturnSeries> = self.members.iter().map(|m| m.as_ref()).collect();
    stats::correlation_matrix(&refs, window)
  }

  /// Off-diagonal correlation energy of the members over `window`.
  pub fn correlation_energy(&self, window: Window) -> Result<f64> {
    let refs: Vec<&ReturnSeries> = self.members.iter().map(|m| m.as_ref()).collect();
    stats::correlation_energy(&refs, window)
  }
}
