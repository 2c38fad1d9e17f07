//! Driver for the allocation search.
//!
//! Ranks the candidate funds, narrows every selected series to the search
//! window exactly once, then evaluates each admissible split in parallel.
//! The per-split work is read-only over pre-warmed shared series, so the
//! rayon pass needs no locking beyond the series' own product cache.

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;
use tracing::info;

use super::hull::convex_hull;
use super::splits::SplitEnumerator;
use super::EvaluatedSplit;
use crate::config::PortfolioParams;
use crate::error::Error;
use crate::error::Result;
use crate::portfolio::Portfolio;
use crate::series::ReturnSeries;
use crate::series::Window;

/// Every evaluated split for one run, plus the selected fund order.
#[derive(Clone, Debug)]
pub struct PointCloud {
  /// Entity ids of the selected funds, ranked by end value descending.
  pub fund_ids: Vec<String>,
  /// One entry per admissible split, in enumeration order.
  pub evaluations: Vec<EvaluatedSplit>,
}

/// A reduced point cloud: hull subsets and the best-Sharpe pick.
#[derive(Clone, Debug)]
pub struct FrontierResult {
  pub cloud: PointCloud,
  /// Hull vertex indices over (volatility, average_return).
  pub average_return_hull: Vec<usize>,
  /// Hull vertex indices over (volatility, value_at_end).
  pub end_value_hull: Vec<usize>,
  /// Index into `cloud.evaluations` of the best-Sharpe hull vertex.
  pub best_index: usize,
}

impl FrontierResult {
  /// The recommended allocation.
  pub fn best(&self) -> &EvaluatedSplit {
    &self.cloud.evaluations[self.best_index]
  }
}

/// One-shot exhaustive search over the configured split grid.
#[derive(Clone, Debug)]
pub struct FrontierSearch {
  params: PortfolioParams,
}

impl FrontierSearch {
  pub fn new(params: PortfolioParams) -> Result<Self> {
    params.validate()?;
    Ok(Self { params })
  }

  pub fn params(&self) -> &PortfolioParams {
    &self.params
  }

  /// Evaluate every admissible split. See [`Self::evaluate_with_progress`].
  pub fn evaluate(
    &self,
    funds: Vec<ReturnSeries>,
    risk_free: ReturnSeries,
  ) -> Result<PointCloud> {
    self.evaluate_with_progress(funds, risk_free, |_, _| {})
  }

  /// Evaluate every admissible split, reporting `(done, total)` after each.
  ///
  /// The batch is bounded and has no cancellation; the callback is invoked
  /// from worker threads in completion order.
  pub fn evaluate_with_progress(
    &self,
    mut funds: Vec<ReturnSeries>,
    mut risk_free: ReturnSeries,
    progress: impl Fn(usize, usize) + Sync,
  ) -> Result<PointCloud> {
    let window = Window::new(self.params.from_date, self.params.to_date)?;

    if funds.len() < self.params.number_of_funds {
      return Err(Error::configuration(format!(
        "requested {} funds but only {} are available",
        self.params.number_of_funds,
        funds.len()
      )));
    }

    // rank by end value descending, ties broken by id for reproducibility
    let mut ranked: Vec<(f64, ReturnSeries)> = funds
      .drain(..)
      .map(|ts| Ok((ts.windowed_product(window, 1.0)?, ts)))
      .collect::<Result<_>>()?;
    ranked.sort_by(|a, b| {
      b.0
        .total_cmp(&a.0)
        .then_with(|| a.1.entity_id().cmp(b.1.entity_id()))
    });
    ranked.truncate(self.params.number_of_funds);

    // one-time narrowing, then pre-warm the product cache so the parallel
    // pass only ever reads it
    risk_free.restrict(window)?;
    risk_free.windowed_product(window, 1.0)?;

    let mut members = Vec::with_capacity(ranked.len());
    for (_, mut ts) in ranked {
      ts.restrict(window)?;
      ts.windowed_product(window, 1.0)?;
      debug!(entity_id = ts.entity_id(), "selected fund");
      members.push(Arc::new(ts));
    }

    let fund_ids: Vec<String> = members
      .iter()
      .map(|ts| ts.entity_id().to_string())
      .collect();

    let enumerator =
      SplitEnumerator::new(self.params.number_of_funds, self.params.split_granularity)?;
    let splits: Vec<Vec<f64>> = enumerator.iter().collect();
    let total = splits.len();

    info!(
      funds = fund_ids.len(),
      splits = total,
      "evaluating candidate splits"
    );

    let done = AtomicUsize::new(0);
    let evaluations: Vec<EvaluatedSplit> = splits
      .into_par_iter()
      .map(|split| {
        let portfolio = Portfolio::new(members.clone(), split.clone())?;

        let evaluated = EvaluatedSplit {
          volatility: portfolio.volatility(window)?,
          average_return: portfolio.average_return(window)?,
          value_at_end: portfolio.value_at_end(window, 1.0)?,
          sharpe_ratio: portfolio.sharpe_ratio(&risk_free, window)?,
          split,
        };

        progress(done.fetch_add(1, Ordering::Relaxed) + 1, total);
        Ok(evaluated)
      })
      .collect::<Result<_>>()?;

    Ok(PointCloud {
      fund_ids,
      evaluations,
    })
  }

  /// Full pipeline: evaluate, reduce to hulls, pick the best-Sharpe vertex.
  pub fn run(&self, funds: Vec<ReturnSeries>, risk_free: ReturnSeries) -> Result<FrontierResult> {
    let cloud = self.evaluate(funds, risk_free)?;
    extract_frontier(cloud)
  }
}

/// Reduce an evaluated cloud to its hull subsets and best-Sharpe vertex.
///
/// Kept separate from [`FrontierSearch::run`] so a caller can still report
/// the full cloud when hull extraction fails on degenerate data.
pub fn extract_frontier(cloud: PointCloud) -> Result<FrontierResult> {
  let average_points: Vec<(f64, f64)> = cloud
    .evaluations
    .iter()
    .map(|e| (e.volatility, e.average_return))
    .collect();
  let end_points: Vec<(f64, f64)> = cloud
    .evaluations
    .iter()
    .map(|e| (e.volatility, e.value_at_end))
    .collect();

  let average_return_hull = convex_hull(&average_points)?;
  let end_value_hull = convex_hull(&end_points)?;

  let best_index = average_return_hull
    .iter()
    .copied()
    .max_by(|&a, &b| {
      cloud.evaluations[a]
        .sharpe_ratio
        .total_cmp(&cloud.evaluations[b].sharpe_ratio)
    })
    .ok_or(Error::InsufficientData { points: 0 })?;

  info!(
    sharpe_ratio = cloud.evaluations[best_index].sharpe_ratio,
    volatility = cloud.evaluations[best_index].volatility,
    "selected best allocation"
  );

  Ok(FrontierResult {
    cloud,
    average_return_hull,
    end_value_hull,
    best_index,
  })
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::extract_frontier;
  use super::FrontierSearch;
  use super::PointCloud;
  use crate::config::PortfolioParams;
  use crate::error::Error;
  use crate::frontier::EvaluatedSplit;
  use crate::series::Observation;
  use crate::series::ReturnSeries;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn daily_series(id: &str, factors: &[f64]) -> ReturnSeries {
    let observations = factors
      .iter()
      .enumerate()
      .map(|(i, &factor)| Observation {
        date: date(2020, 1, 1 + i as u32),
        factor,
      })
      .collect();
    ReturnSeries::new(id, observations).unwrap()
  }

  fn params(number_of_funds: usize, granularity: f64) -> PortfolioParams {
    PortfolioParams {
      number_of_funds,
      from_date: date(2020, 1, 1),
      to_date: date(2020, 1, 6),
      split_granularity: granularity,
    }
  }

  fn sample_funds() -> Vec<ReturnSeries> {
    vec![
      daily_series("growth", &[1.03, 1.05, 0.99, 1.04, 1.02, 1.03]),
      daily_series("steady", &[1.01, 1.01, 1.02, 1.01, 1.01, 1.02]),
      daily_series("laggard", &[1.00, 0.99, 1.00, 1.01, 0.99, 1.00]),
    ]
  }

  fn risk_free() -> ReturnSeries {
    daily_series("cdi", &[1.002, 1.002, 1.003, 1.002, 1.002, 1.003])
  }

  #[test]
  fn selects_the_top_ranked_funds() {
    let search = FrontierSearch::new(params(2, 0.5)).unwrap();
    let cloud = search.evaluate(sample_funds(), risk_free()).unwrap();

    // "laggard" compounds below the other two and must not be selected
    assert_eq!(cloud.fund_ids, vec!["growth", "steady"]);
    // N=2, g=0.5 enumerates exactly three splits
    assert_eq!(cloud.evaluations.len(), 3);
  }

  #[test]
  fn requesting_more_funds_than_available_fails() {
    let search = FrontierSearch::new(params(5, 0.5)).unwrap();
    assert!(matches!(
      search.evaluate(sample_funds(), risk_free()),
      Err(Error::Configuration(_))
    ));
  }

  #[test]
  fn run_reduces_to_hulls_and_picks_a_best_vertex() {
    let search = FrontierSearch::new(params(2, 0.25)).unwrap();
    let result = search.run(sample_funds(), risk_free()).unwrap();

    assert_eq!(result.cloud.evaluations.len(), 5);
    assert!(result
      .average_return_hull
      .iter()
      .all(|&i| i < result.cloud.evaluations.len()));
    assert!(result.average_return_hull.contains(&result.best_index));

    let best = result.best();
    assert_eq!(best.split.len(), 2);
    assert!(best.sharpe_ratio.is_finite());
  }

  #[test]
  fn progress_reports_every_split() {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    let search = FrontierSearch::new(params(2, 0.25)).unwrap();
    let calls = AtomicUsize::new(0);

    search
      .evaluate_with_progress(sample_funds(), risk_free(), |_, total| {
        assert_eq!(total, 5);
        calls.fetch_add(1, Ordering::Relaxed);
      })
      .unwrap();

    assert_eq!(calls.load(Ordering::Relaxed), 5);
  }

  #[test]
  fn best_sharpe_selection_ignores_non_hull_points() {
    // a dominated interior point with an absurdly high Sharpe ratio must
    // still lose: only hull vertices are eligible
    let mk = |volatility: f64, average_return: f64, sharpe_ratio: f64| EvaluatedSplit {
      split: vec![1.0],
      volatility,
      average_return,
      value_at_end: average_return,
      sharpe_ratio,
    };

    let cloud = PointCloud {
      fund_ids: vec!["only".to_string()],
      evaluations: vec![
        mk(0.1, 0.1, 0.5),
        mk(0.9, 0.05, 0.1),
        mk(0.5, 0.2, 100.0), // interior
        mk(0.9, 1.0, 0.9),
        mk(0.1, 0.9, 1.2),
      ],
    };

    let result = extract_frontier(cloud).unwrap();
    assert_ne!(result.best_index, 2);
    assert_eq!(result.best_index, 4);
  }

  #[test]
  fn degenerate_cloud_fails_hull_extraction_but_keeps_the_cloud_path() {
    let mk = |volatility: f64| EvaluatedSplit {
      split: vec![1.0],
      volatility,
      average_return: 1.0,
      value_at_end: 1.0,
      sharpe_ratio: 0.0,
    };

    let cloud = PointCloud {
      fund_ids: vec!["only".to_string()],
      evaluations: vec![mk(0.1), mk(0.1)],
    };

    assert!(matches!(
      extract_frontier(cloud),
      Err(Error::InsufficientData { .. })
    ));
  }
}
