//! Records handed to the reporting collaborator.
//!
//! The engine does not render anything itself; it emits `(x, y, label)`
//! scatter triples for the full cloud and each hull subset, plus one
//! JSON-ready best-allocation document.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::frontier::EvaluatedSplit;
use crate::frontier::FrontierResult;

/// Which return metric a scatter series plots on the y axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReturnMetric {
  /// Mean of the combined weighted stream.
  Average,
  /// End value of a unit investment.
  EndValue,
}

impl ReturnMetric {
  fn of(&self, evaluated: &EvaluatedSplit) -> f64 {
    match self {
      Self::Average => evaluated.average_return,
      Self::EndValue => evaluated.value_at_end,
    }
  }
}

/// One `(volatility, return, label)` triple for the reporting collaborator.
#[derive(Clone, Debug, Serialize)]
pub struct ScatterPoint {
  pub volatility: f64,
  pub return_metric: f64,
  /// The split vector rendered as text, used for hover labels.
  pub label: String,
}

fn split_label(split: &[f64]) -> String {
  let rendered: Vec<String> = split.iter().map(f64::to_string).collect();
  format!("[{}]", rendered.join(", "))
}

/// Scatter triples for every evaluated split.
pub fn scatter_points(evaluations: &[EvaluatedSplit], metric: ReturnMetric) -> Vec<ScatterPoint> {
  evaluations
    .iter()
    .map(|e| ScatterPoint {
      volatility: e.volatility,
      return_metric: metric.of(e),
      label: split_label(&e.split),
    })
    .collect()
}

/// Scatter triples for a hull subset, `indices` into `evaluations`.
pub fn hull_scatter_points(
  evaluations: &[EvaluatedSplit],
  indices: &[usize],
  metric: ReturnMetric,
) -> Vec<ScatterPoint> {
  indices
    .iter()
    .map(|&i| {
      let e = &evaluations[i];
      ScatterPoint {
        volatility: e.volatility,
        return_metric: metric.of(e),
        label: split_label(&e.split),
      }
    })
    .collect()
}

/// The recommended allocation, shaped for structured serialization.
#[derive(Clone, Debug, Serialize)]
pub struct BestAllocation {
  /// Weight per fund entity id.
  pub allocations: BTreeMap<String, f64>,
  pub sharpe_ratio: f64,
  pub expected_return: f64,
  pub expected_returns_at_end: f64,
  pub expected_volatility: f64,
}

impl BestAllocation {
  /// Build the document from a finished search.
  pub fn from_result(result: &FrontierResult) -> Self {
    let best = result.best();

    let allocations = result
      .cloud
      .fund_ids
      .iter()
      .cloned()
      .zip(best.split.iter().copied())
      .collect();

    Self {
      allocations,
      sharpe_ratio: best.sharpe_ratio,
      expected_return: best.average_return,
      expected_returns_at_end: best.value_at_end,
      expected_volatility: best.volatility,
    }
  }

  pub fn to_json(&self) -> serde_json::Result<String> {
    serde_json::to_string_pretty(self)
  }
}
