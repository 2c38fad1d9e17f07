//! # Frontier Search
//!
//! $$
//! \max_{\mathbf{w} \in \Delta_g^{N}} \frac{\mathbb E[R_p - R_f]}{\sigma(R_p - R_f)}
//! $$
//!
//! Exhaustive evaluation of gridded portfolio splits, convex-hull reduction
//! of the resulting (risk, return) cloud, and best-Sharpe selection.

pub mod hull;
pub mod search;
pub mod splits;

pub use search::FrontierResult;
pub use search::FrontierSearch;
pub use search::PointCloud;
pub use splits::SplitEnumerator;

/// Statistics of one evaluated candidate split.
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluatedSplit {
  /// Weight per selected fund, aligned with the search's fund order.
  pub split: Vec<f64>,
  /// Sample standard deviation of the combined weighted stream.
  pub volatility: f64,
  /// Mean of the combined weighted stream.
  pub average_return: f64,
  /// End value of a unit investment held over the search window.
  pub value_at_end: f64,
  /// Sharpe ratio against the run's risk-free series.
  pub sharpe_ratio: f64,
}
