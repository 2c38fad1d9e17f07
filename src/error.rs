//! Typed errors for the allocation search engine.
//!
//! All core computations fail fast with one of these variants instead of
//! returning sentinel values such as `NaN`.

use chrono::NaiveDate;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy of the allocation engine.
#[derive(Debug, Error)]
pub enum Error {
  /// Invalid configuration or construction input. Never retried.
  #[error("configuration error: {0}")]
  Configuration(String),

  /// A requested date window contains no usable observations.
  #[error("no observations for `{entity_id}` in window {from}..={to}")]
  EmptyWindow {
    entity_id: String,
    from: NaiveDate,
    to: NaiveDate,
  },

  /// Zero-variance excess returns make the Sharpe ratio undefined.
  #[error("excess returns have zero variance; Sharpe ratio is undefined")]
  DivisionByZero,

  /// Too few distinct points to build a convex hull.
  #[error("convex hull needs at least 3 distinct points, got {points}")]
  InsufficientData { points: usize },

  /// Two series do not expose the same date index over a shared window.
  #[error("series `{left}` and `{right}` have mismatching date indices in the window")]
  MisalignedSeries { left: String, right: String },
}

impl Error {
  pub(crate) fn configuration(msg: impl Into<String>) -> Self {
    Self::Configuration(msg.into())
  }
}
