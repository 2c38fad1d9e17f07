//! # Return Series
//!
//! $$
//! V(t_0, t_1) = V_0 \prod_{t_0 \le t \le t_1} f_t
//! $$
//!
//! A single entity's dated sequence of multiplicative growth factors with
//! windowed aggregate statistics. Window products are memoized because the
//! allocation search queries the same window once per candidate split.

use std::collections::HashMap;
use std::sync::PoisonError;
use std::sync::RwLock;

use chrono::NaiveDate;
use statrs::statistics::Statistics;

use crate::error::Error;
use crate::error::Result;

/// One dated observation of a multiplicative growth factor
/// (`1.02` means +2% over the period).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Observation {
  pub date: NaiveDate,
  pub factor: f64,
}

/// Inclusive date window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Window {
  pub from: NaiveDate,
  pub to: NaiveDate,
}

impl Window {
  /// Build a window, rejecting `from > to`.
  pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
    if from > to {
      return Err(Error::configuration(format!(
        "window start {from} is after window end {to}"
      )));
    }
    Ok(Self { from, to })
  }
}

/// Immutable return stream of one fund, with memoized window products.
///
/// Construction validates the observation sequence once; afterwards the
/// series is only ever narrowed through [`ReturnSeries::restrict`], never
/// mutated during a search.
#[derive(Debug)]
pub struct ReturnSeries {
  entity_id: String,
  observations: Vec<Observation>,
  product_cache: RwLock<HashMap<(NaiveDate, NaiveDate), f64>>,
}

impl Clone for ReturnSeries {
  fn clone(&self) -> Self {
    Self {
      entity_id: self.entity_id.clone(),
      observations: self.observations.clone(),
      product_cache: RwLock::new(HashMap::new()),
    }
  }
}

impl ReturnSeries {
  /// Build a series from ascending, date-unique observations.
  pub fn new(entity_id: impl Into<String>, observations: Vec<Observation>) -> Result<Self> {
    let entity_id = entity_id.into();

    if observations.is_empty() {
      return Err(Error::configuration(format!(
        "series `{entity_id}` has no observations"
      )));
    }

    for pair in observations.windows(2) {
      if pair[0].date >= pair[1].date {
        return Err(Error::configuration(format!(
          "series `{entity_id}` has non-ascending dates around {}",
          pair[1].date
        )));
      }
    }

    Ok(Self {
      entity_id,
      observations,
      product_cache: RwLock::new(HashMap::new()),
    })
  }

  pub fn entity_id(&self) -> &str {
    &self.entity_id
  }

  pub fn min_date(&self) -> NaiveDate {
    self.observations[0].date
  }

  pub fn max_date(&self) -> NaiveDate {
    self.observations[self.observations.len() - 1].date
  }

  pub fn len(&self) -> usize {
    self.observations.len()
  }

  /// Always false: construction rejects empty observation sequences. Kept
  /// as the standard pairing for [`Self::len`].
  pub fn is_empty(&self) -> bool {
    self.observations.is_empty()
  }

  /// The widest window this series can answer, `[min_date, max_date]`.
  pub fn full_window(&self) -> Window {
    Window {
      from: self.min_date(),
      to: self.max_date(),
    }
  }

  /// Observations with dates inside `window`, as a subslice.
  pub fn observations_in(&self, window: Window) -> &[Observation] {
    let start = self
      .observations
      .partition_point(|o| o.date < window.from);
    let end = self.observations.partition_point(|o| o.date <= window.to);
    &self.observations[start..end]
  }

  fn empty_window(&self, window: Window) -> Error {
    Error::EmptyWindow {
      entity_id: self.entity_id.clone(),
      from: window.from,
      to: window.to,
    }
  }

  /// Product of all factors in `window`, scaled by `initial_value`.
  ///
  /// The raw product is memoized per `(from, to)` key; `initial_value`
  /// scaling happens after the cache lookup so one entry serves every
  /// investment size.
  pub fn windowed_product(&self, window: Window, initial_value: f64) -> Result<f64> {
    let key = (window.from, window.to);

    let cached = self
      .product_cache
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .get(&key)
      .copied();
    if let Some(product) = cached {
      return Ok(product * initial_value);
    }

    let obs = self.observations_in(window);
    if obs.is_empty() {
      return Err(self.empty_window(window));
    }
    let product: f64 = obs.iter().map(|o| o.factor).product();

    self
      .product_cache
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(key, product);

    Ok(product * initial_value)
  }

  /// Arithmetic mean of factors in `window`.
  pub fn windowed_average(&self, window: Window) -> Result<f64> {
    let obs = self.observations_in(window);
    if obs.is_empty() {
      return Err(self.empty_window(window));
    }
    Ok(obs.iter().map(|o| o.factor).mean())
  }

  /// Sample variance (denominator N-1) of factors in `window`.
  ///
  /// Needs at least two observations to estimate dispersion.
  pub fn windowed_variance(&self, window: Window) -> Result<f64> {
    let obs = self.observations_in(window);
    if obs.len() < 2 {
      return Err(self.empty_window(window));
    }
    Ok(obs.iter().map(|o| o.factor).variance())
  }

  /// Geometric mean of factors in `window`, `product^(1/count)`.
  pub fn windowed_geometric_mean(&self, window: Window) -> Result<f64> {
    let count = self.observations_in(window).len();
    if count == 0 {
      return Err(self.empty_window(window));
    }
    let product = self.windowed_product(window, 1.0)?;
    Ok(product.powf(1.0 / count as f64))
  }

  /// Pearson correlation against `other` over the same window.
  ///
  /// Observations are inner-joined on date first, so series with missing
  /// periods are compared only where both actually observed. Fewer than two
  /// joined observations cannot carry a correlation.
  pub fn pairwise_correlation(&self, other: &ReturnSeries, window: Window) -> Result<f64> {
    let joined = inner_join(self.observations_in(window), other.observations_in(window));
    if joined.len() < 2 {
      return Err(self.empty_window(window));
    }

    let (xs, ys): (Vec<f64>, Vec<f64>) = joined.into_iter().unzip();
    Ok(pearson(&xs, &ys))
  }

  /// Narrow the series in place to `window`. Idempotent; clears the product
  /// cache when anything changes. Must not be called on series already
  /// shared with a running search.
  pub fn restrict(&mut self, window: Window) -> Result<()> {
    if self.min_date() >= window.from && self.max_date() <= window.to {
      return Ok(());
    }

    let narrowed = self.observations_in(window).to_vec();
    if narrowed.is_empty() {
      return Err(self.empty_window(window));
    }

    self.observations = narrowed;
    self
      .product_cache
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .clear();
    Ok(())
  }
}

/// Factor pairs at dates present in both slices. Both inputs are
/// date-ascending, so a single merge pass suffices.
fn inner_join(left: &[Observation], right: &[Observation]) -> Vec<(f64, f64)> {
  let mut out = Vec::with_capacity(left.len().min(right.len()));
  let mut i = 0;
  let mut j = 0;

  while i < left.len() && j < right.len() {
    match left[i].date.cmp(&right[j].date) {
      std::cmp::Ordering::Less => i += 1,
      std::cmp::Ordering::Greater => j += 1,
      std::cmp::Ordering::Equal => {
        out.push((left[i].factor, right[j].factor));
        i += 1;
        j += 1;
      }
    }
  }

  out
}

/// Pearson correlation of two equal-length samples. Degenerate (constant)
/// samples correlate to 0 rather than NaN.
pub(crate) fn pearson(x: &[f64], y: &[f64]) -> f64 {
  let n = x.len().min(y.len());
  if n < 2 {
    return 0.0;
  }

  let mx = x[..n].iter().mean();
  let my = y[..n].iter().mean();

  let mut cov = 0.0;
  let mut sx = 0.0;
  let mut sy = 0.0;

  for i in 0..n {
    let dx = x[i] - mx;
    let dy = y[i] - my;
    cov += dx * dy;
    sx += dx * dx;
    sy += dy * dy;
  }

  let denom = (sx * sy).sqrt();
  if denom < 1e-15 {
    0.0
  } else {
    (cov / denom).clamp(-1.0, 1.0)
  }
}
