//! Ingestion boundary for normalized return tables.
//!
//! The loading collaborator hands over one row per entity per period, with
//! `return_factor` already expressed as a growth multiplier. This module
//! groups rows into [`ReturnSeries`] values and applies the configured fund
//! filters before a search runs.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::config::FundsFilters;
use crate::error::Error;
use crate::error::Result;
use crate::series::Observation;
use crate::series::ReturnSeries;
use crate::series::Window;

/// One normalized input row.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FundRecord {
  pub entity_id: String,
  pub date: NaiveDate,
  pub return_factor: f64,
}

/// Group rows into per-entity series, preserving first-seen entity order.
///
/// Rows must arrive sorted by `(entity_id, date)` with no duplicate pairs;
/// per-series validation in [`ReturnSeries::new`] enforces the date part.
pub fn series_from_records(records: impl IntoIterator<Item = FundRecord>) -> Result<Vec<ReturnSeries>> {
  let mut series = Vec::new();
  let mut current_id: Option<String> = None;
  let mut current_obs: Vec<Observation> = Vec::new();
  let mut seen: BTreeSet<String> = BTreeSet::new();

  for record in records {
    if current_id.as_deref() != Some(record.entity_id.as_str()) {
      if let Some(id) = current_id.take() {
        series.push(ReturnSeries::new(id, std::mem::take(&mut current_obs))?);
      }
      if !seen.insert(record.entity_id.clone()) {
        return Err(Error::configuration(format!(
          "rows for `{}` are not contiguous; input must be sorted by (entity_id, date)",
          record.entity_id
        )));
      }
      current_id = Some(record.entity_id.clone());
    }
    current_obs.push(Observation {
      date: record.date,
      factor: record.return_factor,
    });
  }

  if let Some(id) = current_id {
    series.push(ReturnSeries::new(id, current_obs)?);
  }

  Ok(series)
}

/// Apply include/exclude lists and the volatility threshold over `window`.
///
/// A fund that cannot carry a dispersion estimate in the window (no or too
/// few observations) is dropped, matching the behavior of filtering on an
/// unknowable volatility.
pub fn apply_filters(
  series: Vec<ReturnSeries>,
  filters: &FundsFilters,
  window: Window,
) -> Result<Vec<ReturnSeries>> {
  let mut kept = Vec::with_capacity(series.len());

  for ts in series {
    if !filters.include.is_empty() && !filters.include.contains(ts.entity_id()) {
      continue;
    }
    if filters.exclude.contains(ts.entity_id()) {
      continue;
    }

    match ts.windowed_variance(window) {
      Ok(variance) => {
        if variance.sqrt() <= filters.volatility_threshold {
          kept.push(ts);
        } else {
          debug!(entity_id = ts.entity_id(), "dropping fund over volatility threshold");
        }
      }
      Err(Error::EmptyWindow { .. }) => {
        debug!(entity_id = ts.entity_id(), "dropping fund without observations in window");
      }
      Err(e) => return Err(e),
    }
  }

  Ok(kept)
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use chrono::NaiveDate;

  use super::apply_filters;
  use super::series_from_records;
  use super::FundRecord;
  use crate::config::FundsFilters;
  use crate::series::Window;

  fn record(entity_id: &str, day: u32, return_factor: f64) -> FundRecord {
    FundRecord {
      entity_id: entity_id.to_string(),
      date: NaiveDate::from_ymd_opt(2020, 1, day).unwrap(),
      return_factor,
    }
  }

  fn filters(threshold: f64, include: &[&str], exclude: &[&str]) -> FundsFilters {
    FundsFilters {
      volatility_threshold: threshold,
      include: include.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
      exclude: exclude.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
    }
  }

  #[test]
  fn groups_rows_by_entity_in_first_seen_order() {
    let rows = vec![
      record("b", 1, 1.01),
      record("b", 2, 1.02),
      record("a", 1, 1.00),
      record("a", 2, 1.03),
      record("a", 3, 1.01),
    ];

    let series = series_from_records(rows).unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series[0].entity_id(), "b");
    assert_eq!(series[0].len(), 2);
    assert_eq!(series[1].entity_id(), "a");
    assert_eq!(series[1].len(), 3);
  }

  #[test]
  fn rejects_non_contiguous_entities() {
    let rows = vec![record("a", 1, 1.0), record("b", 1, 1.0), record("a", 2, 1.0)];
    assert!(series_from_records(rows).is_err());
  }

  #[test]
  fn volatility_threshold_drops_noisy_funds() {
    let rows = vec![
      record("calm", 1, 1.001),
      record("calm", 2, 1.002),
      record("calm", 3, 1.001),
      record("wild", 1, 1.50),
      record("wild", 2, 0.50),
      record("wild", 3, 1.40),
    ];
    let series = series_from_records(rows).unwrap();
    let window = Window::new(
      NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
      NaiveDate::from_ymd_opt(2020, 1, 3).unwrap(),
    )
    .unwrap();

    let kept = apply_filters(series, &filters(0.01, &[], &[]), window).unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].entity_id(), "calm");
  }

  #[test]
  fn include_and_exclude_lists_apply_before_volatility() {
    let rows = vec![
      record("a", 1, 1.0),
      record("a", 2, 1.0),
      record("b", 1, 1.0),
      record("b", 2, 1.0),
      record("c", 1, 1.0),
      record("c", 2, 1.0),
    ];
    let series = series_from_records(rows).unwrap();
    let window = Window::new(
      NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
      NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(),
    )
    .unwrap();

    let kept = apply_filters(series, &filters(1.0, &["a", "b"], &["b"]), window).unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].entity_id(), "a");
  }

  #[test]
  fn funds_without_window_data_are_dropped() {
    let rows = vec![
      record("in", 1, 1.0),
      record("in", 2, 1.0),
      record("out", 20, 1.0),
      record("out", 21, 1.0),
    ];
    let series = series_from_records(rows).unwrap();
    let window = Window::new(
      NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
      NaiveDate::from_ymd_opt(2020, 1, 5).unwrap(),
    )
    .unwrap();

    let kept = apply_filters(series, &filters(1.0, &[], &[]), window).unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].entity_id(), "in");
  }
}
