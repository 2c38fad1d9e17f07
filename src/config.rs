//! Run configuration, loaded from a TOML file and validated once.
//!
//! The configuration value is passed explicitly into the search entry
//! points; there is no process-wide singleton.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::Error;
use crate::error::Result;

/// Pre-search fund filters.
#[derive(Clone, Debug, Deserialize)]
pub struct FundsFilters {
  /// Funds whose windowed standard deviation exceeds this are dropped.
  pub volatility_threshold: f64,
  /// Allow-list of entity ids; empty means "all".
  #[serde(default)]
  pub include: BTreeSet<String>,
  /// Deny-list of entity ids, applied after `include`.
  #[serde(default)]
  pub exclude: BTreeSet<String>,
}

/// Parameters of one allocation search.
#[derive(Clone, Debug, Deserialize)]
pub struct PortfolioParams {
  /// Number of top-ranked funds the search allocates over.
  pub number_of_funds: usize,
  pub from_date: NaiveDate,
  pub to_date: NaiveDate,
  /// Weight grid step, in (0, 1].
  pub split_granularity: f64,
}

/// Full run configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
  pub funds_filters: FundsFilters,
  pub portfolio: PortfolioParams,
}

impl Config {
  /// Load and validate a configuration file.
  pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    Self::from_toml_str(&raw)
  }

  /// Parse and validate configuration from a TOML string.
  pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
    let config: Self = toml::from_str(raw).context("parsing TOML config")?;
    config.validate()?;
    Ok(config)
  }

  /// Check the cross-field invariants serde cannot express.
  pub fn validate(&self) -> Result<()> {
    self.portfolio.validate()?;

    if self.funds_filters.volatility_threshold < 0.0 {
      return Err(Error::configuration(format!(
        "volatility_threshold must be non-negative, got {}",
        self.funds_filters.volatility_threshold
      )));
    }

    Ok(())
  }
}

impl PortfolioParams {
  pub fn validate(&self) -> Result<()> {
    if self.number_of_funds < 1 {
      return Err(Error::configuration("number_of_funds must be at least 1"));
    }
    if self.from_date > self.to_date {
      return Err(Error::configuration(format!(
        "from_date {} is after to_date {}",
        self.from_date, self.to_date
      )));
    }
    if !(self.split_granularity > 0.0 && self.split_granularity <= 1.0) {
      return Err(Error::configuration(format!(
        "split_granularity must be in (0, 1], got {}",
        self.split_granularity
      )));
    }
    Ok(())
  }
}
