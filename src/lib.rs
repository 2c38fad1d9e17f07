//! # frontier-rs
//!
//! Evaluates fund return series and searches portfolio allocations that
//! optimize the risk/return tradeoff, reporting the convex-hull efficient
//! frontier and the best-Sharpe split against a risk-free benchmark.
//!
//! The pipeline: normalized return tables become [`series::ReturnSeries`]
//! values, a [`frontier::FrontierSearch`] ranks funds, enumerates every
//! gridded split, evaluates a [`portfolio::Portfolio`] per split, and
//! reduces the (volatility, return) cloud with a convex hull. Data loading,
//! persistence, and chart rendering stay outside this crate; [`report`]
//! shapes what those collaborators consume.

pub mod config;
pub mod data;
pub mod error;
pub mod frontier;
pub mod portfolio;
pub mod report;
pub mod series;
pub mod stats;

pub use error::Error;
pub use error::Result;
