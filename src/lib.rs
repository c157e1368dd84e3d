//! ETo Processor Library
//!
//! Estimates daily reference evapotranspiration (ETo) for weather stations
//! and scores a bank of estimators against FAO-56 Penman-Monteith.
//!
//! This library provides tools for:
//! - Rebuilding calendars from day-of-year, day-of-month and date columns
//! - Filling gaps in daily series by linear interpolation
//! - Deriving vapour pressure, radiation and psychrometric terms
//! - Penman-Monteith, Priestley-Taylor and Hargreaves-Samani estimates
//! - Agreement metrics, Taylor statistics, rolling means and monthly totals
//! - Writing CSV or Snappy-compressed Parquet tables per station

pub mod aggregate;
pub mod atmosphere;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod estimators;
pub mod imputer;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod processor;
pub mod schema;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::{EstimatorConfig, OutputFormat, PipelineConfig};
pub use error::{EtoError, Result};
pub use estimators::{EstimateTable, build_estimate_table};
pub use metrics::{MetricRecord, MetricScores, TaylorDiagram, compute_metrics};
pub use models::{DailyTable, EtoMethod, ProcessingStats, RawStationTable, StationContext};
pub use pipeline::{StationPipeline, StationReport};
pub use processor::{Stage, StationProcessor};
