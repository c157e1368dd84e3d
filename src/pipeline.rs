//! Per-station pipeline.
//!
//! Stages run strictly in order, each consuming the previous stage's
//! table: calendar, imputation, estimator bank, aggregation, metrics.
//! Nothing is shared between stations, so callers may run several
//! pipelines side by side.

use crate::aggregate::{monthly_sum, rolling_mean};
use crate::calendar::CalendarReconstructor;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::estimators::{EstimateTable, build_estimate_table};
use crate::imputer::{ImputationReport, impute_with_report};
use crate::metrics::{MetricRecord, TaylorDiagram, metrics_table, taylor_diagram};
use crate::models::{DailyTable, EtoMethod, RawStationTable, StationContext};
use tracing::{debug, info, warn};

/// Cleaned table plus what cleaning did
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedStation {
    pub table: DailyTable,
    pub calendar_strategy: &'static str,
    pub imputation: ImputationReport,
}

/// Agreement of every method with the reference at one resolution
#[derive(Debug, Clone, PartialEq)]
pub struct AgreementReport {
    pub metrics: Vec<MetricRecord>,
    pub taylor: Option<TaylorDiagram>,
}

/// Rolling and monthly views of the estimate table
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregates {
    pub rolling: DailyTable,
    pub monthly: DailyTable,
}

/// Everything one station run produces
#[derive(Debug, Clone, PartialEq)]
pub struct StationReport {
    pub station: String,
    pub cleaned: CleanedStation,
    pub estimates: EstimateTable,
    pub aggregates: Aggregates,
    pub daily: AgreementReport,
    pub monthly: AgreementReport,
}

#[derive(Debug, Clone)]
pub struct StationPipeline {
    station: StationContext,
    config: PipelineConfig,
}

impl StationPipeline {
    pub fn new(station: StationContext, config: PipelineConfig) -> Result<Self> {
        station.validate()?;
        config.validate()?;
        Ok(Self { station, config })
    }

    pub fn station(&self) -> &StationContext {
        &self.station
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Rebuild the calendar and fill gaps
    pub fn clean(&self, raw: &RawStationTable) -> Result<CleanedStation> {
        let reconstructor = match &raw.month {
            Some(months) => CalendarReconstructor::with_month_column(months),
            None => CalendarReconstructor::new(),
        };
        let reconstruction = reconstructor.reconstruct(&raw.day, self.config.year);
        let unresolved = reconstruction.dates.iter().filter(|d| d.is_none()).count();
        if unresolved > 0 {
            warn!(
                "{}: {} rows without a calendar date",
                self.station.name, unresolved
            );
        }

        let mut table = DailyTable::new(reconstruction.dates);
        for column in &raw.numeric {
            table.insert_column(column.name.clone(), column.values.clone())?;
        }
        for column in &raw.text {
            table.insert_text_column(column.name.clone(), column.values.clone())?;
        }

        let (table, imputation) = impute_with_report(&table);
        if imputation.duplicates_dropped > 0 {
            warn!(
                "{}: calendar strategy '{}' produced {} duplicate dates, later rows dropped",
                self.station.name, reconstruction.strategy, imputation.duplicates_dropped
            );
        }
        Ok(CleanedStation {
            table,
            calendar_strategy: reconstruction.strategy,
            imputation,
        })
    }

    pub fn estimate(&self, cleaned: &DailyTable) -> Result<EstimateTable> {
        build_estimate_table(cleaned, &self.station, &self.config)
    }

    /// Trailing rolling mean and monthly totals of every method column
    pub fn aggregate(&self, estimates: &DailyTable) -> Result<Aggregates> {
        let method_columns: Vec<&str> = EtoMethod::ALL
            .iter()
            .map(|m| m.column_name())
            .filter(|name| estimates.has_column(name))
            .collect();
        let methods_only = estimates.select(&method_columns);
        Ok(Aggregates {
            rolling: rolling_mean(&methods_only, self.config.rolling_window),
            monthly: monthly_sum(&methods_only, &method_columns)?,
        })
    }

    /// Metric table and Taylor statistics of one estimate table
    pub fn agreement(&self, estimates: &DailyTable) -> Result<AgreementReport> {
        let reference = self.config.reference_method;
        let metrics = metrics_table(estimates, &self.station.name, reference, &EtoMethod::ALL)?;
        let taylor = taylor_diagram(estimates, reference, &EtoMethod::ALL);
        if taylor.is_none() {
            debug!(
                "{}: reference has too little spread for a Taylor diagram",
                self.station.name
            );
        }
        Ok(AgreementReport { metrics, taylor })
    }

    /// Score an estimate table at daily and monthly resolution
    pub fn analyse(
        &self,
        estimates: &DailyTable,
    ) -> Result<(Aggregates, AgreementReport, AgreementReport)> {
        let aggregates = self.aggregate(estimates)?;
        let daily = self.agreement(estimates)?;
        let monthly = self.agreement(&aggregates.monthly)?;
        Ok((aggregates, daily, monthly))
    }

    /// All stages from a raw sheet
    pub fn run(&self, raw: &RawStationTable) -> Result<StationReport> {
        info!("Processing station {}", self.station.name);
        let cleaned = self.clean(raw)?;
        let estimates = self.estimate(&cleaned.table)?;
        let (aggregates, daily, monthly) = self.analyse(&estimates.table)?;

        info!(
            "{}: {} days, {} methods scored",
            self.station.name,
            cleaned.table.len(),
            daily.metrics.len()
        );

        Ok(StationReport {
            station: self.station.name.clone(),
            cleaned,
            estimates,
            aggregates,
            daily,
            monthly,
        })
    }
}
