//! Multi-station processing engine.
//!
//! Resolves each station's input file for the requested stage, runs the
//! station pipeline on a blocking worker, and writes every output table.
//! Stations share nothing, so they are processed concurrently.

pub mod reader;
pub mod writer;

#[cfg(test)]
pub mod tests;

use self::reader::{read_daily_table, read_raw_station};
use self::writer::TableWriter;

use crate::config::{OutputFormat, PipelineConfig};
use crate::constants::{
    CLEANED_SUFFIX, DAILY_METRICS_SUFFIX, DAILY_TAYLOR_SUFFIX, ESTIMATES_SUFFIX,
    MONTHLY_METRICS_SUFFIX, MONTHLY_TAYLOR_SUFFIX, MONTHLY_TOTALS_SUFFIX, ROLLING_SUFFIX,
};
use crate::error::{EtoError, Result};
use crate::models::{ProcessingStats, StationContext};
use crate::pipeline::{Aggregates, AgreementReport, StationPipeline};
use crate::schema::SchemaMapper;

use colored::*;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task;
use tracing::{debug, error, info};

/// Which part of the pipeline to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Raw sheet to cleaned daily table
    Clean,
    /// Cleaned table to estimate table
    Estimate,
    /// Estimate table to rolling means and monthly totals
    Aggregate,
    /// Estimate table to metric tables and Taylor statistics
    Metrics,
    /// Raw sheet to every output
    All,
}

impl Stage {
    /// Suffix of the file this stage reads, `None` for raw sheets
    fn input_suffix(&self) -> Option<&'static str> {
        match self {
            Stage::Clean | Stage::All => None,
            Stage::Estimate => Some(CLEANED_SUFFIX),
            Stage::Aggregate | Stage::Metrics => Some(ESTIMATES_SUFFIX),
        }
    }
}

/// Processor for one or more stations
#[derive(Debug, Clone)]
pub struct StationProcessor {
    input_path: PathBuf,
    config: PipelineConfig,
    writer: TableWriter,
    mapper: SchemaMapper,
    stage: Stage,
}

impl StationProcessor {
    /// Create a processor reading from `input_path` (a directory, or a
    /// single file when one station is processed)
    pub fn new(
        input_path: PathBuf,
        output_path: Option<PathBuf>,
        config: PipelineConfig,
    ) -> Result<Self> {
        if !input_path.exists() {
            return Err(EtoError::InputNotFound { path: input_path });
        }
        config.validate()?;

        let output_path = output_path.unwrap_or_else(|| {
            let base = if input_path.is_dir() {
                input_path.as_path()
            } else {
                input_path.parent().unwrap_or_else(|| Path::new("."))
            };
            base.join("output")
        });

        Ok(Self {
            writer: TableWriter::new(output_path, config.output_format),
            input_path,
            config,
            mapper: SchemaMapper::new(),
            stage: Stage::All,
        })
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    pub fn with_mapper(mut self, mapper: SchemaMapper) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn output_dir(&self) -> &Path {
        self.writer.output_dir()
    }

    /// Locate the file a station's stage reads
    pub fn input_for(&self, station: &str) -> Result<PathBuf> {
        if self.input_path.is_file() {
            return Ok(self.input_path.clone());
        }

        let stem = match self.stage.input_suffix() {
            Some(suffix) => format!("{}_{}", station, suffix),
            None => station.to_string(),
        };
        let preferred = self.config.output_format;
        let other = match preferred {
            OutputFormat::Csv => OutputFormat::Parquet,
            OutputFormat::Parquet => OutputFormat::Csv,
        };
        [preferred, other]
            .iter()
            .map(|format| self.input_path.join(format!("{}.{}", stem, format.extension())))
            .find(|candidate| candidate.exists())
            .ok_or_else(|| EtoError::InputNotFound {
                path: self.input_path.join(format!("{}.{}", stem, preferred.extension())),
            })
    }

    fn write_aggregates(&self, aggregates: &Aggregates, station: &str) -> Result<usize> {
        let rolling_suffix = format!("{}{}d", ROLLING_SUFFIX, self.config.rolling_window);
        let mut rows = self.writer.write_table(&aggregates.rolling, station, &rolling_suffix)?;
        rows += self
            .writer
            .write_table(&aggregates.monthly, station, MONTHLY_TOTALS_SUFFIX)?;
        Ok(rows)
    }

    fn write_agreement(
        &self,
        report: &AgreementReport,
        station: &str,
        metrics_suffix: &str,
        taylor_suffix: &str,
    ) -> Result<usize> {
        let mut rows = self.writer.write_metrics(&report.metrics, station, metrics_suffix)?;
        if let Some(diagram) = &report.taylor {
            rows += self.writer.write_taylor(diagram, station, taylor_suffix)?;
        }
        Ok(rows)
    }

    /// Run the configured stage for one station, returns rows written
    pub fn process_station(&self, station: &StationContext) -> Result<usize> {
        let pipeline = StationPipeline::new(station.clone(), self.config.clone())?;
        let input = self.input_for(&station.name)?;
        let name = station.name.as_str();
        debug!("{}: reading {}", name, input.display());

        let rows = match self.stage {
            Stage::Clean => {
                let raw = read_raw_station(&input, &self.mapper)?;
                let cleaned = pipeline.clean(&raw)?;
                self.writer.write_table(&cleaned.table, name, CLEANED_SUFFIX)?
            }
            Stage::Estimate => {
                let cleaned = read_daily_table(&input)?;
                let estimates = pipeline.estimate(&cleaned)?;
                self.writer.write_table(&estimates.table, name, ESTIMATES_SUFFIX)?
            }
            Stage::Aggregate => {
                let estimates = read_daily_table(&input)?;
                self.write_aggregates(&pipeline.aggregate(&estimates)?, name)?
            }
            Stage::Metrics => {
                let estimates = read_daily_table(&input)?;
                let (_, daily, monthly) = pipeline.analyse(&estimates)?;
                self.write_agreement(&daily, name, DAILY_METRICS_SUFFIX, DAILY_TAYLOR_SUFFIX)?
                    + self.write_agreement(
                        &monthly,
                        name,
                        MONTHLY_METRICS_SUFFIX,
                        MONTHLY_TAYLOR_SUFFIX,
                    )?
            }
            Stage::All => {
                let raw = read_raw_station(&input, &self.mapper)?;
                let report = pipeline.run(&raw)?;
                let mut rows = self
                    .writer
                    .write_table(&report.cleaned.table, name, CLEANED_SUFFIX)?;
                rows += self
                    .writer
                    .write_table(&report.estimates.table, name, ESTIMATES_SUFFIX)?;
                rows += self.write_aggregates(&report.aggregates, name)?;
                rows += self.write_agreement(
                    &report.daily,
                    name,
                    DAILY_METRICS_SUFFIX,
                    DAILY_TAYLOR_SUFFIX,
                )?;
                rows += self.write_agreement(
                    &report.monthly,
                    name,
                    MONTHLY_METRICS_SUFFIX,
                    MONTHLY_TAYLOR_SUFFIX,
                )?;
                rows
            }
        };
        Ok(rows)
    }

    /// Process every station concurrently. The first station error is
    /// returned after all stations have finished.
    pub async fn process(&self, stations: &[StationContext]) -> Result<ProcessingStats> {
        let start_time = Instant::now();
        if stations.len() > 1 && self.input_path.is_file() {
            return Err(EtoError::configuration(format!(
                "{} stations requested but input {} is a single file",
                stations.len(),
                self.input_path.display()
            )));
        }

        println!("{}", "Starting ETo processing".bright_green().bold());
        println!("  {} {}", "Input:".bright_cyan(), self.input_path.display());
        println!("  {} {}", "Output:".bright_cyan(), self.output_dir().display());
        println!("  {} {:?}", "Stage:".bright_cyan(), self.stage);

        let progress_bar = ProgressBar::new(stations.len() as u64);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} stations {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let processor = Arc::new(self.clone());
        let concurrency = num_cpus::get().clamp(1, stations.len().max(1));
        let results: Vec<(String, Result<usize>)> = stream::iter(stations.iter().cloned())
            .map(|station| {
                let processor = Arc::clone(&processor);
                let progress_bar = progress_bar.clone();
                async move {
                    let name = station.name.clone();
                    let result = task::spawn_blocking(move || processor.process_station(&station))
                        .await
                        .unwrap_or_else(|e| {
                            Err(EtoError::configuration(format!(
                                "Station worker failed: {}",
                                e
                            )))
                        });
                    progress_bar.inc(1);
                    progress_bar.set_message(name.clone());
                    (name, result)
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;
        progress_bar.finish_and_clear();

        let mut stats = ProcessingStats {
            output_path: self.output_dir().to_path_buf(),
            ..Default::default()
        };
        let mut first_error = None;
        for (name, result) in results {
            match result {
                Ok(rows) => {
                    stats.stations_processed += 1;
                    stats.total_rows += rows;
                    info!("{}: {} rows written", name, rows);
                }
                Err(e) => {
                    stats.stations_failed += 1;
                    error!("{}: {}", name, e);
                    first_error.get_or_insert(e);
                }
            }
        }
        stats.processing_time_ms = start_time.elapsed().as_millis();

        println!("\n{}", "Processing Summary".bright_green().bold());
        println!(
            "  {} {}ms",
            "Time elapsed:".bright_cyan(),
            stats.processing_time_ms.to_string().bright_white()
        );
        println!(
            "  {} {}",
            "Stations processed:".bright_cyan(),
            stats.stations_processed.to_string().bright_white()
        );
        if stats.stations_failed > 0 {
            println!(
                "  {} {}",
                "Stations failed:".bright_red(),
                stats.stations_failed.to_string().bright_red().bold()
            );
        }
        println!(
            "  {} {}",
            "Rows written:".bright_cyan(),
            stats.total_rows.to_string().bright_white().bold()
        );

        match first_error {
            Some(e) => Err(e),
            None => Ok(stats),
        }
    }
}
