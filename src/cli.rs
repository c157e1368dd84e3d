//! Command-line interface components.

use crate::config::{OutputFormat, PipelineConfig};
use crate::models::{EtoMethod, ProcessingStats, StationContext};
use crate::processor::{Stage, StationProcessor};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "eto_processor")]
#[command(about = "Estimate reference evapotranspiration and score it against Penman-Monteith")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Directory of station sheets (or a single sheet for one station)
    #[arg(short, long, global = true, default_value = ".")]
    pub input: PathBuf,

    /// Output directory, defaults to <input>/output
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Stations to process, defaults to every configured station
    #[arg(short = 's', long = "station", global = true, value_delimiter = ',')]
    pub stations: Vec<String>,

    /// Year assigned to day columns without one
    #[arg(long, global = true)]
    pub year: Option<i32>,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (csv, parquet)
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Reference method for the metrics (column name, short id or display name)
    #[arg(long, global = true)]
    pub reference: Option<EtoMethod>,

    /// Prefer estimate columns present in the source over computed ones
    #[arg(long, global = true)]
    pub source_estimates: bool,

    /// Increase verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only show errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Rebuild calendars and fill gaps in raw station sheets
    Clean,
    /// Compute the estimator bank from cleaned tables
    Estimate,
    /// Rolling means and monthly totals of the estimate tables
    Aggregate,
    /// Daily and monthly agreement metrics and Taylor statistics
    Metrics,
    /// Every stage from raw sheets
    All,
}

impl Command {
    pub fn stage(&self) -> Stage {
        match self {
            Command::Clean => Stage::Clean,
            Command::Estimate => Stage::Estimate,
            Command::Aggregate => Stage::Aggregate,
            Command::Metrics => Stage::Metrics,
            Command::All => Stage::All,
        }
    }
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Configuration file, then command-line overrides
    pub fn load_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => {
                let default_path = PipelineConfig::default_config_path()?;
                if default_path.exists() {
                    debug!("Using config at {}", default_path.display());
                    PipelineConfig::from_file(&default_path)?
                } else {
                    PipelineConfig::default()
                }
            }
        };

        if let Some(year) = self.year {
            config = config.with_year(year);
        }
        if let Some(format) = self.format {
            config = config.with_output_format(format);
        }
        if let Some(method) = self.reference {
            config = config.with_reference_method(method);
        }
        if self.source_estimates {
            config = config.with_source_estimates();
        }
        config.validate()?;
        Ok(config)
    }

    /// Requested stations, looked up in the configured station table
    pub fn resolve_stations(&self, config: &PipelineConfig) -> Result<Vec<StationContext>> {
        if self.stations.is_empty() {
            return Ok(config.stations.clone());
        }
        self.stations
            .iter()
            .map(|name| Ok(config.station(name)?.clone()))
            .collect()
    }
}

/// Set up structured logging
pub fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("eto_processor={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .init();

    debug!("Logging initialized at level: {}", log_level);
}

/// Run the selected command
pub async fn run(args: Args) -> Result<ProcessingStats> {
    let config = args.load_config()?;
    let stations = args.resolve_stations(&config)?;
    let processor = StationProcessor::new(args.input.clone(), args.output.clone(), config)
        .context("Failed to set up processor")?
        .with_stage(args.command.stage());
    let stats = processor.process(&stations).await?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_options() {
        let args = Args::try_parse_from([
            "eto_processor",
            "metrics",
            "--input",
            "data",
            "--station",
            "manaus,piracicaba",
            "--year",
            "2023",
            "--format",
            "parquet",
            "--reference",
            "pm",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.command, Command::Metrics);
        assert_eq!(args.stations, vec!["manaus", "piracicaba"]);
        assert_eq!(args.format, Some(OutputFormat::Parquet));
        assert_eq!(args.reference, Some(EtoMethod::PenmanMonteith));
        assert_eq!(args.get_log_level(), "debug");
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Args::try_parse_from(["eto_processor", "all", "-q", "-v"]).is_err());
        let args = Args::try_parse_from(["eto_processor", "all", "-q"]).unwrap();
        assert_eq!(args.get_log_level(), "error");
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        std::fs::write(&config_path, r#"{"year": 2020, "rolling_window": 5}"#).unwrap();
        let args = Args::try_parse_from([
            "eto_processor",
            "all",
            "--config",
            config_path.to_str().unwrap(),
            "--year",
            "2022",
        ])
        .unwrap();
        let config = args.load_config().unwrap();
        assert_eq!(config.year, 2022);
        assert_eq!(config.rolling_window, 5);
    }

    #[test]
    fn test_unknown_station_rejected() {
        let args = Args::try_parse_from(["eto_processor", "all", "-s", "recife"]).unwrap();
        assert!(args.resolve_stations(&PipelineConfig::default()).is_err());
    }
}
