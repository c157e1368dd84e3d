//! Configuration management and validation.
//!
//! Holds the heuristic constants of the estimator bank, the run-level
//! pipeline settings and the station table. Everything is serde
//! serialisable so a run can be driven from a JSON file and then
//! overridden from the command line.

use crate::constants::{
    DEFAULT_ALBEDO, DEFAULT_HUMIDITY_FALLBACK_FRACTION, DEFAULT_NET_RADIATION_RATIO_BOUND,
    DEFAULT_PRIESTLEY_TAYLOR_ALPHA, DEFAULT_ROLLING_WINDOW, DEFAULT_SOIL_HEAT_FLUX,
    DEFAULT_WIND_FALLBACK_MS, DEFAULT_YEAR,
};
use crate::error::{EtoError, Result};
use crate::models::{EtoMethod, StationContext};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Heuristic constants passed into the derivations and estimators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Reference crop albedo used for net shortwave radiation
    pub albedo: f64,

    /// Priestley-Taylor alpha
    pub priestley_taylor_alpha: f64,

    /// Soil heat flux G (MJ m-2 day-1)
    pub soil_heat_flux: f64,

    /// Wind speed substituted when wind is not observed (m/s)
    pub wind_fallback_ms: f64,

    /// Fraction of es used as ea when humidity is not observed
    pub humidity_fallback_fraction: f64,

    /// Mean Rn/Rs ratio below which a measured net radiation column is trusted
    pub net_radiation_ratio_bound: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            albedo: DEFAULT_ALBEDO,
            priestley_taylor_alpha: DEFAULT_PRIESTLEY_TAYLOR_ALPHA,
            soil_heat_flux: DEFAULT_SOIL_HEAT_FLUX,
            wind_fallback_ms: DEFAULT_WIND_FALLBACK_MS,
            humidity_fallback_fraction: DEFAULT_HUMIDITY_FALLBACK_FRACTION,
            net_radiation_ratio_bound: DEFAULT_NET_RADIATION_RATIO_BOUND,
        }
    }
}

impl EstimatorConfig {
    pub fn with_albedo(mut self, albedo: f64) -> Self {
        self.albedo = albedo;
        self
    }

    pub fn with_priestley_taylor_alpha(mut self, alpha: f64) -> Self {
        self.priestley_taylor_alpha = alpha;
        self
    }

    pub fn with_soil_heat_flux(mut self, soil_heat_flux: f64) -> Self {
        self.soil_heat_flux = soil_heat_flux;
        self
    }

    pub fn with_wind_fallback(mut self, wind_ms: f64) -> Self {
        self.wind_fallback_ms = wind_ms;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.albedo) {
            return Err(EtoError::configuration(format!(
                "Albedo must lie in [0, 1], got {}",
                self.albedo
            )));
        }
        if !(0.0..=1.0).contains(&self.humidity_fallback_fraction) {
            return Err(EtoError::configuration(format!(
                "Humidity fallback fraction must lie in [0, 1], got {}",
                self.humidity_fallback_fraction
            )));
        }
        let finite = [
            ("priestley_taylor_alpha", self.priestley_taylor_alpha),
            ("soil_heat_flux", self.soil_heat_flux),
            ("wind_fallback_ms", self.wind_fallback_ms),
            ("net_radiation_ratio_bound", self.net_radiation_ratio_bound),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(EtoError::configuration(format!(
                    "{} must be finite, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Output table format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = EtoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "parquet" => Ok(OutputFormat::Parquet),
            other => Err(EtoError::configuration(format!(
                "Unknown output format '{}' (expected csv or parquet)",
                other
            ))),
        }
    }
}

/// Global configuration for an ETo run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Year assigned to day columns that do not carry one
    pub year: i32,

    /// Method every other method is scored against
    pub reference_method: EtoMethod,

    /// Trailing window of the rolling mean (days)
    pub rolling_window: usize,

    /// Use estimate columns already present in the source instead of recomputing
    pub prefer_source_estimates: bool,

    /// Format of written tables
    pub output_format: OutputFormat,

    /// Estimator heuristics
    pub estimator: EstimatorConfig,

    /// Known stations
    pub stations: Vec<StationContext>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            year: DEFAULT_YEAR,
            reference_method: EtoMethod::PenmanMonteith,
            rolling_window: DEFAULT_ROLLING_WINDOW,
            prefer_source_estimates: false,
            output_format: OutputFormat::Csv,
            estimator: EstimatorConfig::default(),
            stations: vec![StationContext::manaus(), StationContext::piracicaba()],
        }
    }
}

impl PipelineConfig {
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    pub fn with_reference_method(mut self, method: EtoMethod) -> Self {
        self.reference_method = method;
        self
    }

    pub fn with_estimator(mut self, estimator: EstimatorConfig) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_source_estimates(mut self) -> Self {
        self.prefer_source_estimates = true;
        self
    }

    pub fn with_stations(mut self, stations: Vec<StationContext>) -> Self {
        self.stations = stations;
        self
    }

    /// Look up a configured station by name (case-insensitive)
    pub fn station(&self, name: &str) -> Result<&StationContext> {
        self.stations
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| EtoError::UnknownStation {
                name: name.to_string(),
            })
    }

    /// Default location of the optional config file
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            EtoError::configuration("Could not determine user configuration directory")
        })?;
        Ok(config_dir.join("eto_processor").join("config.json"))
    }

    /// Load a configuration file, missing keys take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&contents)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rolling_window == 0 {
            return Err(EtoError::configuration("Rolling window must be at least 1 day"));
        }
        if chrono::NaiveDate::from_ymd_opt(self.year, 1, 1).is_none() {
            return Err(EtoError::configuration(format!(
                "Year {} is out of range",
                self.year
            )));
        }
        if !self.reference_method.is_computed() && !self.prefer_source_estimates {
            debug!(
                "Reference method {} is only available from source columns",
                self.reference_method
            );
        }
        self.estimator.validate()?;
        for station in &self.stations {
            station.validate()?;
        }
        Ok(())
    }
}
