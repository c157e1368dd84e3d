//! Core data structures and types for ETo processing.
//!
//! Defines the station context, the estimator method catalogue, the
//! in-memory daily table shared by every pipeline stage and the
//! per-row observation view consumed by the physical derivations.

use crate::calendar::RawDay;
use crate::constants::columns;
use crate::error::{EtoError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Static per-station metadata, immutable for the life of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationContext {
    pub name: String,
    /// Signed decimal degrees, negative in the Southern hemisphere
    pub latitude_deg: f64,
    #[serde(default)]
    pub longitude_deg: Option<f64>,
    /// Metres above sea level
    pub altitude_m: f64,
}

impl StationContext {
    pub fn new(name: impl Into<String>, latitude_deg: f64, altitude_m: f64) -> Self {
        Self {
            name: name.into(),
            latitude_deg,
            longitude_deg: None,
            altitude_m,
        }
    }

    pub fn with_longitude(mut self, longitude_deg: f64) -> Self {
        self.longitude_deg = Some(longitude_deg);
        self
    }

    pub fn latitude_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    /// Manaus (AM), the humid tropical reference site
    pub fn manaus() -> Self {
        Self::new("manaus", -3.1019, 61.25).with_longitude(-60.0164)
    }

    /// Piracicaba (SP), the subtropical inland site
    pub fn piracicaba() -> Self {
        Self::new("piracicaba", -22.7083, 546.0).with_longitude(-47.6333)
    }

    /// Reject metadata the physical derivations cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.latitude_deg.is_finite() || !(-90.0..=90.0).contains(&self.latitude_deg) {
            return Err(EtoError::MissingStationMetadata {
                station: self.name.clone(),
                field: format!("latitude (got {})", self.latitude_deg),
            });
        }
        if !self.altitude_m.is_finite() {
            return Err(EtoError::MissingStationMetadata {
                station: self.name.clone(),
                field: format!("altitude (got {})", self.altitude_m),
            });
        }
        Ok(())
    }
}

/// Estimator methods known to the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EtoMethod {
    Thornthwaite,
    ThornthwaiteCamargo,
    Camargo,
    HargreavesSamani,
    HargreavesSamaniCorrected,
    PriestleyTaylor,
    PenmanMonteith,
    GarciaLopez,
}

impl EtoMethod {
    /// Catalogue order, which is also the output column order
    pub const ALL: [EtoMethod; 8] = [
        EtoMethod::Thornthwaite,
        EtoMethod::ThornthwaiteCamargo,
        EtoMethod::Camargo,
        EtoMethod::HargreavesSamani,
        EtoMethod::HargreavesSamaniCorrected,
        EtoMethod::PriestleyTaylor,
        EtoMethod::PenmanMonteith,
        EtoMethod::GarciaLopez,
    ];

    /// Column holding this method's estimates
    pub fn column_name(&self) -> &'static str {
        match self {
            EtoMethod::Thornthwaite => "et_thornthwaite",
            EtoMethod::ThornthwaiteCamargo => "et_thornthwaite_camargo",
            EtoMethod::Camargo => "et_camargo",
            EtoMethod::HargreavesSamani => "et_hargreaves_samani",
            EtoMethod::HargreavesSamaniCorrected => "et_hargreaves_samani_corr",
            EtoMethod::PriestleyTaylor => "et_priestley_taylor",
            EtoMethod::PenmanMonteith => "et_penman_monteith",
            EtoMethod::GarciaLopez => "et_garcia_lopez",
        }
    }

    /// Short identifier used in file names
    pub fn short_id(&self) -> &'static str {
        match self {
            EtoMethod::Thornthwaite => "thorn",
            EtoMethod::ThornthwaiteCamargo => "thorn_camargo",
            EtoMethod::Camargo => "camargo",
            EtoMethod::HargreavesSamani => "hs",
            EtoMethod::HargreavesSamaniCorrected => "hs_corr",
            EtoMethod::PriestleyTaylor => "pt",
            EtoMethod::PenmanMonteith => "pm",
            EtoMethod::GarciaLopez => "gl",
        }
    }

    /// Header used by the source spreadsheets
    pub fn display_name(&self) -> &'static str {
        match self {
            EtoMethod::Thornthwaite => "Thornthwaite",
            EtoMethod::ThornthwaiteCamargo => "Thornthwaite-Camargo",
            EtoMethod::Camargo => "Camargo",
            EtoMethod::HargreavesSamani => "Hargreaves & Samani",
            EtoMethod::HargreavesSamaniCorrected => "Hargreaves & Samani (corrigido)",
            EtoMethod::PriestleyTaylor => "Priestley-Taylor",
            EtoMethod::PenmanMonteith => "Penman-Monteith",
            EtoMethod::GarciaLopez => "Garcia Lopez",
        }
    }

    /// Whether the estimator bank computes this method from weather inputs.
    /// The others are carried through from the source table.
    pub fn is_computed(&self) -> bool {
        matches!(
            self,
            EtoMethod::PenmanMonteith | EtoMethod::PriestleyTaylor | EtoMethod::HargreavesSamani
        )
    }

    pub fn from_column_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.column_name() == name)
    }
}

impl fmt::Display for EtoMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for EtoMethod {
    type Err = EtoError;

    /// Accepts a column name, a short id or a display name
    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| {
                m.column_name() == needle
                    || m.short_id().eq_ignore_ascii_case(needle)
                    || m.display_name().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| EtoError::configuration(format!("Unknown ETo method: {}", s)))
    }
}

/// A numeric column of a daily table. `None` marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// A non-numeric column, carried through untouched
#[derive(Debug, Clone, PartialEq)]
pub struct TextColumn {
    pub name: String,
    pub values: Vec<Option<String>>,
}

/// In-memory table with one row per calendar day of one station.
///
/// Column order is insertion order. Non-finite numbers are stored as
/// missing so that every downstream stage sees a single notion of "absent".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DailyTable {
    dates: Vec<Option<NaiveDate>>,
    numeric: Vec<NumericColumn>,
    text: Vec<TextColumn>,
}

impl DailyTable {
    pub fn new(dates: Vec<Option<NaiveDate>>) -> Self {
        Self {
            dates,
            numeric: Vec::new(),
            text: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[Option<NaiveDate>] {
        &self.dates
    }

    pub fn numeric_columns(&self) -> &[NumericColumn] {
        &self.numeric
    }

    pub fn text_columns(&self) -> &[TextColumn] {
        &self.text
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.numeric.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.numeric
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.numeric.iter().any(|c| c.name == name)
    }

    /// Insert or replace a numeric column
    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<()> {
        let name = name.into();
        if values.len() != self.len() {
            return Err(EtoError::configuration(format!(
                "Column '{}' has {} rows, table has {}",
                name,
                values.len(),
                self.len()
            )));
        }
        let values = values
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();

        match self.numeric.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.numeric.push(NumericColumn { name, values }),
        }
        Ok(())
    }

    /// Insert or replace a text column
    pub fn insert_text_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<Option<String>>,
    ) -> Result<()> {
        let name = name.into();
        if values.len() != self.len() {
            return Err(EtoError::configuration(format!(
                "Column '{}' has {} rows, table has {}",
                name,
                values.len(),
                self.len()
            )));
        }
        match self.text.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.text.push(TextColumn { name, values }),
        }
        Ok(())
    }

    /// Column values may be rewritten in place, row count stays fixed
    pub(crate) fn numeric_columns_mut(&mut self) -> &mut [NumericColumn] {
        &mut self.numeric
    }

    pub(crate) fn retain_numeric(&mut self, keep: impl FnMut(&NumericColumn) -> bool) {
        self.numeric.retain(keep);
    }

    pub fn remove_column(&mut self, name: &str) -> Option<NumericColumn> {
        let index = self.numeric.iter().position(|c| c.name == name)?;
        Some(self.numeric.remove(index))
    }

    /// Build a new table from the given row indices, in that order
    pub fn take_rows(&self, indices: &[usize]) -> DailyTable {
        DailyTable {
            dates: indices.iter().map(|&i| self.dates[i]).collect(),
            numeric: self
                .numeric
                .iter()
                .map(|c| NumericColumn {
                    name: c.name.clone(),
                    values: indices.iter().map(|&i| c.values[i]).collect(),
                })
                .collect(),
            text: self
                .text
                .iter()
                .map(|c| TextColumn {
                    name: c.name.clone(),
                    values: indices.iter().map(|&i| c.values[i].clone()).collect(),
                })
                .collect(),
        }
    }

    /// Keep only the named numeric columns (dates are always kept)
    pub fn select(&self, names: &[&str]) -> DailyTable {
        DailyTable {
            dates: self.dates.clone(),
            numeric: names
                .iter()
                .filter_map(|name| self.numeric.iter().find(|c| c.name == *name).cloned())
                .collect(),
            text: Vec::new(),
        }
    }

    fn value(&self, name: &str, row: usize) -> Option<f64> {
        self.column(name).and_then(|values| values[row])
    }

    /// Observation view of one row
    pub fn row(&self, index: usize) -> ObservationRow {
        ObservationRow {
            date: self.dates[index],
            temperature_mean: self.value(columns::TEMPERATURE_MEAN, index),
            temperature_max: self.value(columns::TEMPERATURE_MAX, index),
            temperature_min: self.value(columns::TEMPERATURE_MIN, index),
            humidity_mean: self.value(columns::HUMIDITY_MEAN, index),
            humidity_max: self.value(columns::HUMIDITY_MAX, index),
            humidity_min: self.value(columns::HUMIDITY_MIN, index),
            wind_mean: self.value(columns::WIND_MEAN, index),
            wind_max: self.value(columns::WIND_MAX, index),
            rainfall: self.value(columns::RAINFALL, index),
            radiation_global: self.value(columns::RADIATION_GLOBAL, index),
            radiation_net: self.value(columns::RADIATION_NET, index),
            extraterrestrial_radiation: self.value(columns::RADIATION_EXTRATERRESTRIAL, index),
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = ObservationRow> + '_ {
        (0..self.len()).map(|i| self.row(i))
    }
}

/// One calendar day at one station, in semantic units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ObservationRow {
    pub date: Option<NaiveDate>,
    /// degC
    pub temperature_mean: Option<f64>,
    pub temperature_max: Option<f64>,
    pub temperature_min: Option<f64>,
    /// %
    pub humidity_mean: Option<f64>,
    pub humidity_max: Option<f64>,
    pub humidity_min: Option<f64>,
    /// m/s
    pub wind_mean: Option<f64>,
    pub wind_max: Option<f64>,
    /// mm
    pub rainfall: Option<f64>,
    /// MJ m-2 day-1
    pub radiation_global: Option<f64>,
    pub radiation_net: Option<f64>,
    pub extraterrestrial_radiation: Option<f64>,
}

impl ObservationRow {
    pub fn day_of_year(&self) -> Option<u32> {
        self.date.map(|d| d.ordinal())
    }
}

/// A station sheet as read, before the calendar is rebuilt
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawStationTable {
    pub day: Vec<RawDay>,
    pub month: Option<Vec<RawDay>>,
    pub numeric: Vec<NumericColumn>,
    pub text: Vec<TextColumn>,
}

impl RawStationTable {
    pub fn new(day: Vec<RawDay>) -> Self {
        Self {
            day,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.day.len()
    }

    pub fn is_empty(&self) -> bool {
        self.day.is_empty()
    }

    pub fn with_month(mut self, month: Vec<RawDay>) -> Self {
        self.month = Some(month);
        self
    }

    pub fn with_column(mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        self.numeric.push(NumericColumn {
            name: name.into(),
            values,
        });
        self
    }
}

/// Processing statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub stations_processed: usize,
    pub stations_failed: usize,
    pub total_rows: usize,
    pub output_path: PathBuf,
    pub processing_time_ms: u128,
}
