//! FAO-56 atmospheric derivations.
//!
//! Pure functions of one row's observations and the station context:
//! vapour pressures, the slope of the saturation curve, extraterrestrial,
//! clear-sky and net radiation, atmospheric pressure and the
//! psychrometric constant. The only whole-table decision is whether a
//! measured net radiation column can be trusted, made once per station
//! by [`select_net_radiation_source`].

use crate::config::EstimatorConfig;
use crate::constants::{columns, fao56};
use crate::models::{DailyTable, ObservationRow, StationContext};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::{debug, warn};

/// Saturation vapour pressure at `t` degC (kPa)
pub fn saturation_vapor_pressure(t: f64) -> f64 {
    0.6108 * (17.27 * t / (t + 237.3)).exp()
}

/// Mean of the saturation vapour pressures at Tmax and Tmin (kPa)
pub fn mean_saturation_vapor_pressure(tmax: f64, tmin: f64) -> f64 {
    (saturation_vapor_pressure(tmax) + saturation_vapor_pressure(tmin)) / 2.0
}

/// Actual vapour pressure from mean relative humidity (kPa).
///
/// Without humidity, `fallback_fraction` of `es_mean` is assumed.
pub fn actual_vapor_pressure(
    es_mean: f64,
    rh_mean_pct: Option<f64>,
    fallback_fraction: f64,
) -> f64 {
    match rh_mean_pct {
        Some(rh) => es_mean * rh / 100.0,
        None => es_mean * fallback_fraction,
    }
}

/// Slope of the saturation vapour pressure curve at `t_mean` (kPa/degC)
pub fn vapor_pressure_slope(t_mean: f64) -> f64 {
    4098.0 * saturation_vapor_pressure(t_mean) / (t_mean + 237.3).powi(2)
}

/// Inverse relative Earth-Sun distance
pub fn inverse_relative_distance(day_of_year: u32) -> f64 {
    1.0 + 0.033 * (2.0 * PI * f64::from(day_of_year) / 365.0).cos()
}

/// Solar declination (rad)
pub fn solar_declination(day_of_year: u32) -> f64 {
    0.409 * (2.0 * PI * f64::from(day_of_year) / 365.0 - 1.39).sin()
}

/// Sunset hour angle (rad). The argument is clamped so that polar day
/// and polar night give pi and 0 instead of NaN.
pub fn sunset_hour_angle(latitude_rad: f64, declination: f64) -> f64 {
    (-latitude_rad.tan() * declination.tan())
        .clamp(-1.0, 1.0)
        .acos()
}

/// Extraterrestrial radiation Ra (MJ m-2 day-1)
pub fn extraterrestrial_radiation(day_of_year: u32, latitude_rad: f64) -> f64 {
    let dr = inverse_relative_distance(day_of_year);
    let declination = solar_declination(day_of_year);
    let ws = sunset_hour_angle(latitude_rad, declination);
    (24.0 * 60.0 / PI)
        * fao56::SOLAR_CONSTANT
        * dr
        * (ws * latitude_rad.sin() * declination.sin()
            + latitude_rad.cos() * declination.cos() * ws.sin())
}

/// Clear-sky radiation Rso (MJ m-2 day-1).
///
/// Documented for elevations below 1000 m only; applied as is above that.
pub fn clear_sky_radiation(ra: f64, altitude_m: f64) -> f64 {
    (fao56::CLEAR_SKY_BASE + fao56::CLEAR_SKY_PER_METRE * altitude_m) * ra
}

/// Net shortwave radiation Rns (MJ m-2 day-1)
pub fn net_shortwave_radiation(rs: f64, albedo: f64) -> f64 {
    (1.0 - albedo) * rs
}

/// Net longwave radiation Rnl (MJ m-2 day-1)
pub fn net_longwave_radiation(rs: f64, rso: f64, tmax: f64, tmin: f64, ea: f64) -> f64 {
    let tmax_k = tmax + fao56::KELVIN_OFFSET;
    let tmin_k = tmin + fao56::KELVIN_OFFSET;
    let temperature_term = (tmax_k.powi(4) + tmin_k.powi(4)) / 2.0;
    let cloudiness = if rso > 0.0 {
        1.35 * (rs / rso) - 0.35
    } else {
        0.0
    };
    fao56::STEFAN_BOLTZMANN * temperature_term * (0.34 - 0.14 * ea.sqrt()) * cloudiness
}

/// Standard atmospheric pressure at `altitude_m` (kPa)
pub fn atmospheric_pressure(altitude_m: f64) -> f64 {
    fao56::SEA_LEVEL_PRESSURE_KPA * ((293.0 - 0.0065 * altitude_m) / 293.0).powf(5.26)
}

/// Psychrometric constant gamma at pressure `pressure_kpa` (kPa/degC)
pub fn psychrometric_constant(pressure_kpa: f64) -> f64 {
    fao56::PSYCHROMETRIC_COEFFICIENT * pressure_kpa
}

/// Mean temperature, falling back to the Tmax/Tmin midpoint
pub fn mean_temperature(row: &ObservationRow) -> Option<f64> {
    row.temperature_mean
        .or_else(|| Some((row.temperature_max? + row.temperature_min?) / 2.0))
}

/// Where net radiation comes from for a whole station series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetRadiationSource {
    /// The measured net radiation column is used as is
    Measured,
    /// Rn = (1 - albedo) Rs - Rnl
    Computed,
}

/// Trust a measured net radiation column only when its mean ratio to
/// global radiation stays below `config.net_radiation_ratio_bound`.
pub fn select_net_radiation_source(
    table: &DailyTable,
    config: &EstimatorConfig,
) -> NetRadiationSource {
    let (Some(net), Some(global)) = (
        table.column(columns::RADIATION_NET),
        table.column(columns::RADIATION_GLOBAL),
    ) else {
        return NetRadiationSource::Computed;
    };

    let ratios: Vec<f64> = net
        .iter()
        .zip(global)
        .filter_map(|(rn, rs)| Some(rn.as_ref()? / rs.as_ref()?))
        .filter(|ratio| ratio.is_finite())
        .collect();

    if ratios.is_empty() {
        debug!("No usable Rn/Rs ratios, computing net radiation");
        return NetRadiationSource::Computed;
    }

    let mean_ratio = ratios.iter().sum::<f64>() / ratios.len() as f64;
    if mean_ratio < config.net_radiation_ratio_bound {
        debug!("Measured net radiation accepted (mean Rn/Rs = {:.3})", mean_ratio);
        NetRadiationSource::Measured
    } else {
        warn!(
            "Measured net radiation rejected (mean Rn/Rs = {:.3} >= {}), computing it instead",
            mean_ratio, config.net_radiation_ratio_bound
        );
        NetRadiationSource::Computed
    }
}

/// Per-row derived quantities. `None` where an input is absent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DerivedAtmosphere {
    pub es_max: Option<f64>,
    pub es_min: Option<f64>,
    pub es_mean: Option<f64>,
    pub ea: Option<f64>,
    pub delta: Option<f64>,
    pub ra: Option<f64>,
    pub rso: Option<f64>,
    pub rns: Option<f64>,
    pub rnl: Option<f64>,
    pub rn: Option<f64>,
    pub gamma: f64,
    pub pressure_kpa: f64,
}

/// Station-level derivation context, built once per station run
#[derive(Debug, Clone, PartialEq)]
pub struct AtmosphereModel {
    latitude_rad: f64,
    altitude_m: f64,
    pressure_kpa: f64,
    gamma: f64,
    albedo: f64,
    humidity_fallback_fraction: f64,
    net_radiation: NetRadiationSource,
}

impl AtmosphereModel {
    pub fn new(
        station: &StationContext,
        config: &EstimatorConfig,
        net_radiation: NetRadiationSource,
    ) -> Self {
        if station.altitude_m >= fao56::CLEAR_SKY_VALID_BELOW_M {
            warn!(
                "Station {} sits at {} m, clear-sky radiation is uncorrected above {} m",
                station.name,
                station.altitude_m,
                fao56::CLEAR_SKY_VALID_BELOW_M
            );
        }
        let pressure_kpa = atmospheric_pressure(station.altitude_m);
        Self {
            latitude_rad: station.latitude_rad(),
            altitude_m: station.altitude_m,
            pressure_kpa,
            gamma: psychrometric_constant(pressure_kpa),
            albedo: config.albedo,
            humidity_fallback_fraction: config.humidity_fallback_fraction,
            net_radiation,
        }
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn pressure_kpa(&self) -> f64 {
        self.pressure_kpa
    }

    pub fn net_radiation_source(&self) -> NetRadiationSource {
        self.net_radiation
    }

    pub fn derive(&self, row: &ObservationRow) -> DerivedAtmosphere {
        let es_max = row.temperature_max.map(saturation_vapor_pressure);
        let es_min = row.temperature_min.map(saturation_vapor_pressure);
        let es_mean = es_max.zip(es_min).map(|(hi, lo)| (hi + lo) / 2.0);
        let ea = es_mean.map(|es| {
            actual_vapor_pressure(es, row.humidity_mean, self.humidity_fallback_fraction)
        });
        let delta = mean_temperature(row).map(vapor_pressure_slope);

        let ra = row.extraterrestrial_radiation.or_else(|| {
            row.day_of_year()
                .map(|doy| extraterrestrial_radiation(doy, self.latitude_rad))
        });
        let rso = ra.map(|ra| clear_sky_radiation(ra, self.altitude_m));
        let rns = row
            .radiation_global
            .map(|rs| net_shortwave_radiation(rs, self.albedo));
        let rnl = (|| {
            Some(net_longwave_radiation(
                row.radiation_global?,
                rso?,
                row.temperature_max?,
                row.temperature_min?,
                ea?,
            ))
        })();
        let computed_rn = rns.zip(rnl).map(|(rns, rnl)| rns - rnl);
        let rn = match self.net_radiation {
            NetRadiationSource::Measured => row.radiation_net.or(computed_rn),
            NetRadiationSource::Computed => computed_rn,
        };

        DerivedAtmosphere {
            es_max,
            es_min,
            es_mean,
            ea,
            delta,
            ra,
            rso,
            rns,
            rnl,
            rn,
            gamma: self.gamma,
            pressure_kpa: self.pressure_kpa,
        }
    }
}

/// Derive one row with computed net radiation
pub fn derive_atmosphere(
    row: &ObservationRow,
    station: &StationContext,
    config: &EstimatorConfig,
) -> DerivedAtmosphere {
    AtmosphereModel::new(station, config, NetRadiationSource::Computed).derive(row)
}
