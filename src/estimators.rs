//! ETo estimator bank.
//!
//! Each formula is a pure function of one row's derived atmosphere and
//! its raw temperatures and wind. Estimators never read each other's
//! output. The bank maps them over a cleaned table and carries the
//! methods it does not compute through from the source columns.

use crate::atmosphere::{
    AtmosphereModel, DerivedAtmosphere, NetRadiationSource, mean_temperature,
    select_net_radiation_source,
};
use crate::config::{EstimatorConfig, PipelineConfig};
use crate::constants::fao56;
use crate::error::Result;
use crate::models::{DailyTable, EtoMethod, ObservationRow, StationContext};
use serde::Serialize;
use tracing::{debug, info, warn};

/// FAO-56 Penman-Monteith (mm/day). `None` when the denominator is zero.
#[allow(clippy::too_many_arguments)]
pub fn penman_monteith(
    delta: f64,
    rn: f64,
    soil_heat_flux: f64,
    gamma: f64,
    t_mean: f64,
    u2: f64,
    es: f64,
    ea: f64,
) -> Option<f64> {
    let numerator = fao56::RADIATION_TO_EVAPORATION * delta * (rn - soil_heat_flux)
        + gamma * (900.0 / (t_mean + 273.0)) * u2 * (es - ea);
    let denominator = delta + gamma * (1.0 + 0.34 * u2);
    if denominator == 0.0 {
        return None;
    }
    Some(numerator / denominator).filter(|v| v.is_finite())
}

/// Priestley-Taylor (mm/day). `None` when delta + gamma is zero.
pub fn priestley_taylor(
    delta: f64,
    gamma: f64,
    rn: f64,
    soil_heat_flux: f64,
    alpha: f64,
) -> Option<f64> {
    if delta + gamma == 0.0 {
        return None;
    }
    let weight = delta / (delta + gamma);
    Some(alpha * weight * fao56::RADIATION_TO_EVAPORATION * (rn - soil_heat_flux))
        .filter(|v| v.is_finite())
}

/// Hargreaves-Samani (mm/day) with Ra in MJ m-2 day-1.
///
/// A negative diurnal range is treated as zero.
pub fn hargreaves_samani(t_mean: f64, t_max: f64, t_min: f64, ra: f64) -> f64 {
    fao56::HARGREAVES_COEFFICIENT
        * (t_mean + fao56::HARGREAVES_TEMPERATURE_OFFSET)
        * (t_max - t_min).max(0.0).sqrt()
        * ra
}

/// Evaluate one method on one row.
///
/// Methods that are only carried through from the source give `None`,
/// as does any method whose inputs are absent for the row.
pub fn estimate_eto(
    method: EtoMethod,
    row: &ObservationRow,
    derived: &DerivedAtmosphere,
    config: &EstimatorConfig,
) -> Option<f64> {
    match method {
        EtoMethod::PenmanMonteith => {
            let u2 = row.wind_mean.unwrap_or(config.wind_fallback_ms);
            penman_monteith(
                derived.delta?,
                derived.rn?,
                config.soil_heat_flux,
                derived.gamma,
                mean_temperature(row)?,
                u2,
                derived.es_mean?,
                derived.ea?,
            )
        }
        EtoMethod::PriestleyTaylor => priestley_taylor(
            derived.delta?,
            derived.gamma,
            derived.rn?,
            config.soil_heat_flux,
            config.priestley_taylor_alpha,
        ),
        EtoMethod::HargreavesSamani => Some(hargreaves_samani(
            mean_temperature(row)?,
            row.temperature_max?,
            row.temperature_min?,
            derived.ra?,
        )),
        EtoMethod::Thornthwaite
        | EtoMethod::ThornthwaiteCamargo
        | EtoMethod::Camargo
        | EtoMethod::HargreavesSamaniCorrected
        | EtoMethod::GarciaLopez => None,
    }
}

/// Where a method column of the estimate table came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimateOrigin {
    Computed,
    Source,
}

/// One column per available method, aligned with the cleaned table's dates
#[derive(Debug, Clone, PartialEq)]
pub struct EstimateTable {
    pub table: DailyTable,
    pub origins: Vec<(EtoMethod, EstimateOrigin)>,
    pub net_radiation: NetRadiationSource,
}

impl EstimateTable {
    pub fn methods(&self) -> impl Iterator<Item = EtoMethod> + '_ {
        self.origins.iter().map(|(method, _)| *method)
    }

    pub fn origin(&self, method: EtoMethod) -> Option<EstimateOrigin> {
        self.origins
            .iter()
            .find(|(m, _)| *m == method)
            .map(|(_, origin)| *origin)
    }
}

/// Run the bank over a cleaned table.
///
/// A source estimate column backs up a computed method: it fills rows the
/// computation leaves undefined and replaces the method outright when no
/// row can be computed.
pub fn build_estimate_table(
    cleaned: &DailyTable,
    station: &StationContext,
    config: &PipelineConfig,
) -> Result<EstimateTable> {
    let net_radiation = select_net_radiation_source(cleaned, &config.estimator);
    let model = AtmosphereModel::new(station, &config.estimator, net_radiation);

    let rows: Vec<ObservationRow> = cleaned.rows().collect();
    let derived: Vec<DerivedAtmosphere> = rows.iter().map(|row| model.derive(row)).collect();

    let mut table = DailyTable::new(cleaned.dates().to_vec());
    let mut origins = Vec::new();

    for method in EtoMethod::ALL {
        let source = cleaned.column(method.column_name());
        let use_source =
            source.is_some() && (config.prefer_source_estimates || !method.is_computed());

        if use_source {
            if let Some(values) = source {
                table.insert_column(method.column_name(), values.to_vec())?;
                origins.push((method, EstimateOrigin::Source));
                debug!("{}: carried through from source column", method);
            }
            continue;
        }
        if !method.is_computed() {
            continue;
        }

        let mut values: Vec<Option<f64>> = rows
            .iter()
            .zip(&derived)
            .map(|(row, atmosphere)| estimate_eto(method, row, atmosphere, &config.estimator))
            .collect();

        let defined = values.iter().filter(|v| v.is_some()).count();
        if defined == 0 {
            match source {
                Some(source_values) => {
                    warn!(
                        "{}: inputs missing at {}, using the source column",
                        method, station.name
                    );
                    table.insert_column(method.column_name(), source_values.to_vec())?;
                    origins.push((method, EstimateOrigin::Source));
                }
                None => warn!(
                    "{}: inputs missing at {}, method omitted",
                    method, station.name
                ),
            }
            continue;
        }
        if defined < values.len() {
            let mut filled = 0;
            if let Some(source_values) = source {
                for (value, fallback) in values.iter_mut().zip(source_values) {
                    if value.is_none() && fallback.is_some() {
                        *value = *fallback;
                        filled += 1;
                    }
                }
            }
            debug!(
                "{}: {} of {} rows undefined, {} filled from source",
                method,
                values.len() - defined,
                values.len(),
                filled
            );
        }
        table.insert_column(method.column_name(), values)?;
        origins.push((method, EstimateOrigin::Computed));
    }

    info!(
        "Estimated {} methods over {} days for {} (net radiation: {:?})",
        origins.len(),
        table.len(),
        station.name,
        net_radiation
    );

    Ok(EstimateTable {
        table,
        origins,
        net_radiation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atmosphere::derive_atmosphere;
    use crate::test_support::{assert_approx_eq, constant_weather_table};
    use chrono::NaiveDate;

    fn manaus_row() -> ObservationRow {
        ObservationRow {
            date: NaiveDate::from_ymd_opt(2024, 1, 15),
            temperature_mean: Some(27.0),
            temperature_max: Some(32.0),
            temperature_min: Some(22.0),
            humidity_mean: Some(75.0),
            wind_mean: Some(1.5),
            radiation_global: Some(18.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_penman_monteith_fao_example() {
        // FAO-56 Example 18 (Brussels, 6 July)
        let et0 = penman_monteith(0.122, 13.28, 0.0, 0.0666, 16.9, 2.078, 1.997, 1.409).unwrap();
        assert_approx_eq(et0, 3.9, 0.05);
    }

    #[test]
    fn test_penman_monteith_zero_denominator_is_undefined() {
        assert_eq!(penman_monteith(0.0, 10.0, 0.0, 0.0, 20.0, 2.0, 2.0, 1.0), None);
    }

    #[test]
    fn test_priestley_taylor_scales_with_alpha() {
        let base = priestley_taylor(0.2, 0.067, 12.0, 0.0, 1.0).unwrap();
        let scaled = priestley_taylor(0.2, 0.067, 12.0, 0.0, 1.26).unwrap();
        assert_approx_eq(scaled, base * 1.26, 1e-12);
        assert_eq!(priestley_taylor(0.0, 0.0, 12.0, 0.0, 1.26), None);
    }

    #[test]
    fn test_hargreaves_negative_range_clamps_to_zero() {
        assert_eq!(hargreaves_samani(25.0, 20.0, 22.0, 35.0), 0.0);
        assert!(hargreaves_samani(25.0, 30.0, 20.0, 35.0) > 0.0);
    }

    #[test]
    fn test_manaus_constant_inputs_plausible() {
        let row = manaus_row();
        let config = EstimatorConfig::default();
        let derived = derive_atmosphere(&row, &StationContext::manaus(), &config);

        let pm = estimate_eto(EtoMethod::PenmanMonteith, &row, &derived, &config).unwrap();
        assert!(pm.is_finite() && (3.0..=6.0).contains(&pm), "PM = {}", pm);

        let hs = estimate_eto(EtoMethod::HargreavesSamani, &row, &derived, &config).unwrap();
        assert!(hs.is_finite() && hs > 0.0);

        let pt = estimate_eto(EtoMethod::PriestleyTaylor, &row, &derived, &config).unwrap();
        assert!(pt > 0.0);
    }

    #[test]
    fn test_missing_wind_uses_fallback() {
        let config = EstimatorConfig::default();
        let station = StationContext::manaus();
        let observed = ObservationRow {
            wind_mean: Some(2.0),
            ..manaus_row()
        };
        let missing = ObservationRow {
            wind_mean: None,
            ..manaus_row()
        };
        let with_wind = estimate_eto(
            EtoMethod::PenmanMonteith,
            &observed,
            &derive_atmosphere(&observed, &station, &config),
            &config,
        );
        let without_wind = estimate_eto(
            EtoMethod::PenmanMonteith,
            &missing,
            &derive_atmosphere(&missing, &station, &config),
            &config,
        );
        assert_eq!(with_wind, without_wind);
    }

    #[test]
    fn test_passthrough_methods_are_not_computed() {
        let row = manaus_row();
        let config = EstimatorConfig::default();
        let derived = derive_atmosphere(&row, &StationContext::manaus(), &config);
        for method in EtoMethod::ALL.into_iter().filter(|m| !m.is_computed()) {
            assert_eq!(estimate_eto(method, &row, &derived, &config), None);
        }
    }

    #[test]
    fn test_estimate_table_computes_and_carries_through() {
        let mut cleaned = constant_weather_table(10);
        cleaned
            .insert_column("et_camargo", vec![Some(4.0); 10])
            .unwrap();
        cleaned
            .insert_column("et_penman_monteith", vec![Some(99.0); 10])
            .unwrap();

        let config = PipelineConfig::default();
        let estimates = build_estimate_table(&cleaned, &StationContext::manaus(), &config).unwrap();

        assert_eq!(estimates.origin(EtoMethod::Camargo), Some(EstimateOrigin::Source));
        assert_eq!(
            estimates.origin(EtoMethod::PenmanMonteith),
            Some(EstimateOrigin::Computed)
        );
        assert_eq!(estimates.origin(EtoMethod::Thornthwaite), None);
        let pm = estimates.table.column("et_penman_monteith").unwrap();
        assert!(pm.iter().all(|v| v.is_some_and(|x| x < 10.0)));
        assert_eq!(estimates.table.len(), 10);
    }

    #[test]
    fn test_estimate_table_prefers_source_when_configured() {
        let mut cleaned = constant_weather_table(3);
        cleaned
            .insert_column("et_penman_monteith", vec![Some(5.5); 3])
            .unwrap();
        let config = PipelineConfig::default().with_source_estimates();
        let estimates = build_estimate_table(&cleaned, &StationContext::manaus(), &config).unwrap();
        assert_eq!(
            estimates.table.column("et_penman_monteith").unwrap(),
            &[Some(5.5); 3]
        );
        assert_eq!(
            estimates.origin(EtoMethod::PenmanMonteith),
            Some(EstimateOrigin::Source)
        );
    }

    #[test]
    fn test_source_column_used_when_inputs_missing() {
        let mut cleaned = DailyTable::new(vec![
            NaiveDate::from_ymd_opt(2024, 1, 1),
            NaiveDate::from_ymd_opt(2024, 1, 2),
        ]);
        cleaned.insert_column("tmed_c", vec![Some(26.0), Some(27.0)]).unwrap();
        cleaned
            .insert_column("et_penman_monteith", vec![Some(4.2), Some(4.4)])
            .unwrap();

        let estimates =
            build_estimate_table(&cleaned, &StationContext::manaus(), &PipelineConfig::default())
                .unwrap();
        assert_eq!(
            estimates.origin(EtoMethod::PenmanMonteith),
            Some(EstimateOrigin::Source)
        );
        assert_eq!(
            estimates.table.column("et_penman_monteith").unwrap(),
            &[Some(4.2), Some(4.4)]
        );
        assert_eq!(estimates.origin(EtoMethod::PriestleyTaylor), None);
    }

    #[test]
    fn test_undefined_rows_filled_from_source() {
        let mut cleaned = constant_weather_table(3);
        cleaned.remove_column("rad_global_mj_m2_d");
        cleaned
            .insert_column("rad_global_mj_m2_d", vec![Some(18.0), None, Some(18.0)])
            .unwrap();
        cleaned
            .insert_column("et_penman_monteith", vec![Some(9.0); 3])
            .unwrap();

        let estimates =
            build_estimate_table(&cleaned, &StationContext::manaus(), &PipelineConfig::default())
                .unwrap();
        let pm = estimates.table.column("et_penman_monteith").unwrap();
        assert!(pm[0].is_some_and(|v| v < 9.0));
        assert_eq!(pm[1], Some(9.0));
        assert_eq!(
            estimates.origin(EtoMethod::PenmanMonteith),
            Some(EstimateOrigin::Computed)
        );
    }

    #[test]
    fn test_estimate_table_omits_methods_without_inputs() {
        let mut cleaned = DailyTable::new(vec![NaiveDate::from_ymd_opt(2024, 1, 1)]);
        cleaned.insert_column("tmed_c", vec![Some(25.0)]).unwrap();
        let estimates =
            build_estimate_table(&cleaned, &StationContext::manaus(), &PipelineConfig::default())
                .unwrap();
        assert_eq!(estimates.methods().count(), 0);
    }
}
