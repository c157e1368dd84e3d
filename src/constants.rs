//! Application constants for the ETo processor
//!
//! Column names, header aliases, FAO-56 physical coefficients and the
//! default values that seed `EstimatorConfig`.

// =============================================================================
// Run Defaults
// =============================================================================

/// Year assumed for day columns that carry no year of their own
pub const DEFAULT_YEAR: i32 = 2024;

/// Window length (days) for the trailing rolling mean
pub const DEFAULT_ROLLING_WINDOW: usize = 7;

/// File name suffixes produced per station
pub const CLEANED_SUFFIX: &str = "daily";
pub const ESTIMATES_SUFFIX: &str = "estimates";
/// Followed by the window length, e.g. `rolling7d`
pub const ROLLING_SUFFIX: &str = "rolling";
pub const MONTHLY_TOTALS_SUFFIX: &str = "monthly_totals";
pub const DAILY_METRICS_SUFFIX: &str = "daily_metrics";
pub const MONTHLY_METRICS_SUFFIX: &str = "monthly_metrics";
pub const DAILY_TAYLOR_SUFFIX: &str = "daily_taylor";
pub const MONTHLY_TAYLOR_SUFFIX: &str = "monthly_taylor";

// =============================================================================
// Semantic Column Names
// =============================================================================

/// Semantic observation column names used throughout the core
pub mod columns {
    pub const DATE: &str = "date";
    pub const MONTH: &str = "month";
    pub const TEMPERATURE_MEAN: &str = "tmed_c";
    pub const TEMPERATURE_MAX: &str = "tmax_c";
    pub const TEMPERATURE_MIN: &str = "tmin_c";
    pub const HUMIDITY_MEAN: &str = "rh_mean_pct";
    pub const HUMIDITY_MAX: &str = "rh_max_pct";
    pub const HUMIDITY_MIN: &str = "rh_min_pct";
    pub const WIND_MEAN: &str = "wind_mean_ms";
    pub const WIND_MAX: &str = "wind_max_ms";
    pub const RAINFALL: &str = "rain_mm";
    pub const RADIATION_GLOBAL: &str = "rad_global_mj_m2_d";
    pub const RADIATION_NET: &str = "rad_net_mj_m2_d";
    pub const RADIATION_EXTRATERRESTRIAL: &str = "ra_extraterrestre_mj_m2_d";

    /// Observation columns in output order
    pub const OBSERVATIONS: &[&str] = &[
        TEMPERATURE_MEAN,
        TEMPERATURE_MAX,
        TEMPERATURE_MIN,
        HUMIDITY_MEAN,
        HUMIDITY_MAX,
        HUMIDITY_MIN,
        WIND_MEAN,
        WIND_MAX,
        RAINFALL,
        RADIATION_GLOBAL,
        RADIATION_NET,
        RADIATION_EXTRATERRESTRIAL,
    ];
}

/// Spreadsheet headers mapped onto semantic column names
pub const WEATHER_HEADER_ALIASES: &[(&str, &str)] = &[
    ("DIA", columns::DATE),
    ("MES", columns::MONTH),
    ("Mês", columns::MONTH),
    ("TMED (oC)", columns::TEMPERATURE_MEAN),
    ("TMAX (oC)", columns::TEMPERATURE_MAX),
    ("TMIN (oC)", columns::TEMPERATURE_MIN),
    ("UR MED (%)", columns::HUMIDITY_MEAN),
    ("UR MAX (%)", columns::HUMIDITY_MAX),
    ("UR MIN (%)", columns::HUMIDITY_MIN),
    ("Vento (m/s)", columns::WIND_MEAN),
    ("Vel.Vento Max (m/s)", columns::WIND_MAX),
    ("Chuva (mm)", columns::RAINFALL),
    ("Rad.Glob. (MJ/m2.d)", columns::RADIATION_GLOBAL),
    ("Rad. Global (MJ/ma^2)", columns::RADIATION_GLOBAL),
    ("Rad Liq (MJ/m2.d)", columns::RADIATION_NET),
    ("Rad. Líquida (MJ/ma^2)", columns::RADIATION_NET),
    ("Q_0", columns::RADIATION_EXTRATERRESTRIAL),
];

/// Header prefix of spreadsheet index columns that carry no data
pub const UNNAMED_COLUMN_PREFIX: &str = "Unnamed";

// =============================================================================
// FAO-56 Coefficients
// =============================================================================

/// Physical coefficients of the FAO-56 derivations
pub mod fao56 {
    /// Solar constant (MJ m-2 min-1)
    pub const SOLAR_CONSTANT: f64 = 0.0820;

    /// Stefan-Boltzmann constant (MJ K-4 m-2 day-1)
    pub const STEFAN_BOLTZMANN: f64 = 4.903e-9;

    /// Celsius to Kelvin offset used by the longwave term
    pub const KELVIN_OFFSET: f64 = 273.16;

    /// Sea level standard atmospheric pressure (kPa)
    pub const SEA_LEVEL_PRESSURE_KPA: f64 = 101.3;

    /// Psychrometric coefficient (cp / (epsilon * lambda)), kPa per kPa
    pub const PSYCHROMETRIC_COEFFICIENT: f64 = 0.000665;

    /// Radiation to evaporation-equivalent conversion (mm per MJ m-2)
    pub const RADIATION_TO_EVAPORATION: f64 = 0.408;

    /// Clear-sky fraction at sea level
    pub const CLEAR_SKY_BASE: f64 = 0.75;

    /// Clear-sky fraction increase per metre of elevation
    pub const CLEAR_SKY_PER_METRE: f64 = 2e-5;

    /// Elevation above which the clear-sky approximation is not documented
    pub const CLEAR_SKY_VALID_BELOW_M: f64 = 1000.0;

    /// Hargreaves-Samani empirical coefficient
    pub const HARGREAVES_COEFFICIENT: f64 = 0.0023;

    /// Hargreaves-Samani temperature offset (degC)
    pub const HARGREAVES_TEMPERATURE_OFFSET: f64 = 17.8;
}

// =============================================================================
// Estimator Defaults
// =============================================================================

/// Surface albedo of the grass reference crop
pub const DEFAULT_ALBEDO: f64 = 0.23;

/// Priestley-Taylor alpha coefficient
pub const DEFAULT_PRIESTLEY_TAYLOR_ALPHA: f64 = 1.26;

/// Daily soil heat flux (MJ m-2 day-1)
pub const DEFAULT_SOIL_HEAT_FLUX: f64 = 0.0;

/// Substituted 2 m wind speed when wind is not observed (m/s)
pub const DEFAULT_WIND_FALLBACK_MS: f64 = 2.0;

/// Fraction of mean saturation vapour pressure assumed when humidity is missing
pub const DEFAULT_HUMIDITY_FALLBACK_FRACTION: f64 = 0.70;

/// Upper bound on mean Rn/Rs for a measured net radiation column to be trusted
pub const DEFAULT_NET_RADIATION_RATIO_BOUND: f64 = 1.2;
