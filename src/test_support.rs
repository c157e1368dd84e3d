//! Shared helpers for unit tests

use crate::models::DailyTable;
use chrono::{Days, NaiveDate};

/// Assert that two f64 values are approximately equal
pub fn assert_approx_eq(a: f64, b: f64, tolerance: f64) {
    assert!(
        (a - b).abs() < tolerance,
        "Values {} and {} are not approximately equal (tolerance: {})",
        a,
        b,
        tolerance
    );
}

/// Consecutive dates starting at 2024-01-01
pub fn consecutive_days(count: usize) -> Vec<Option<NaiveDate>> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..count)
        .map(|i| start.checked_add_days(Days::new(i as u64)))
        .collect()
}

/// A Manaus-like table with constant tropical weather
pub fn constant_weather_table(count: usize) -> DailyTable {
    let mut table = DailyTable::new(consecutive_days(count));
    let constant = |value: f64| vec![Some(value); count];
    table.insert_column("tmed_c", constant(27.0)).unwrap();
    table.insert_column("tmax_c", constant(32.0)).unwrap();
    table.insert_column("tmin_c", constant(22.0)).unwrap();
    table.insert_column("rh_mean_pct", constant(75.0)).unwrap();
    table.insert_column("wind_mean_ms", constant(1.5)).unwrap();
    table.insert_column("rad_global_mj_m2_d", constant(18.0)).unwrap();
    table
}
