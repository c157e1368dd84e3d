//! Temporal aggregation of daily tables

use crate::error::{EtoError, Result};
use crate::models::DailyTable;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
}

/// Sum `columns` per calendar month.
///
/// The result has one row per month keyed by its first day. A month with
/// no finite value for a column gives `None` for that cell. Rows without
/// a date are left out.
pub fn monthly_sum(table: &DailyTable, columns: &[&str]) -> Result<DailyTable> {
    let mut sources = Vec::with_capacity(columns.len());
    for &name in columns {
        let values = table.column(name).ok_or_else(|| EtoError::MissingColumn {
            column: name.to_string(),
        })?;
        sources.push((name, values));
    }

    let mut months: BTreeMap<NaiveDate, Vec<usize>> = BTreeMap::new();
    for (row, date) in table.dates().iter().enumerate() {
        if let Some(month) = date.and_then(month_start) {
            months.entry(month).or_default().push(row);
        }
    }

    let mut monthly = DailyTable::new(months.keys().copied().map(Some).collect());
    for (name, values) in sources {
        let sums = months
            .values()
            .map(|rows| {
                rows.iter()
                    .filter_map(|&row| values[row])
                    .reduce(|total, value| total + value)
            })
            .collect();
        monthly.insert_column(name, sums)?;
    }

    debug!(
        "Aggregated {} days into {} months",
        table.len(),
        monthly.len()
    );
    Ok(monthly)
}

/// Trailing mean over `window` rows, counting whatever values the window holds
pub fn rolling_window_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    (0..values.len())
        .map(|end| {
            let start = (end + 1).saturating_sub(window);
            let (sum, count) = values[start..=end]
                .iter()
                .flatten()
                .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
            (count > 0).then(|| sum / count as f64)
        })
        .collect()
}

/// Order rows by date and replace every numeric column by its trailing mean
pub fn rolling_mean(table: &DailyTable, window: usize) -> DailyTable {
    let mut order: Vec<usize> = (0..table.len()).collect();
    order.sort_by_key(|&i| (table.dates()[i].is_none(), table.dates()[i]));
    let mut rolled = table.take_rows(&order);
    for column in rolled.numeric_columns_mut() {
        column.values = rolling_window_mean(&column.values, window);
    }
    rolled
}
