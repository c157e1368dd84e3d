//! Gap filling of daily station series.
//!
//! Rows are ordered by date, every numeric column is linearly
//! interpolated over row position, leading and trailing gaps take the
//! nearest observed value, and duplicate dates keep their first row.
//! Columns with no observation at all are removed rather than invented.

use crate::models::DailyTable;
use tracing::{debug, info};

/// What the imputer changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImputationReport {
    pub rows_in: usize,
    pub rows_out: usize,
    pub duplicates_dropped: usize,
    pub cells_filled: usize,
    pub columns_dropped: Vec<String>,
}

/// Linear interpolation over position with constant extension at both edges.
///
/// A series with no observed value stays entirely missing.
pub fn interpolate_linear(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let known: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.filter(|x| x.is_finite()).map(|x| (i, x)))
        .collect();

    let (Some(&(first_index, first_value)), Some(&(last_index, last_value))) =
        (known.first(), known.last())
    else {
        return vec![None; values.len()];
    };

    let mut filled = vec![None; values.len()];
    for slot in filled.iter_mut().take(first_index) {
        *slot = Some(first_value);
    }
    for pair in known.windows(2) {
        let (i0, y0) = pair[0];
        let (i1, y1) = pair[1];
        let span = (i1 - i0) as f64;
        for (offset, slot) in filled[i0..i1].iter_mut().enumerate() {
            *slot = Some(y0 + (y1 - y0) * offset as f64 / span);
        }
    }
    for slot in filled.iter_mut().skip(last_index) {
        *slot = Some(last_value);
    }
    filled
}

/// Fill every numeric column of a date-ordered table
pub fn impute(table: &DailyTable) -> DailyTable {
    impute_with_report(table).0
}

pub fn impute_with_report(table: &DailyTable) -> (DailyTable, ImputationReport) {
    let mut report = ImputationReport {
        rows_in: table.len(),
        ..Default::default()
    };

    // Stable sort, rows without a date go last
    let mut order: Vec<usize> = (0..table.len()).collect();
    order.sort_by_key(|&i| (table.dates()[i].is_none(), table.dates()[i]));
    let mut filled = table.take_rows(&order);

    filled.retain_numeric(|column| {
        let observed = column.values.is_empty() || column.values.iter().any(Option::is_some);
        if !observed {
            debug!("Column '{}' has no observations, dropping it", column.name);
            report.columns_dropped.push(column.name.clone());
        }
        observed
    });
    for column in filled.numeric_columns_mut() {
        report.cells_filled += column.values.iter().filter(|v| v.is_none()).count();
        column.values = interpolate_linear(&column.values);
    }

    let mut keep = Vec::with_capacity(filled.len());
    for (i, date) in filled.dates().iter().enumerate() {
        if i > 0 && filled.dates()[i - 1] == *date {
            report.duplicates_dropped += 1;
        } else {
            keep.push(i);
        }
    }
    let deduplicated = if report.duplicates_dropped > 0 {
        filled.take_rows(&keep)
    } else {
        filled
    };
    report.rows_out = deduplicated.len();

    info!(
        "Imputation complete: {} cells filled, {} duplicate dates dropped, {} rows remaining",
        report.cells_filled, report.duplicates_dropped, report.rows_out
    );

    (deduplicated, report)
}
