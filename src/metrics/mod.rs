//! Agreement metrics between estimators and the reference method.
//!
//! Every statistic works on the rows where reference and candidate are
//! both finite. Statistics that are mathematically undefined for the
//! remaining sample come back as `None`. Standard deviations use the
//! sample divisor (n - 1) everywhere so that R² and the Taylor
//! statistics agree.

pub mod taylor;

#[cfg(test)]
pub mod tests;

pub use self::taylor::{
    TaylorDiagram, TaylorPlacement, TaylorStats, taylor_diagram, taylor_statistics,
};

use crate::error::{EtoError, Result};
use crate::models::{DailyTable, EtoMethod};
use serde::Serialize;
use tracing::debug;

/// Reference/candidate pairs where both values are finite
pub fn paired_finite(reference: &[Option<f64>], candidate: &[Option<f64>]) -> (Vec<f64>, Vec<f64>) {
    reference
        .iter()
        .zip(candidate)
        .filter_map(|(r, c)| match (r, c) {
            (Some(r), Some(c)) if r.is_finite() && c.is_finite() => Some((*r, *c)),
            _ => None,
        })
        .unzip()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation, `None` below two values
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Pearson correlation of equal-length samples.
///
/// `None` below two points, for a zero-variance input, or when the
/// result is not finite.
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let (std_a, std_b) = (sample_std(a)?, sample_std(b)?);
    if std_a == 0.0 || std_b == 0.0 {
        return None;
    }
    let (mean_a, mean_b) = (mean(a)?, mean(b)?);
    let covariance = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum::<f64>()
        / (a.len() - 1) as f64;
    Some(covariance / (std_a * std_b))
        .map(|r| r.clamp(-1.0, 1.0))
        .filter(|r| r.is_finite())
}

pub fn rmse(reference: &[f64], predicted: &[f64]) -> Option<f64> {
    let squared: Vec<f64> = reference
        .iter()
        .zip(predicted)
        .map(|(r, p)| (r - p).powi(2))
        .collect();
    mean(&squared).map(f64::sqrt)
}

pub fn mae(reference: &[f64], predicted: &[f64]) -> Option<f64> {
    let absolute: Vec<f64> = reference
        .iter()
        .zip(predicted)
        .map(|(r, p)| (r - p).abs())
        .collect();
    mean(&absolute)
}

/// Mean bias, positive when the candidate overestimates
pub fn mbe(reference: &[f64], predicted: &[f64]) -> Option<f64> {
    let bias: Vec<f64> = reference
        .iter()
        .zip(predicted)
        .map(|(r, p)| p - r)
        .collect();
    mean(&bias)
}

pub fn r2_score(reference: &[f64], predicted: &[f64]) -> Option<f64> {
    pearson(reference, predicted).map(|r| r * r)
}

/// Willmott's index of agreement, `None` when the denominator is zero
pub fn willmott_d(reference: &[f64], predicted: &[f64]) -> Option<f64> {
    let reference_mean = mean(reference)?;
    let denominator: f64 = reference
        .iter()
        .zip(predicted)
        .map(|(r, p)| ((p - reference_mean).abs() + (r - reference_mean).abs()).powi(2))
        .sum();
    if denominator == 0.0 {
        return None;
    }
    let numerator: f64 = reference
        .iter()
        .zip(predicted)
        .map(|(r, p)| (p - r).powi(2))
        .sum();
    Some(1.0 - numerator / denominator)
}

/// Error statistics of one candidate series against the reference
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MetricScores {
    pub rmse: Option<f64>,
    pub mae: Option<f64>,
    pub mbe: Option<f64>,
    pub r2: Option<f64>,
    pub willmott_d: Option<f64>,
}

pub fn compute_metrics(reference: &[Option<f64>], candidate: &[Option<f64>]) -> MetricScores {
    let (reference, candidate) = paired_finite(reference, candidate);
    MetricScores {
        rmse: rmse(&reference, &candidate),
        mae: mae(&reference, &candidate),
        mbe: mbe(&reference, &candidate),
        r2: r2_score(&reference, &candidate),
        willmott_d: willmott_d(&reference, &candidate),
    }
}

/// One row of a metric table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecord {
    pub method: EtoMethod,
    #[serde(flatten)]
    pub scores: MetricScores,
}

/// Score every available non-reference method against `reference`.
///
/// A missing reference column is a configuration error. Methods absent
/// from the table are skipped.
pub fn metrics_table(
    table: &DailyTable,
    station: &str,
    reference: EtoMethod,
    methods: &[EtoMethod],
) -> Result<Vec<MetricRecord>> {
    let reference_values =
        table
            .column(reference.column_name())
            .ok_or_else(|| EtoError::MissingReferenceColumn {
                column: reference.column_name().to_string(),
                station: station.to_string(),
            })?;

    let mut records = Vec::new();
    for &method in methods.iter().filter(|m| **m != reference) {
        let Some(candidate) = table.column(method.column_name()) else {
            debug!("{}: no column for {}, skipping", station, method);
            continue;
        };
        records.push(MetricRecord {
            method,
            scores: compute_metrics(reference_values, candidate),
        });
    }
    Ok(records)
}
