//! Scalar error statistics

use crate::error::EtoError;
use crate::metrics::*;
use crate::models::{DailyTable, EtoMethod};
use crate::test_support::{assert_approx_eq, consecutive_days};

fn some(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().copied().map(Some).collect()
}

#[test]
fn test_identical_series_agree_perfectly() {
    let x = some(&[3.1, 4.2, 5.0, 3.8, 4.4]);
    let scores = compute_metrics(&x, &x);
    assert_eq!(scores.rmse, Some(0.0));
    assert_eq!(scores.mae, Some(0.0));
    assert_eq!(scores.mbe, Some(0.0));
    assert_approx_eq(scores.r2.unwrap(), 1.0, 1e-12);
    assert_eq!(scores.willmott_d, Some(1.0));
}

#[test]
fn test_identical_constant_series_are_undefined_where_expected() {
    let x = some(&[4.0, 4.0, 4.0]);
    let scores = compute_metrics(&x, &x);
    assert_eq!(scores.rmse, Some(0.0));
    assert_eq!(scores.r2, None);
    assert_eq!(scores.willmott_d, None);
}

#[test]
fn test_r2_undefined_for_zero_variance_and_short_series() {
    assert_eq!(r2_score(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]), None);
    assert_eq!(r2_score(&[1.0], &[2.0]), None);
    assert_eq!(r2_score(&[], &[]), None);
}

#[test]
fn test_known_values() {
    let reference = [1.0, 2.0, 3.0, 4.0];
    let predicted = [2.0, 3.0, 4.0, 5.0];
    assert_approx_eq(rmse(&reference, &predicted).unwrap(), 1.0, 1e-12);
    assert_approx_eq(mae(&reference, &predicted).unwrap(), 1.0, 1e-12);
    assert_approx_eq(mbe(&reference, &predicted).unwrap(), 1.0, 1e-12);
    assert_approx_eq(r2_score(&reference, &predicted).unwrap(), 1.0, 1e-12);
    // mean(ref) = 2.5
    let denominator: f64 = reference
        .iter()
        .zip(&predicted)
        .map(|(r, p): (&f64, &f64)| ((p - 2.5f64).abs() + (r - 2.5f64).abs()).powi(2))
        .sum();
    assert_approx_eq(
        willmott_d(&reference, &predicted).unwrap(),
        1.0 - 4.0 / denominator,
        1e-12,
    );
}

#[test]
fn test_underestimate_gives_negative_bias() {
    assert_approx_eq(mbe(&[4.0, 6.0], &[3.0, 5.0]).unwrap(), -1.0, 1e-12);
}

#[test]
fn test_pairs_restricted_to_jointly_finite_rows() {
    let reference = vec![Some(1.0), None, Some(3.0), Some(4.0)];
    let candidate = vec![Some(1.0), Some(100.0), None, Some(6.0)];
    let scores = compute_metrics(&reference, &candidate);
    // Pairs kept: (1, 1) and (4, 6)
    assert_approx_eq(scores.mae.unwrap(), 1.0, 1e-12);
    assert_approx_eq(scores.rmse.unwrap(), 2.0f64.sqrt(), 1e-12);
}

#[test]
fn test_no_pairs_gives_all_undefined() {
    let scores = compute_metrics(&[None, Some(1.0)], &[Some(2.0), None]);
    assert_eq!(scores, MetricScores::default());
}

#[test]
fn test_sample_std_uses_n_minus_one() {
    assert_approx_eq(sample_std(&[2.0, 4.0]).unwrap(), 2.0f64.sqrt(), 1e-12);
    assert_eq!(sample_std(&[1.0]), None);
}

#[test]
fn test_pearson_anticorrelated() {
    assert_approx_eq(pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap(), -1.0, 1e-12);
}

#[test]
fn test_metrics_table_requires_reference() {
    let mut table = DailyTable::new(consecutive_days(3));
    table
        .insert_column("et_hargreaves_samani", some(&[4.0, 5.0, 6.0]))
        .unwrap();
    let result = metrics_table(
        &table,
        "manaus",
        EtoMethod::PenmanMonteith,
        &EtoMethod::ALL,
    );
    match result {
        Err(EtoError::MissingReferenceColumn { column, station }) => {
            assert_eq!(column, "et_penman_monteith");
            assert_eq!(station, "manaus");
        }
        other => panic!("Expected MissingReferenceColumn, got {:?}", other),
    }
}

#[test]
fn test_metrics_table_skips_reference_and_absent_methods() {
    let mut table = DailyTable::new(consecutive_days(3));
    table
        .insert_column("et_penman_monteith", some(&[4.0, 4.5, 5.0]))
        .unwrap();
    table
        .insert_column("et_hargreaves_samani", some(&[5.0, 5.5, 6.5]))
        .unwrap();
    table
        .insert_column("et_priestley_taylor", some(&[4.0, 4.5, 5.0]))
        .unwrap();

    let records =
        metrics_table(&table, "manaus", EtoMethod::PenmanMonteith, &EtoMethod::ALL).unwrap();
    let methods: Vec<EtoMethod> = records.iter().map(|r| r.method).collect();
    assert_eq!(
        methods,
        vec![EtoMethod::HargreavesSamani, EtoMethod::PriestleyTaylor]
    );
    assert!(records[0].scores.mbe.unwrap() > 0.0);
    assert_eq!(records[1].scores.rmse, Some(0.0));
}
