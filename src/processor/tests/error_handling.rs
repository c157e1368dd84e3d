//! Error handling tests

use crate::config::PipelineConfig;
use crate::error::EtoError;
use crate::models::StationContext;
use crate::processor::{Stage, StationProcessor};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_nonexistent_input_path() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nonexistent");

    match StationProcessor::new(missing.clone(), None, PipelineConfig::default()) {
        Err(EtoError::InputNotFound { path }) => assert_eq!(path, missing),
        other => panic!("Expected InputNotFound, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_missing_station_sheet() {
    let temp_dir = TempDir::new().unwrap();
    let processor =
        StationProcessor::new(temp_dir.path().to_path_buf(), None, PipelineConfig::default())
            .unwrap();
    let result = processor.process_station(&StationContext::piracicaba());
    match result {
        Err(EtoError::InputNotFound { path }) => {
            assert!(path.ends_with("piracicaba.csv"));
        }
        other => panic!("Expected InputNotFound, got {:?}", other),
    }
}

#[test]
fn test_missing_reference_column_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("manaus.csv"),
        "DIA,TMED (oC),TMAX (oC),TMIN (oC)\n1,27,32,22\n2,27.5,32.5,22.4\n3,26.9,31.8,21.9\n",
    )
    .unwrap();
    let processor =
        StationProcessor::new(temp_dir.path().to_path_buf(), None, PipelineConfig::default())
            .unwrap();
    let result = processor.process_station(&StationContext::manaus());
    assert!(matches!(
        result,
        Err(EtoError::MissingReferenceColumn { .. })
    ));
}

#[test]
fn test_estimate_stage_needs_cleaned_table() {
    let temp_dir = TempDir::new().unwrap();
    super::write_raw_sheet(temp_dir.path(), "manaus", 5);
    let processor =
        StationProcessor::new(temp_dir.path().to_path_buf(), None, PipelineConfig::default())
            .unwrap()
            .with_stage(Stage::Estimate);
    assert!(matches!(
        processor.input_for("manaus"),
        Err(EtoError::InputNotFound { .. })
    ));
}

#[test]
fn test_invalid_config_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = PipelineConfig::default();
    config.rolling_window = 0;
    assert!(matches!(
        StationProcessor::new(temp_dir.path().to_path_buf(), None, config),
        Err(EtoError::Configuration { .. })
    ));
}
