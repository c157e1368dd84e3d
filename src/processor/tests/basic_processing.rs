//! Single station processing tests

use super::write_raw_sheet;
use crate::config::{OutputFormat, PipelineConfig};
use crate::models::StationContext;
use crate::processor::reader::read_daily_table;
use crate::processor::{Stage, StationProcessor};
use tempfile::TempDir;

#[tokio::test(flavor = "multi_thread")]
async fn test_full_pipeline_writes_every_output() {
    let temp_dir = TempDir::new().unwrap();
    write_raw_sheet(temp_dir.path(), "manaus", 62);
    let output = temp_dir.path().join("out");

    let processor = StationProcessor::new(
        temp_dir.path().to_path_buf(),
        Some(output.clone()),
        PipelineConfig::default(),
    )
    .unwrap();
    let stats = processor.process(&[StationContext::manaus()]).await.unwrap();

    assert_eq!(stats.stations_processed, 1);
    assert_eq!(stats.stations_failed, 0);
    assert!(stats.total_rows > 62);

    for suffix in [
        "daily",
        "estimates",
        "rolling7d",
        "monthly_totals",
        "daily_metrics",
        "monthly_metrics",
        "daily_taylor",
        "monthly_taylor",
    ] {
        let path = output.join(format!("manaus_{}.csv", suffix));
        assert!(path.exists(), "missing {}", path.display());
    }

    let cleaned =
        tokio::task::block_in_place(|| read_daily_table(&output.join("manaus_daily.csv"))).unwrap();
    assert_eq!(cleaned.len(), 62);
    let tmed = cleaned.column("tmed_c").unwrap();
    assert!(tmed.iter().all(Option::is_some));

    let estimates =
        tokio::task::block_in_place(|| read_daily_table(&output.join("manaus_estimates.csv")))
            .unwrap();
    assert!(estimates.has_column("et_penman_monteith"));
    assert!(estimates.has_column("et_camargo"));
}

#[tokio::test]
async fn test_stages_chain_through_files() {
    let temp_dir = TempDir::new().unwrap();
    write_raw_sheet(temp_dir.path(), "manaus", 40);
    let output = temp_dir.path().join("out");
    let config = PipelineConfig::default().with_output_format(OutputFormat::Parquet);
    let stations = [StationContext::manaus()];

    let clean = StationProcessor::new(
        temp_dir.path().to_path_buf(),
        Some(output.clone()),
        config.clone(),
    )
    .unwrap()
    .with_stage(Stage::Clean);
    clean.process(&stations).await.unwrap();
    assert!(output.join("manaus_daily.parquet").exists());

    for stage in [Stage::Estimate, Stage::Aggregate, Stage::Metrics] {
        let processor = StationProcessor::new(output.clone(), Some(output.clone()), config.clone())
            .unwrap()
            .with_stage(stage);
        processor.process(&stations).await.unwrap();
    }

    assert!(output.join("manaus_estimates.parquet").exists());
    assert!(output.join("manaus_monthly_totals.parquet").exists());
    assert!(output.join("manaus_daily_metrics.parquet").exists());
}

#[test]
fn test_single_file_input() {
    let temp_dir = TempDir::new().unwrap();
    write_raw_sheet(temp_dir.path(), "sheet", 10);
    let processor = StationProcessor::new(
        temp_dir.path().join("sheet.csv"),
        None,
        PipelineConfig::default(),
    )
    .unwrap()
    .with_stage(Stage::Clean);

    assert_eq!(
        processor.input_for("manaus").unwrap(),
        temp_dir.path().join("sheet.csv")
    );
    assert_eq!(processor.output_dir(), temp_dir.path().join("output"));
    let rows = processor.process_station(&StationContext::manaus()).unwrap();
    assert_eq!(rows, 10);
}
