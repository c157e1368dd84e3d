//! Output writing for station tables
//!
//! Converts daily tables, metric records and Taylor placements into
//! polars frames and writes them as CSV or Snappy-compressed Parquet.

use crate::config::OutputFormat;
use crate::constants::columns;
use crate::error::Result;
use crate::metrics::{MetricRecord, TaylorDiagram};
use crate::models::DailyTable;

use polars::prelude::{
    Column, CsvWriter, DataFrame, ParquetCompression, ParquetWriter as PolarsParquetWriter,
    SerWriter,
};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Daily table as a frame, dates as ISO strings
pub fn table_to_frame(table: &DailyTable) -> Result<DataFrame> {
    let mut frame_columns = Vec::with_capacity(1 + table.numeric_columns().len());
    let dates: Vec<Option<String>> = table
        .dates()
        .iter()
        .map(|d| d.map(|d| d.format("%Y-%m-%d").to_string()))
        .collect();
    frame_columns.push(Column::new(columns::DATE.into(), dates));
    for column in table.numeric_columns() {
        frame_columns.push(Column::new(column.name.as_str().into(), column.values.clone()));
    }
    for column in table.text_columns() {
        frame_columns.push(Column::new(column.name.as_str().into(), column.values.clone()));
    }
    Ok(DataFrame::new(frame_columns)?)
}

/// One row per scored method
pub fn metrics_to_frame(records: &[MetricRecord]) -> Result<DataFrame> {
    let score = |f: fn(&MetricRecord) -> Option<f64>| -> Vec<Option<f64>> {
        records.iter().map(f).collect()
    };
    let frame = DataFrame::new(vec![
        Column::new(
            "method".into(),
            records.iter().map(|r| r.method.column_name()).collect::<Vec<_>>(),
        ),
        Column::new(
            "method_id".into(),
            records.iter().map(|r| r.method.short_id()).collect::<Vec<_>>(),
        ),
        Column::new("rmse".into(), score(|r| r.scores.rmse)),
        Column::new("mae".into(), score(|r| r.scores.mae)),
        Column::new("mbe".into(), score(|r| r.scores.mbe)),
        Column::new("r2".into(), score(|r| r.scores.r2)),
        Column::new("willmott_d".into(), score(|r| r.scores.willmott_d)),
    ])?;
    Ok(frame)
}

/// Reference point first, then one row per placed method
pub fn taylor_to_frame(diagram: &TaylorDiagram) -> Result<DataFrame> {
    let mut method = vec![diagram.reference.column_name()];
    let mut std = vec![diagram.reference_std];
    let mut correlation = vec![1.0];
    let mut normalized = vec![(diagram.reference_std > 0.0).then_some(1.0)];
    let mut centered = vec![0.0];

    for placement in &diagram.placements {
        method.push(placement.method.column_name());
        std.push(placement.std);
        correlation.push(placement.correlation);
        normalized.push(placement.normalized_std);
        centered.push(placement.centered_rms_difference);
    }

    Ok(DataFrame::new(vec![
        Column::new("method".into(), method),
        Column::new("std".into(), std),
        Column::new("correlation".into(), correlation),
        Column::new("normalized_std".into(), normalized),
        Column::new("centered_rms_difference".into(), centered),
    ])?)
}

/// Writes station outputs under one directory
#[derive(Debug, Clone)]
pub struct TableWriter {
    output_dir: PathBuf,
    format: OutputFormat,
}

impl TableWriter {
    pub fn new(output_dir: PathBuf, format: OutputFormat) -> Self {
        Self { output_dir, format }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// `<output_dir>/<station>_<suffix>.<ext>`
    pub fn path_for(&self, station: &str, suffix: &str) -> PathBuf {
        self.output_dir.join(format!(
            "{}_{}.{}",
            station,
            suffix,
            self.format.extension()
        ))
    }

    /// Write a frame and return its row count
    pub fn write_frame(&self, mut df: DataFrame, path: &Path) -> Result<usize> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        match self.format {
            OutputFormat::Csv => {
                CsvWriter::new(file).include_header(true).finish(&mut df)?;
            }
            OutputFormat::Parquet => {
                PolarsParquetWriter::new(file)
                    .with_compression(ParquetCompression::Snappy)
                    .finish(&mut df)?;
            }
        }
        debug!("Wrote {} rows to {}", df.height(), path.display());
        Ok(df.height())
    }

    pub fn write_table(&self, table: &DailyTable, station: &str, suffix: &str) -> Result<usize> {
        self.write_frame(table_to_frame(table)?, &self.path_for(station, suffix))
    }

    pub fn write_metrics(
        &self,
        records: &[MetricRecord],
        station: &str,
        suffix: &str,
    ) -> Result<usize> {
        self.write_frame(metrics_to_frame(records)?, &self.path_for(station, suffix))
    }

    pub fn write_taylor(
        &self,
        diagram: &TaylorDiagram,
        station: &str,
        suffix: &str,
    ) -> Result<usize> {
        self.write_frame(taylor_to_frame(diagram)?, &self.path_for(station, suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricScores, TaylorPlacement};
    use crate::models::EtoMethod;
    use crate::test_support::consecutive_days;
    use tempfile::TempDir;

    #[test]
    fn test_table_frame_layout() {
        let mut table = DailyTable::new(consecutive_days(2));
        table
            .insert_column("et_penman_monteith", vec![Some(4.1), None])
            .unwrap();
        let df = table_to_frame(&table).unwrap();
        assert_eq!(df.shape(), (2, 2));
        assert_eq!(df.get_column_names()[0].as_str(), "date");
        let dates = df.column("date").unwrap().as_materialized_series().clone();
        assert_eq!(dates.str().unwrap().get(1), Some("2024-01-02"));
    }

    #[test]
    fn test_metrics_frame_keeps_undefined_as_null() {
        let records = vec![MetricRecord {
            method: EtoMethod::HargreavesSamani,
            scores: MetricScores {
                rmse: Some(1.2),
                r2: None,
                ..Default::default()
            },
        }];
        let df = metrics_to_frame(&records).unwrap();
        assert_eq!(df.shape(), (1, 7));
        assert_eq!(df.column("r2").unwrap().null_count(), 1);
    }

    #[test]
    fn test_taylor_frame_starts_with_reference() {
        let diagram = TaylorDiagram {
            reference: EtoMethod::PenmanMonteith,
            reference_std: 0.5,
            placements: vec![TaylorPlacement {
                method: EtoMethod::PriestleyTaylor,
                std: 0.4,
                correlation: 0.9,
                normalized_std: Some(0.8),
                centered_rms_difference: 0.2,
            }],
            excluded: vec![],
        };
        let df = taylor_to_frame(&diagram).unwrap();
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_write_csv_and_parquet() {
        let temp_dir = TempDir::new().unwrap();
        let mut table = DailyTable::new(consecutive_days(3));
        table.insert_column("rain_mm", vec![Some(1.0); 3]).unwrap();

        for format in [OutputFormat::Csv, OutputFormat::Parquet] {
            let writer = TableWriter::new(temp_dir.path().to_path_buf(), format);
            let rows = writer.write_table(&table, "manaus", "daily").unwrap();
            assert_eq!(rows, 3);
            assert!(writer.path_for("manaus", "daily").exists());
        }
        assert!(temp_dir.path().join("manaus_daily.csv").exists());
        assert!(temp_dir.path().join("manaus_daily.parquet").exists());
    }
}
