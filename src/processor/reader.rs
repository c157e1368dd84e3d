//! Table reading for station sheets and intermediate outputs
//!
//! Raw sheets are read with their spreadsheet headers and mapped onto
//! semantic names. Intermediate tables written by this crate carry an
//! ISO `date` column and semantic column names already.

use crate::calendar::{RawDay, parse_month};
use crate::constants::columns;
use crate::error::{EtoError, Result};
use crate::models::{DailyTable, NumericColumn, RawStationTable, TextColumn};
use crate::schema::{ColumnRole, SchemaMapper};

use chrono::NaiveDate;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Rows scanned for CSV type inference
const INFER_SCHEMA_ROWS: usize = 10_000;

/// Read a CSV or Parquet file, chosen by extension
pub fn read_frame(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(EtoError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let is_parquet = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet"));

    let df = if is_parquet {
        ParquetReader::new(File::open(path)?).finish()?
    } else {
        LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .finish()?
            .collect()?
    };

    debug!(
        "Read {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// Parse a decimal that may use a comma separator
fn parse_decimal(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.replace(',', ".").parse::<f64>().ok()
}

fn string_values(series: &Series) -> Result<Vec<Option<String>>> {
    let strings = series.cast(&DataType::String)?;
    Ok(strings
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

fn is_textual(dtype: &DataType) -> bool {
    matches!(dtype, DataType::String | DataType::Date)
}

/// Numeric values of a column. Text columns are parsed cell by cell.
fn numeric_values(column: &Column) -> Result<Vec<Option<f64>>> {
    let series = column.as_materialized_series();
    if is_textual(series.dtype()) {
        return Ok(string_values(series)?
            .into_iter()
            .map(|v| v.as_deref().and_then(parse_decimal))
            .collect());
    }
    let floats = series.cast(&DataType::Float64)?;
    Ok(floats.f64()?.into_iter().collect())
}

fn raw_days(column: &Column) -> Result<Vec<RawDay>> {
    let series = column.as_materialized_series();
    if is_textual(series.dtype()) {
        return Ok(string_values(series)?
            .iter()
            .map(|v| RawDay::from(v.as_deref()))
            .collect());
    }
    Ok(numeric_values(column)?
        .into_iter()
        .map(|v| v.map(RawDay::Number).unwrap_or(RawDay::Missing))
        .collect())
}

/// A text column holding month names rather than free text
fn looks_like_month_names(values: &[Option<String>]) -> bool {
    values.iter().flatten().any(|v| {
        parse_decimal(v).is_none() && parse_month(&RawDay::Text(v.clone())).is_some()
    })
}

/// Read a raw station sheet
pub fn read_raw_station(path: &Path, mapper: &SchemaMapper) -> Result<RawStationTable> {
    let df = read_frame(path)?;
    let headers: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let mappings = mapper.map_headers(&headers);

    let day_mapping = mappings
        .iter()
        .find(|m| m.role == ColumnRole::Day)
        .ok_or_else(|| EtoError::MissingColumn {
            column: columns::DATE.to_string(),
        })?;
    let mut raw = RawStationTable::new(raw_days(df.column(&day_mapping.source)?)?);

    for mapping in &mappings {
        let column = df.column(&mapping.source)?;
        match mapping.role {
            ColumnRole::Day => {}
            ColumnRole::Month => raw.month = Some(raw_days(column)?),
            ColumnRole::Observation | ColumnRole::Estimate(_) => raw.numeric.push(NumericColumn {
                name: mapping.target.clone(),
                values: numeric_values(column)?,
            }),
            ColumnRole::Other if column.dtype() == &DataType::String => {
                let values = string_values(column.as_materialized_series())?;
                if raw.month.is_none() && looks_like_month_names(&values) {
                    debug!("Using '{}' as the month column", mapping.source);
                    raw.month = Some(values.iter().map(|v| RawDay::from(v.as_deref())).collect());
                } else {
                    raw.text.push(TextColumn {
                        name: mapping.target.clone(),
                        values,
                    });
                }
            }
            ColumnRole::Other => raw.numeric.push(NumericColumn {
                name: mapping.target.clone(),
                values: numeric_values(column)?,
            }),
        }
    }

    if raw.is_empty() {
        return Err(EtoError::InvalidFormat {
            path: path.to_path_buf(),
            reason: "sheet has no data rows".to_string(),
        });
    }
    Ok(raw)
}

/// Read a table previously written with an ISO `date` column
pub fn read_daily_table(path: &Path) -> Result<DailyTable> {
    let df = read_frame(path)?;
    let date_column = df.column(columns::DATE).map_err(|_| EtoError::MissingColumn {
        column: columns::DATE.to_string(),
    })?;

    let dates = string_values(date_column.as_materialized_series())?
        .into_iter()
        .map(|v| v.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()))
        .collect();
    let mut table = DailyTable::new(dates);

    for column in df.get_columns() {
        let name = column.name().as_str();
        if name == columns::DATE {
            continue;
        }
        if column.dtype() == &DataType::String {
            table.insert_text_column(name, string_values(column.as_materialized_series())?)?;
        } else {
            table.insert_column(name, numeric_values(column)?)?;
        }
    }
    Ok(table)
}
