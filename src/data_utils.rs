use crate::error::{DashboardError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use polars::prelude::*;

/// Fail with `MissingColumn` unless `name` is present in `df`.
pub fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map_err(|_| DashboardError::MissingColumn(name.to_string()))
}

/// Column values rendered as strings. Integer columns render without a
/// fractional part, which is how years and order numbers are displayed.
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = require_column(df, name)?;
    let as_text = match series.dtype() {
        DataType::String => series.clone(),
        DataType::Float32 | DataType::Float64 => {
            let floats = series.cast(&DataType::Float64)?;
            let values: Vec<Option<String>> = floats
                .f64()?
                .into_iter()
                .map(|v| v.map(format_float_key))
                .collect();
            return Ok(values);
        }
        _ => series.cast(&DataType::String)?,
    };
    Ok(as_text
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = require_column(df, name)?.cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

pub fn i64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let series = require_column(df, name)?.cast(&DataType::Int64)?;
    Ok(series.i64()?.into_iter().collect())
}

/// Values of a millisecond `Datetime` column as naive datetimes.
pub fn datetime_values(df: &DataFrame, name: &str) -> Result<Vec<Option<NaiveDateTime>>> {
    let series = require_column(df, name)?
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        .cast(&DataType::Int64)?;
    Ok(series
        .i64()?
        .into_iter()
        .map(|ms| ms.and_then(DateTime::<Utc>::from_timestamp_millis).map(|dt| dt.naive_utc()))
        .collect())
}

/// Whole floats become integer keys ("2004" rather than "2004.0").
fn format_float_key(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}
