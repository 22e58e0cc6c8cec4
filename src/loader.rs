//! Data loading
//!
//! Reads the sales dataset into a polars `DataFrame` exactly once per file and
//! normalizes the column types every later stage relies on.

use crate::data_utils::require_column;
use crate::error::{DashboardError, Result};
use crate::schema::{self, FLOAT_COLUMNS, INTEGER_COLUMNS, REQUIRED_COLUMNS, TEXT_COLUMNS};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

lazy_static::lazy_static! {
    // Loaded tables keyed by canonical path; shared read-only for the process lifetime.
    static ref TABLE_CACHE: Mutex<HashMap<PathBuf, Arc<SalesTable>>> = Mutex::new(HashMap::new());
}

const DATETIME_FORMATS: [&str; 7] = [
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];

/// The immutable, normalized sales dataset.
#[derive(Debug)]
pub struct SalesTable {
    frame: DataFrame,
    source: Option<PathBuf>,
}

impl SalesTable {
    /// Validate and normalize an in-memory frame.
    ///
    /// Integer columns become `Int64`, amounts `Float64`, dimension columns
    /// `String`, and `ORDERDATE` a millisecond `Datetime`. Columns outside
    /// the fixed schema are left as they are.
    pub fn from_frame(mut df: DataFrame) -> Result<Self> {
        for name in REQUIRED_COLUMNS {
            require_column(&df, name)?;
        }

        for name in INTEGER_COLUMNS {
            let series = df.column(name)?.strict_cast(&DataType::Int64)?;
            df.with_column(series)?;
        }
        for name in FLOAT_COLUMNS {
            let series = df.column(name)?.strict_cast(&DataType::Float64)?;
            df.with_column(series)?;
        }
        for name in TEXT_COLUMNS {
            let series = df.column(name)?.cast(&DataType::String)?;
            df.with_column(series)?;
        }

        let dates = parse_order_dates(df.column(schema::ORDERDATE)?)?;
        df.with_column(dates)?;

        Ok(Self { frame: df, source: None })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

/// Load the dataset at `path`, reusing the cached table when this file was
/// already loaded by the process.
pub fn load(path: impl AsRef<Path>) -> Result<Arc<SalesTable>> {
    let key = std::fs::canonicalize(path.as_ref())?;

    if let Some(table) = lock_cache().get(&key) {
        debug!("Serving {} from table cache", key.display());
        return Ok(Arc::clone(table));
    }

    let table = Arc::new(load_uncached(&key)?);
    let mut cache = lock_cache();
    // A concurrent loader may have won the race; everyone keeps its table.
    Ok(Arc::clone(cache.entry(key).or_insert(table)))
}

/// Read and normalize `path` without consulting or filling the cache.
pub fn load_uncached(path: impl AsRef<Path>) -> Result<SalesTable> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DashboardError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("data file not found: {}", path.display()),
        )));
    }

    let df = read_frame(path)?;
    let mut table = SalesTable::from_frame(df)?;
    table.source = Some(path.to_path_buf());

    info!(
        "Loaded {} rows x {} columns from {}",
        table.height(),
        table.frame.width(),
        path.display()
    );
    Ok(table)
}

fn lock_cache() -> MutexGuard<'static, HashMap<PathBuf, Arc<SalesTable>>> {
    // Entries are only ever inserted whole, so a poisoned map is still consistent.
    TABLE_CACHE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn read_frame(path: &Path) -> Result<DataFrame> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => {
            // The public sample dataset is Latin-1; lossy decoding keeps the load alive.
            let df = LazyCsvReader::new(path)
                .with_has_header(true)
                .with_infer_schema_length(None)
                .with_encoding(CsvEncoding::LossyUtf8)
                .finish()?
                .collect()?;
            Ok(df)
        }
        "parquet" => Ok(LazyFrame::scan_parquet(path, ScanArgsParquet::default())?.collect()?),
        "xls" | "xlsx" | "xlsm" | "xlsb" | "ods" => read_workbook(path),
        other => Err(DashboardError::UnsupportedFormat(format!(
            "'{}' ({})",
            other,
            path.display()
        ))),
    }
}

/// First worksheet of a workbook as a frame. The first row is the header.
fn read_workbook(path: &Path) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DashboardError::EmptyWorkbook(path.display().to_string()))??;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| DashboardError::EmptyWorkbook(path.display().to_string()))?;
    let body: Vec<&[Data]> = rows.collect();

    debug!("Read {} data rows from workbook {}", body.len(), path.display());
    frame_from_rows(header, &body)
}

/// Build a frame from a header row and data rows. Blank header cells get a
/// positional name and repeated names are suffixed with their index.
fn frame_from_rows(header: &[Data], body: &[&[Data]]) -> Result<DataFrame> {
    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(header.len());
    for (idx, cell) in header.iter().enumerate() {
        let mut name = match cell {
            Data::Empty => format!("column_{}", idx),
            other => other.to_string().trim().to_string(),
        };
        if !seen.insert(name.clone()) {
            name = format!("{}_{}", name, idx);
            seen.insert(name.clone());
        }
        columns.push(workbook_column(&name, idx, body));
    }
    Ok(DataFrame::new(columns)?)
}

fn workbook_column(name: &str, idx: usize, rows: &[&[Data]]) -> Series {
    let cells: Vec<Option<&Data>> = rows
        .iter()
        .map(|row| row.get(idx).filter(|c| !matches!(c, Data::Empty)))
        .collect();

    let numeric = cells
        .iter()
        .flatten()
        .all(|c| matches!(c, Data::Int(_) | Data::Float(_)));

    if numeric {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|cell| match cell {
                Some(Data::Int(v)) => Some(*v as f64),
                Some(Data::Float(v)) => Some(*v),
                _ => None,
            })
            .collect();
        Series::new(name, values)
    } else {
        let values: Vec<Option<String>> = cells.iter().map(|cell| cell.map(cell_text)).collect();
        Series::new(name, values)
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64())
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::Float(v) if v.fract() == 0.0 => format!("{}", *v as i64),
        other => other.to_string(),
    }
}

/// Excel serial day numbers count from 1899-12-30.
fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

/// Parse one `ORDERDATE` cell.
pub fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn parse_order_dates(series: &Series) -> Result<Series> {
    let target = DataType::Datetime(TimeUnit::Milliseconds, None);

    let millis: Vec<Option<i64>> = match series.dtype() {
        DataType::Date | DataType::Datetime(_, _) => {
            let converted = series.cast(&target)?;
            if let Some(row) = converted.is_null().into_iter().position(|v| v == Some(true)) {
                return Err(DashboardError::MalformedDate { row, value: String::new() });
            }
            return Ok(converted.with_name(schema::ORDERDATE));
        }
        dtype if dtype.is_numeric() => {
            let serials = series.cast(&DataType::Float64)?;
            serials
                .f64()?
                .into_iter()
                .enumerate()
                .map(|(row, v)| {
                    v.and_then(excel_serial_to_datetime)
                        .map(|dt| Some(dt.and_utc().timestamp_millis()))
                        .ok_or_else(|| DashboardError::MalformedDate {
                            row,
                            value: v.map(|f| f.to_string()).unwrap_or_default(),
                        })
                })
                .collect::<Result<_>>()?
        }
        _ => {
            let text = series.cast(&DataType::String)?;
            text.str()?
                .into_iter()
                .enumerate()
                .map(|(row, v)| {
                    v.and_then(parse_date_text)
                        .map(|dt| Some(dt.and_utc().timestamp_millis()))
                        .ok_or_else(|| DashboardError::MalformedDate {
                            row,
                            value: v.unwrap_or_default().to_string(),
                        })
                })
                .collect::<Result<_>>()?
        }
    };

    Ok(Series::new(schema::ORDERDATE, millis).cast(&target)?)
}
