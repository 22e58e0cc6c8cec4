//! Aggregations over the filtered view.
//!
//! Every function re-scans the view it is given; nothing is cached between
//! filter changes. Group-bys run through the polars lazy API and the results
//! are pulled into plain structs, which is where ordering is decided.

use crate::data_utils::{datetime_values, f64_values, i64_values, string_values};
use crate::dimension::Dimension;
use crate::error::Result;
use crate::filter::FilteredView;
use crate::schema::{
    COUNTRY, CUSTOMERNAME, ORDERDATE, ORDERNUMBER, PRODUCTLINE, QUANTITYORDERED, SALES,
    SUMMARY_COLUMNS, YEAR_ID,
};
use chrono::NaiveDateTime;
use polars::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;

const ORDER_YEAR: &str = "__order_year";
const ORDER_MONTH: &str = "__order_month";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_sales: f64,
    pub total_orders: usize,
    /// Mean SALES per order line; `None` when the view is empty.
    pub avg_order_value: Option<f64>,
    pub total_quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub key: String,
    pub sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPoint {
    pub year: i64,
    pub month: i64,
    /// `YYYY-MM`
    pub label: String,
    pub sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerTotal {
    pub customer: String,
    pub sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSummary {
    pub year: i64,
    pub total_sales: f64,
    pub avg_sales: f64,
    pub order_count: usize,
}

/// Descriptive statistics of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewRow {
    pub order_number: Option<i64>,
    pub order_date: Option<NaiveDateTime>,
    pub customer: Option<String>,
    pub product_line: Option<String>,
    pub sales: Option<f64>,
    pub quantity: Option<i64>,
    pub country: Option<String>,
}

pub fn kpis(view: &FilteredView) -> Result<Kpis> {
    let df = view.frame();
    let sales = df.column(SALES)?.f64()?;

    Ok(Kpis {
        total_sales: sales.sum().unwrap_or(0.0),
        total_orders: df.column(ORDERNUMBER)?.drop_nulls().n_unique()?,
        avg_order_value: sales.mean(),
        total_quantity: df.column(QUANTITYORDERED)?.i64()?.sum().unwrap_or(0),
    })
}

/// Sum of SALES per value of `column`. Rows with a null key are dropped.
fn group_sales(df: &DataFrame, column: &str) -> Result<Vec<(String, f64)>> {
    let grouped = df
        .clone()
        .lazy()
        .group_by([col(column)])
        .agg([col(SALES).sum().alias(SALES)])
        .collect()?;

    let keys = string_values(&grouped, column)?;
    let sums = f64_values(&grouped, SALES)?;
    Ok(keys
        .into_iter()
        .zip(sums)
        .filter_map(|(key, sum)| key.map(|k| (k, sum.unwrap_or(0.0))))
        .collect())
}

/// SALES summed per dimension value, ordered by the value.
pub fn sales_by(view: &FilteredView, dim: Dimension) -> Result<Vec<GroupTotal>> {
    let mut totals: Vec<GroupTotal> = group_sales(view.frame(), dim.column())?
        .into_iter()
        .map(|(key, sales)| GroupTotal { key, sales })
        .collect();
    totals.sort_by(|a, b| dim.compare_values(&a.key, &b.key));
    Ok(totals)
}

/// SALES per calendar month of ORDERDATE, oldest month first.
pub fn monthly_trend(view: &FilteredView) -> Result<Vec<MonthlyPoint>> {
    let grouped = view
        .frame()
        .clone()
        .lazy()
        .with_columns([
            col(ORDERDATE).dt().year().cast(DataType::Int64).alias(ORDER_YEAR),
            col(ORDERDATE).dt().month().cast(DataType::Int64).alias(ORDER_MONTH),
        ])
        .group_by([col(ORDER_YEAR), col(ORDER_MONTH)])
        .agg([col(SALES).sum().alias(SALES)])
        .collect()?;

    let years = i64_values(&grouped, ORDER_YEAR)?;
    let months = i64_values(&grouped, ORDER_MONTH)?;
    let sums = f64_values(&grouped, SALES)?;

    let mut points: Vec<MonthlyPoint> = years
        .into_iter()
        .zip(months)
        .zip(sums)
        .filter_map(|((year, month), sales)| {
            let (year, month) = (year?, month?);
            Some(MonthlyPoint {
                year,
                month,
                label: format!("{:04}-{:02}", year, month),
                sales: sales.unwrap_or(0.0),
            })
        })
        .collect();
    points.sort_by_key(|p| (p.year, p.month));
    Ok(points)
}

/// The `n` customers with the largest summed SALES, largest first. Equal
/// totals are ordered by customer name.
pub fn top_customers(view: &FilteredView, n: usize) -> Result<Vec<CustomerTotal>> {
    let mut totals: Vec<CustomerTotal> = group_sales(view.frame(), CUSTOMERNAME)?
        .into_iter()
        .map(|(customer, sales)| CustomerTotal { customer, sales })
        .collect();
    totals.sort_by(|a, b| {
        b.sales
            .total_cmp(&a.sales)
            .then_with(|| a.customer.cmp(&b.customer))
    });
    totals.truncate(n);
    Ok(totals)
}

/// Total, mean and row count of SALES per YEAR_ID, amounts rounded to cents.
pub fn sales_by_year(view: &FilteredView) -> Result<Vec<YearSummary>> {
    let grouped = view
        .frame()
        .clone()
        .lazy()
        .group_by([col(YEAR_ID)])
        .agg([
            col(SALES).sum().alias("TOTAL_SALES"),
            col(SALES).mean().alias("AVG_SALES"),
            col(SALES).count().cast(DataType::Int64).alias("ORDER_COUNT"),
        ])
        .collect()?;

    let years = i64_values(&grouped, YEAR_ID)?;
    let totals = f64_values(&grouped, "TOTAL_SALES")?;
    let means = f64_values(&grouped, "AVG_SALES")?;
    let counts = i64_values(&grouped, "ORDER_COUNT")?;

    let mut summary: Vec<YearSummary> = years
        .into_iter()
        .zip(totals)
        .zip(means)
        .zip(counts)
        .filter_map(|(((year, total), mean), count)| {
            Some(YearSummary {
                year: year?,
                total_sales: round2(total.unwrap_or(0.0)),
                avg_sales: round2(mean.unwrap_or(0.0)),
                order_count: count.unwrap_or(0).max(0) as usize,
            })
        })
        .collect();
    summary.sort_by_key(|s| s.year);
    Ok(summary)
}

/// First `n` rows of the view, in table order.
pub fn preview(view: &FilteredView, n: usize) -> Result<Vec<PreviewRow>> {
    let head = view.frame().head(Some(n));

    let order_numbers = i64_values(&head, ORDERNUMBER)?;
    let dates = datetime_values(&head, ORDERDATE)?;
    let customers = string_values(&head, CUSTOMERNAME)?;
    let product_lines = string_values(&head, PRODUCTLINE)?;
    let sales = f64_values(&head, SALES)?;
    let quantities = i64_values(&head, QUANTITYORDERED)?;
    let countries = string_values(&head, COUNTRY)?;

    Ok((0..head.height())
        .map(|i| PreviewRow {
            order_number: order_numbers[i],
            order_date: dates[i],
            customer: customers[i].clone(),
            product_line: product_lines[i].clone(),
            sales: sales[i],
            quantity: quantities[i],
            country: countries[i].clone(),
        })
        .collect())
}

/// count / mean / std / min / quartiles / max for the numeric summary columns.
pub fn describe(view: &FilteredView) -> Result<Vec<ColumnSummary>> {
    SUMMARY_COLUMNS
        .iter()
        .map(|&column| {
            let values: Vec<f64> = f64_values(view.frame(), column)?
                .into_iter()
                .flatten()
                .filter(|v| !v.is_nan())
                .collect();
            Ok(summarize(column, values))
        })
        .collect()
}

fn summarize(column: &str, mut values: Vec<f64>) -> ColumnSummary {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let count = values.len();

    let mean = (count > 0).then(|| values.iter().sum::<f64>() / count as f64);
    let std = match (mean, count) {
        (Some(m), n) if n > 1 => {
            let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
            Some((ss / (n - 1) as f64).sqrt())
        }
        _ => None,
    };

    ColumnSummary {
        column: column.to_string(),
        count,
        mean,
        std,
        min: values.first().copied(),
        q25: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q75: quantile(&values, 0.75),
        max: values.last().copied(),
    }
}

/// Linear interpolation between closest ranks; `sorted` must be ascending.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
