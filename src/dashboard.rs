//! Assembles one full dashboard: filter widgets, KPI tiles, charts and tables,
//! all derived from a single filtered view.

use crate::aggregate::{
    self, ColumnSummary, CustomerTotal, GroupTotal, Kpis, MonthlyPoint, PreviewRow, YearSummary,
};
use crate::chart::{ChartColor, ChartKind, ChartPoint, ChartSpec};
use crate::config::DashboardConfig;
use crate::dimension::Dimension;
use crate::error::Result;
use crate::filter::{FilterEngine, FilterOptions, FilterState};
use crate::format;
use crate::loader::SalesTable;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiTile {
    pub label: &'static str,
    pub value: Option<f64>,
    pub display: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub title: String,
    pub filters: Vec<FilterOptions>,
    /// Rows in the filtered view.
    pub row_count: usize,
    /// Rows in the full table.
    pub total_rows: usize,
    pub kpis: Kpis,
    pub kpi_tiles: Vec<KpiTile>,
    pub charts: Vec<ChartSpec>,
    pub preview: Vec<PreviewRow>,
    pub numeric_summary: Vec<ColumnSummary>,
    pub sales_by_year: Vec<YearSummary>,
}

impl Dashboard {
    /// Run the whole pipeline for one set of selections.
    pub fn build(table: &SalesTable, state: &FilterState, config: &DashboardConfig) -> Result<Self> {
        let filters = FilterEngine::allowed_values(table, state, &config.filter_dimensions)?;
        let view = FilterEngine::filter_df(table, state)?;
        if view.is_empty() {
            warn!("No rows match the current filters; rendering empty dashboard");
        }

        let kpis = aggregate::kpis(&view)?;
        let charts = vec![
            product_line_chart(&aggregate::sales_by(&view, Dimension::ProductLine)?),
            country_chart(&aggregate::sales_by(&view, Dimension::Country)?),
            trend_chart(&aggregate::monthly_trend(&view)?),
            deal_size_chart(&aggregate::sales_by(&view, Dimension::DealSize)?),
            top_customers_chart(&aggregate::top_customers(&view, config.top_customers)?),
        ];

        debug!("Built dashboard over {} of {} rows", view.height(), view.total_rows());
        Ok(Self {
            title: config.title.clone(),
            filters,
            row_count: view.height(),
            total_rows: view.total_rows(),
            kpi_tiles: kpi_tiles(&kpis),
            kpis,
            charts,
            preview: aggregate::preview(&view, config.preview_rows)?,
            numeric_summary: aggregate::describe(&view)?,
            sales_by_year: aggregate::sales_by_year(&view)?,
        })
    }

    pub fn chart(&self, id: &str) -> Option<&ChartSpec> {
        self.charts.iter().find(|c| c.id == id)
    }
}

fn kpi_tiles(kpis: &Kpis) -> Vec<KpiTile> {
    vec![
        KpiTile {
            label: "Total Sales",
            value: Some(kpis.total_sales),
            display: format::currency(kpis.total_sales),
        },
        KpiTile {
            label: "Total Orders",
            value: Some(kpis.total_orders as f64),
            display: format::thousands(kpis.total_orders as i64),
        },
        KpiTile {
            label: "Avg Order Value",
            value: kpis.avg_order_value,
            display: format::optional_currency(kpis.avg_order_value),
        },
        KpiTile {
            label: "Total Quantity",
            value: Some(kpis.total_quantity as f64),
            display: format::thousands(kpis.total_quantity),
        },
    ]
}

fn group_points(totals: &[GroupTotal]) -> Vec<ChartPoint> {
    totals
        .iter()
        .map(|t| ChartPoint {
            label: t.key.clone(),
            value: t.sales,
        })
        .collect()
}

fn product_line_chart(totals: &[GroupTotal]) -> ChartSpec {
    ChartSpec {
        id: "sales_by_product_line",
        heading: "Sales by Product Line",
        title: "Total Sales by Product Line",
        kind: ChartKind::Bar,
        x_label: "PRODUCTLINE",
        y_label: "SALES",
        color: ChartColor::Continuous("Blues"),
        points: group_points(totals),
    }
}

fn country_chart(totals: &[GroupTotal]) -> ChartSpec {
    ChartSpec {
        id: "sales_by_country",
        heading: "Sales by Country",
        title: "Sales Distribution by Country",
        kind: ChartKind::Pie,
        x_label: "COUNTRY",
        y_label: "SALES",
        color: ChartColor::Plain,
        points: group_points(totals),
    }
}

fn trend_chart(points: &[MonthlyPoint]) -> ChartSpec {
    ChartSpec {
        id: "monthly_sales_trend",
        heading: "Sales Trend Over Time",
        title: "Monthly Sales Trend",
        kind: ChartKind::Line,
        x_label: "ORDERDATE",
        y_label: "SALES",
        color: ChartColor::Plain,
        points: points
            .iter()
            .map(|p| ChartPoint {
                label: p.label.clone(),
                value: p.sales,
            })
            .collect(),
    }
}

fn deal_size_chart(totals: &[GroupTotal]) -> ChartSpec {
    ChartSpec {
        id: "sales_by_deal_size",
        heading: "Sales by Deal Size",
        title: "Sales by Deal Size",
        kind: ChartKind::Bar,
        x_label: "DEALSIZE",
        y_label: "SALES",
        color: ChartColor::Categorical,
        points: group_points(totals),
    }
}

fn top_customers_chart(customers: &[CustomerTotal]) -> ChartSpec {
    ChartSpec {
        id: "top_customers",
        heading: "Top 10 Customers by Sales",
        title: "Top 10 Customers",
        kind: ChartKind::HorizontalBar,
        x_label: "SALES",
        y_label: "CUSTOMERNAME",
        color: ChartColor::Continuous("Viridis"),
        points: customers
            .iter()
            .map(|c| ChartPoint {
                label: c.customer.clone(),
                value: c.sales,
            })
            .collect(),
    }
}
