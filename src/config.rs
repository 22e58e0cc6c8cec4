use crate::dimension::{parse_dimension_list, Dimension};
use crate::error::{DashboardError, Result};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

pub const ENV_DATA: &str = "SALES_DASHBOARD_DATA";
pub const ENV_BIND: &str = "SALES_DASHBOARD_BIND";
pub const ENV_TITLE: &str = "SALES_DASHBOARD_TITLE";
pub const ENV_PREVIEW_ROWS: &str = "SALES_DASHBOARD_PREVIEW_ROWS";
pub const ENV_TOP_N: &str = "SALES_DASHBOARD_TOP_N";
pub const ENV_FILTERS: &str = "SALES_DASHBOARD_FILTERS";
pub const ENV_FOOTER: &str = "SALES_DASHBOARD_FOOTER";

/// Runtime settings of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub title: String,
    /// Rows shown in the data preview table.
    pub preview_rows: usize,
    /// Length of the top customer ranking.
    pub top_customers: usize,
    /// Dimensions offered as filter widgets, in display order.
    pub filter_dimensions: Vec<Dimension>,
    pub footer: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("sales_data_sample.xls"),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8501)),
            title: "Sales Data Dashboard".to_string(),
            preview_rows: 20,
            top_customers: 10,
            filter_dimensions: Dimension::DEFAULT_FILTERS.to_vec(),
            footer: None,
        }
    }
}

impl DashboardConfig {
    /// Defaults overridden by `SALES_DASHBOARD_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(path) = get(ENV_DATA) {
            config.data_path = PathBuf::from(path);
        }
        if let Some(addr) = get(ENV_BIND) {
            config.bind_addr = parse_setting(ENV_BIND, &addr)?;
        }
        if let Some(title) = get(ENV_TITLE) {
            config.title = title;
        }
        if let Some(rows) = get(ENV_PREVIEW_ROWS) {
            config.preview_rows = parse_setting(ENV_PREVIEW_ROWS, &rows)?;
        }
        if let Some(n) = get(ENV_TOP_N) {
            config.top_customers = parse_setting(ENV_TOP_N, &n)?;
        }
        if let Some(list) = get(ENV_FILTERS) {
            config.filter_dimensions = parse_dimension_list(&list)
                .map_err(|e| DashboardError::Config(format!("{}: {}", ENV_FILTERS, e)))?;
        }
        config.footer = get(ENV_FOOTER);

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_customers == 0 {
            return Err(DashboardError::Config("top customer count must be at least 1".to_string()));
        }
        if self.filter_dimensions.is_empty() {
            return Err(DashboardError::Config("at least one filter dimension is required".to_string()));
        }
        Ok(())
    }
}

fn parse_setting<T: FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| DashboardError::Config(format!("{}={:?}: {}", key, raw, e)))
}
