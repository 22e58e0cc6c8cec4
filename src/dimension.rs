use crate::error::{DashboardError, Result};
use crate::schema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A categorical column the dashboard filters or groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Year,
    Country,
    ProductLine,
    DealSize,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Year,
        Dimension::Country,
        Dimension::ProductLine,
        Dimension::DealSize,
    ];

    /// Dimensions offered as filters when nothing else is configured.
    pub const DEFAULT_FILTERS: [Dimension; 3] =
        [Dimension::Year, Dimension::Country, Dimension::ProductLine];

    pub fn column(&self) -> &'static str {
        match self {
            Dimension::Year => schema::YEAR_ID,
            Dimension::Country => schema::COUNTRY,
            Dimension::ProductLine => schema::PRODUCTLINE,
            Dimension::DealSize => schema::DEALSIZE,
        }
    }

    pub fn alias(&self) -> &'static str {
        match self {
            Dimension::Year => "year",
            Dimension::Country => "country",
            Dimension::ProductLine => "product_line",
            Dimension::DealSize => "deal_size",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Year => "Year",
            Dimension::Country => "Country",
            Dimension::ProductLine => "Product Line",
            Dimension::DealSize => "Deal Size",
        }
    }

    /// Ordering used for option lists and grouped output. Years compare
    /// numerically so that "999" sorts before "2003".
    pub fn compare_values(&self, a: &str, b: &str) -> Ordering {
        match self {
            Dimension::Year => match (a.parse::<i64>(), b.parse::<i64>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => a.cmp(b),
            },
            _ => a.cmp(b),
        }
    }

    pub fn sort_values(&self, values: &mut [String]) {
        values.sort_by(|a, b| self.compare_values(a, b));
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Dimension {
    type Err = DashboardError;

    /// Accepts the dataset column name (`YEAR_ID`) or the lowercase alias
    /// (`year`).
    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim();
        Dimension::ALL
            .into_iter()
            .find(|d| d.column().eq_ignore_ascii_case(key) || d.alias().eq_ignore_ascii_case(key))
            .ok_or_else(|| DashboardError::InvalidFilter(format!("unknown dimension '{}'", key)))
    }
}

/// Parses a comma separated dimension list such as `year,country`.
pub fn parse_dimension_list(list: &str) -> Result<Vec<Dimension>> {
    let mut dims = Vec::new();
    for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let dim: Dimension = part.parse()?;
        if !dims.contains(&dim) {
            dims.push(dim);
        }
    }
    Ok(dims)
}
