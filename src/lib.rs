pub mod aggregate;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod data_utils;
pub mod dimension;
pub mod error;
pub mod filter;
pub mod format;
pub mod loader;
pub mod page;
pub mod schema;
pub mod server;

pub use config::DashboardConfig;
pub use dashboard::Dashboard;
pub use dimension::Dimension;
pub use error::{DashboardError, Result};
pub use filter::{FilterEngine, FilterOptions, FilterState, FilteredView};
pub use loader::{load, load_uncached, SalesTable};
