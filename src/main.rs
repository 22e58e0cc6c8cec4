use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use sales_dashboard::{loader, Dashboard, DashboardConfig, Dimension, FilterState};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sales-dashboard")]
#[command(about = "Interactive sales analytics dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the dashboard over HTTP
    Serve {
        #[command(flatten)]
        data: DataArgs,

        /// Address to listen on (or set SALES_DASHBOARD_BIND)
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },
    /// Print KPIs and summary tables for a set of filters
    Summary {
        #[command(flatten)]
        data: DataArgs,

        /// Restrict to these years
        #[arg(long = "year")]
        years: Vec<String>,

        /// Restrict to these countries
        #[arg(long = "country")]
        countries: Vec<String>,

        /// Restrict to these product lines
        #[arg(long = "product-line")]
        product_lines: Vec<String>,

        /// Emit the full dashboard as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct DataArgs {
    /// Path to the sales data file (or set SALES_DASHBOARD_DATA)
    #[arg(short, long)]
    data: Option<PathBuf>,
}

impl DataArgs {
    fn apply(&self, config: &mut DashboardConfig) {
        if let Some(path) = &self.data {
            config.data_path = path.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = DashboardConfig::from_env()?;

    match cli.command {
        Command::Serve { data, bind } => {
            data.apply(&mut config);
            if let Some(addr) = bind {
                config.bind_addr = addr;
            }

            info!("Sales dashboard starting...");
            let table = loader::load(&config.data_path)?;
            sales_dashboard::server::serve(table, config).await?;
        }
        Command::Summary {
            data,
            years,
            countries,
            product_lines,
            json,
        } => {
            data.apply(&mut config);

            let mut state = FilterState::new();
            state
                .select(Dimension::Year, years)
                .select(Dimension::Country, countries)
                .select(Dimension::ProductLine, product_lines);

            let table = loader::load(&config.data_path)?;
            let dashboard = Dashboard::build(&table, &state, &config)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&dashboard)?);
            } else {
                print_summary(&dashboard);
            }
        }
    }

    Ok(())
}

fn print_summary(dashboard: &Dashboard) {
    println!("\n=== {} ===", dashboard.title);
    println!("Rows: {} of {}", dashboard.row_count, dashboard.total_rows);

    for filter in &dashboard.filters {
        if !filter.selected.is_empty() {
            println!("{}: {}", filter.label, filter.selected.join(", "));
        }
    }

    println!();
    for tile in &dashboard.kpi_tiles {
        println!("{:<16} {:>18}", tile.label, tile.display);
    }

    for chart in &dashboard.charts {
        println!("\n--- {} ---", chart.heading);
        if chart.points.is_empty() {
            println!("(no data)");
        }
        for point in &chart.points {
            println!("{:<36} {:>18}", point.label, sales_dashboard::format::currency(point.value));
        }
    }

    println!("\n--- Sales by Year ---");
    println!("{:<8} {:>16} {:>14} {:>12}", "YEAR_ID", "Total Sales", "Avg Sales", "Order Count");
    for year in &dashboard.sales_by_year {
        println!(
            "{:<8} {:>16.2} {:>14.2} {:>12}",
            year.year, year.total_sales, year.avg_sales, year.order_count
        );
    }
}
