//! HTML rendering of a built `Dashboard`.

use crate::aggregate::ColumnSummary;
use crate::chart::ChartSpec;
use crate::config::DashboardConfig;
use crate::dashboard::Dashboard;
use crate::format::{self, escape_html, escape_script_json};
use crate::schema::PREVIEW_COLUMNS;
use std::fmt::Write;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; margin: 0; padding: 24px 32px; color: #262730; }
h1 { margin-top: 0; }
.panel { border: 1px solid #e6e6ea; border-radius: 8px; padding: 16px; margin-bottom: 16px; }
.row { display: flex; gap: 16px; flex-wrap: wrap; }
.row > * { flex: 1 1 0; min-width: 280px; }
.kpi .label { font-size: 0.9rem; color: #6b6b76; }
.kpi .value { font-size: 1.9rem; }
.filters select { width: 100%; min-height: 7em; }
.chart { min-height: 420px; }
table { border-collapse: collapse; width: 100%; font-size: 0.9rem; }
th, td { border-bottom: 1px solid #eee; padding: 4px 8px; text-align: right; }
th:first-child, td:first-child { text-align: left; }
.muted { color: #888; }
footer { text-align: center; color: grey; padding: 20px 0; }
"#;

/// Full page. Every text value is escaped; chart data is embedded as JSON and
/// drawn client side by Plotly.
pub fn render_page(dashboard: &Dashboard, config: &DashboardConfig) -> String {
    let mut html = String::with_capacity(64 * 1024);
    let title = escape_html(&dashboard.title);

    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n\
         <script src=\"{PLOTLY_CDN}\"></script>\n</head>\n<body>\n<h1>{title}</h1>\n"
    );

    render_filters(&mut html, dashboard);
    render_kpis(&mut html, dashboard);
    html.push_str("<hr>\n");
    render_charts(&mut html, dashboard);
    render_preview(&mut html, dashboard);
    render_summaries(&mut html, dashboard);

    if let Some(footer) = &config.footer {
        let _ = write!(html, "<hr>\n<footer><p>{}</p></footer>\n", escape_html(footer));
    }
    html.push_str("</body>\n</html>\n");
    html
}

fn render_filters(html: &mut String, dashboard: &Dashboard) {
    html.push_str("<div class=\"panel filters\">\n<h3>Filters</h3>\n<form method=\"get\" action=\"/\">\n<div class=\"row\">\n");
    for filter in &dashboard.filters {
        let _ = write!(
            html,
            "<label>{}<br><select name=\"{}\" multiple onchange=\"this.form.submit()\">\n",
            escape_html(filter.label),
            filter.column
        );
        // Stale selections stay visible so they can be removed.
        let mut values: Vec<&String> = filter.options.iter().collect();
        values.extend(filter.selected.iter().filter(|s| !filter.options.contains(*s)));
        for value in values {
            let selected = if filter.selected.contains(value) { " selected" } else { "" };
            let value = escape_html(value);
            let _ = writeln!(html, "<option value=\"{value}\"{selected}>{value}</option>");
        }
        html.push_str("</select></label>\n");
    }
    let _ = write!(
        html,
        "</div>\n<p class=\"muted\">{} of {} rows &middot; <a href=\"/\">clear filters</a></p>\n</form>\n</div>\n",
        format::thousands(dashboard.row_count as i64),
        format::thousands(dashboard.total_rows as i64)
    );
}

fn render_kpis(html: &mut String, dashboard: &Dashboard) {
    html.push_str("<div class=\"panel\"><div class=\"row\">\n");
    for tile in &dashboard.kpi_tiles {
        let _ = writeln!(
            html,
            "<div class=\"kpi\"><div class=\"label\">{}</div><div class=\"value\">{}</div></div>",
            escape_html(tile.label),
            escape_html(&tile.display)
        );
    }
    html.push_str("</div></div>\n");
}

fn render_charts(html: &mut String, dashboard: &Dashboard) {
    // Two charts per row except the ranking, which spans the page.
    let mut row: Vec<&ChartSpec> = Vec::new();
    for chart in &dashboard.charts {
        if chart.id == "top_customers" {
            flush_chart_row(html, &mut row);
            row.push(chart);
            flush_chart_row(html, &mut row);
            continue;
        }
        row.push(chart);
        if row.len() == 2 {
            flush_chart_row(html, &mut row);
        }
    }
    flush_chart_row(html, &mut row);

    html.push_str("<script>\n(function () {\n  var figures = ");
    let figures: serde_json::Map<String, serde_json::Value> = dashboard
        .charts
        .iter()
        .map(|c| (format!("chart-{}", c.id), c.to_figure()))
        .collect();
    let json = serde_json::to_string(&figures).unwrap_or_else(|_| "{}".to_string());
    html.push_str(&escape_script_json(&json));
    html.push_str(
        ";\n  Object.keys(figures).forEach(function (id) {\n    \
         Plotly.newPlot(id, figures[id].data, figures[id].layout, {responsive: true});\n  });\n})();\n</script>\n",
    );
}

fn flush_chart_row(html: &mut String, row: &mut Vec<&ChartSpec>) {
    if row.is_empty() {
        return;
    }
    html.push_str("<div class=\"panel\"><div class=\"row\">\n");
    for chart in row.drain(..) {
        let _ = writeln!(
            html,
            "<div><h3>{}</h3><div id=\"chart-{}\" class=\"chart\"></div></div>",
            escape_html(chart.heading),
            chart.id
        );
    }
    html.push_str("</div></div>\n");
}

fn render_preview(html: &mut String, dashboard: &Dashboard) {
    html.push_str("<div class=\"panel\">\n<h3>Data Preview</h3>\n<table>\n<tr>");
    for column in PREVIEW_COLUMNS {
        let _ = write!(html, "<th>{}</th>", column);
    }
    html.push_str("</tr>\n");

    for row in &dashboard.preview {
        let cells = [
            row.order_number.map(|v| v.to_string()),
            row.order_date.map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string()),
            row.customer.clone(),
            row.product_line.clone(),
            row.sales.map(format::decimal),
            row.quantity.map(|q| q.to_string()),
            row.country.clone(),
        ];
        html.push_str("<tr>");
        for cell in cells {
            let _ = write!(html, "<td>{}</td>", escape_html(cell.as_deref().unwrap_or("")));
        }
        html.push_str("</tr>\n");
    }
    if dashboard.preview.is_empty() {
        html.push_str("<tr><td colspan=\"7\" class=\"muted\">No rows match the current filters.</td></tr>\n");
    }
    html.push_str("</table>\n</div>\n");
}

fn stat_cell(value: Option<f64>) -> String {
    value.map(format::decimal).unwrap_or_else(|| "NaN".to_string())
}

fn render_summaries(html: &mut String, dashboard: &Dashboard) {
    html.push_str("<div class=\"panel\">\n<h3>Statistical Summary</h3>\n<div class=\"row\">\n<div>\n<p><b>Numerical Columns Statistics:</b></p>\n<table>\n<tr><th></th>");
    for summary in &dashboard.numeric_summary {
        let _ = write!(html, "<th>{}</th>", escape_html(&summary.column));
    }
    html.push_str("</tr>\n");

    let stats: [(&str, fn(&ColumnSummary) -> String); 8] = [
        ("count", |s| format::thousands(s.count as i64)),
        ("mean", |s| stat_cell(s.mean)),
        ("std", |s| stat_cell(s.std)),
        ("min", |s| stat_cell(s.min)),
        ("25%", |s| stat_cell(s.q25)),
        ("50%", |s| stat_cell(s.median)),
        ("75%", |s| stat_cell(s.q75)),
        ("max", |s| stat_cell(s.max)),
    ];
    for (name, cell) in stats {
        let _ = write!(html, "<tr><td>{}</td>", name);
        for summary in &dashboard.numeric_summary {
            let _ = write!(html, "<td>{}</td>", cell(summary));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n</div>\n<div>\n<p><b>Sales by Year:</b></p>\n<table>\n<tr><th>YEAR_ID</th><th>Total Sales</th><th>Avg Sales</th><th>Order Count</th></tr>\n");

    for year in &dashboard.sales_by_year {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            year.year,
            format::decimal(year.total_sales),
            format::decimal(year.avg_sales),
            year.order_count
        );
    }
    html.push_str("</table>\n</div>\n</div>\n</div>\n");
}
