//! HTTP server for the dashboard UI.
//!
//! Every request rebuilds the filtered view and all aggregates from the shared
//! read-only table; no per-session state is kept on the server.

use crate::config::DashboardConfig;
use crate::dashboard::Dashboard;
use crate::error::DashboardError;
use crate::filter::{FilterEngine, FilterState};
use crate::loader::SalesTable;
use crate::page::render_page;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared application state. The table is immutable after load, so handlers
/// read it without locking.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<SalesTable>,
    pub config: Arc<DashboardConfig>,
}

impl AppState {
    pub fn new(table: Arc<SalesTable>, config: DashboardConfig) -> Self {
        Self {
            table,
            config: Arc::new(config),
        }
    }
}

type QueryPairs = Query<Vec<(String, String)>>;

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = match &self {
            DashboardError::InvalidFilter(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard_page))
        .route("/api/dashboard", get(dashboard_json))
        .route("/api/filters", get(filter_options))
        .route("/api/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `config.bind_addr` and serve until the process is stopped.
pub async fn serve(table: Arc<SalesTable>, config: DashboardConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr;
    let app = router(AppState::new(table, config));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Sales dashboard running on http://{}", addr);
    info!("Dashboard API available at http://{}/api/dashboard", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn build(state: &AppState, pairs: Vec<(String, String)>) -> Result<Dashboard, DashboardError> {
    let filters = FilterState::from_query_pairs(pairs)?;
    Dashboard::build(&state.table, &filters, &state.config)
}

/// GET / - the rendered dashboard page
async fn dashboard_page(
    State(state): State<AppState>,
    Query(pairs): QueryPairs,
) -> Result<Html<String>, DashboardError> {
    let dashboard = build(&state, pairs)?;
    Ok(Html(render_page(&dashboard, &state.config)))
}

/// GET /api/dashboard - every KPI, chart and table as JSON
async fn dashboard_json(
    State(state): State<AppState>,
    Query(pairs): QueryPairs,
) -> Result<Json<Dashboard>, DashboardError> {
    Ok(Json(build(&state, pairs)?))
}

/// GET /api/filters - cascading filter options for the given selections
async fn filter_options(
    State(state): State<AppState>,
    Query(pairs): QueryPairs,
) -> Result<Json<Value>, DashboardError> {
    let filters = FilterState::from_query_pairs(pairs)?;
    let options =
        FilterEngine::allowed_values(&state.table, &filters, &state.config.filter_dimensions)?;
    Ok(Json(json!({ "filters": options })))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "sales-dashboard",
        "rows": state.table.height(),
    }))
}
