use axum::{
    Form, Json, Router,
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::backend::SpreadsheetBackend;
use crate::config::{DashboardConfig, TrackedTable};
use crate::error::DashboardError;
use crate::feedback::{self, FeedbackForm, SubmitOutcome};
use crate::reader::read_table;
use crate::render::{DashboardPage, PageView, TableView};
use crate::table::{CellValue, RecordTable};

pub struct AppState {
    backend: Arc<dyn SpreadsheetBackend>,
    config: DashboardConfig,
    page: DashboardPage,
}

impl AppState {
    pub fn new(
        config: DashboardConfig,
        backend: Arc<dyn SpreadsheetBackend>,
    ) -> Result<Self, DashboardError> {
        Ok(Self {
            backend,
            config,
            page: DashboardPage::new()?,
        })
    }

    fn table(&self, index: usize) -> Result<&TrackedTable, DashboardError> {
        self.config
            .tables
            .get(index)
            .ok_or_else(|| DashboardError::NotFound(format!("table {}", index)))
    }
}

#[derive(Deserialize)]
struct DashboardQuery {
    filter: Option<String>,
    submitted: Option<usize>,
}

#[derive(Deserialize)]
struct FilterQuery {
    filter: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct TableResponse {
    pub title: String,
    pub data_sheet: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub warning: Option<String>,
}

/// Health check response.
#[derive(Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub version: String,
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = match &self {
            DashboardError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DashboardError::NotFound(_) => StatusCode::NOT_FOUND,
            e if e.is_backend() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            log::error!("{}", self);
        }
        (status, self.to_string()).into_response()
    }
}

/// Build the router. Kept apart from `run` so tests can drive it directly.
pub fn create_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route("/", get(serve_dashboard))
        .route("/feedback/:index", post(handle_feedback))
        .route("/api/tables/:index", get(get_table_data))
        .route("/health", get(health))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

pub async fn run(
    config: DashboardConfig,
    backend: Arc<dyn SpreadsheetBackend>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bind = config.bind;
    let state = Arc::new(AppState::new(config, backend)?);
    let app = create_router(state);

    let listener = TcpListener::bind(bind).await?;
    log::info!("Listening on http://{}", bind);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;

    log::info!(
        "{} {} -> {} ({} ms)",
        method,
        uri,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}

async fn serve_dashboard(
    Query(params): Query<DashboardQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, DashboardError> {
    let filter = params.filter.unwrap_or_default();
    let mut tables = Vec::with_capacity(state.config.tables.len());

    // One fresh read per tracked table, in order
    for (index, tracked) in state.config.tables.iter().enumerate() {
        let read = read_table(state.backend.as_ref(), &tracked.data_sheet).await?;
        let mut view = TableView::new(index, tracked, &read, &filter);
        if params.submitted == Some(index) {
            view.acknowledgment = Some(feedback::acknowledgment(tracked));
        }
        tables.push(view);
    }

    let html = state.page.render(&PageView {
        title: state.config.title.clone(),
        filter,
        tables,
    })?;

    Ok(Html(html))
}

async fn handle_feedback(
    Path(index): Path<usize>,
    State(state): State<Arc<AppState>>,
    Form(form): Form<FeedbackForm>,
) -> Result<Redirect, DashboardError> {
    let tracked = state.table(index)?;

    match feedback::submit_feedback(state.backend.as_ref(), tracked, form).await? {
        SubmitOutcome::Appended { .. } => Ok(Redirect::to(&format!(
            "/?submitted={}#table-{}",
            index, index
        ))),
        SubmitOutcome::Skipped => Ok(Redirect::to(&format!("/#table-{}", index))),
    }
}

fn cell_json(cell: &CellValue) -> serde_json::Value {
    serde_json::to_value(cell).unwrap_or(serde_json::Value::Null)
}

fn table_rows(table: &RecordTable) -> Vec<Vec<serde_json::Value>> {
    table
        .rows()
        .iter()
        .map(|row| row.iter().map(cell_json).collect())
        .collect()
}

async fn get_table_data(
    Path(index): Path<usize>,
    Query(params): Query<FilterQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<TableResponse>, DashboardError> {
    let tracked = state.table(index)?;
    let read = read_table(state.backend.as_ref(), &tracked.data_sheet).await?;
    let table = read.table.filtered(params.filter.as_deref().unwrap_or(""));

    Ok(Json(TableResponse {
        title: tracked.title.clone(),
        data_sheet: tracked.data_sheet.clone(),
        columns: table.columns().to_vec(),
        rows: table_rows(&table),
        warning: read.warning,
    }))
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
