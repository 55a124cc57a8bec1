#![cfg(not(tarpaulin_include))]

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;

use crate::config::{AppConfig, MonthSheet};
use crate::paste;
use crate::preview::Preview;
use crate::range::SheetRange;
use crate::report::{Frame, ReportRules, Summary};
use crate::saving::FileStore;
use crate::store::{SheetStore, StoreError, save_paste};
use crate::template;

pub struct AppState {
    config: AppConfig,
    rules: ReportRules,
    store: Mutex<Box<dyn SheetStore + Send>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Box<dyn SheetStore + Send>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let rules = config.report_rules()?;
        Ok(AppState {
            config,
            rules,
            store: Mutex::new(store),
        })
    }

    fn lock_store(&self) -> Result<MutexGuard<'_, Box<dyn SheetStore + Send>>, Response> {
        self.store.lock().map_err(|_| {
            error!("Store lock poisoned");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "store unavailable".to_string())
        })
    }
}

#[derive(Deserialize)]
struct PasteRequest {
    text: String,
}

#[derive(Deserialize)]
struct SaveRequest {
    month: String,
    text: String,
}

#[derive(Deserialize)]
struct ReportQuery {
    month: Option<String>,
}

#[derive(Serialize)]
struct StatusResponse {
    status: String,
    message: Option<String>,
}

#[derive(Serialize)]
struct PreviewResponse {
    status: String,
    message: String,
    preview: Preview,
}

#[derive(Serialize)]
struct SaveResponse {
    status: String,
    message: String,
    sheet: String,
    rows: usize,
}

#[derive(Serialize)]
struct ReportResponse {
    status: String,
    message: String,
    month: String,
    sheet: String,
    frame: Frame,
    summary: Summary,
}

#[derive(Serialize)]
struct AppStatus {
    app_name: String,
    version: String,
    sheets: Vec<String>,
}

/// Build the HTTP routes around shared application state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve_dashboard))
        .route("/api/status", get(get_status))
        .route("/api/months", get(get_months))
        .route("/api/preview", post(preview_paste))
        .route("/api/save", post(save_pasted))
        .route("/api/report", get(get_report))
        .with_state(state)
}

/// Open the configured workbook and serve the dashboard until shutdown.
pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = FileStore::open(&config.store_path, &config.sheet_names())?;
    if store.is_fresh() {
        let demo_sheet = config
            .months
            .first()
            .filter(|_| config.seed_demo)
            .map(|m| m.sheet.clone());
        template::initialise(&mut store, config.start_row, demo_sheet.as_deref())?;
    }

    let bind = config.bind.clone();
    let state = Arc::new(AppState::new(config, Box::new(store))?);
    let app = router(state);

    let listener = TcpListener::bind(&bind).await?;
    info!("Listening on http://{}", bind);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_dashboard() -> Html<&'static str> {
    Html(include_str!("./static/dashboard.html"))
}

async fn get_status(State(state): State<Arc<AppState>>) -> Response {
    let store = match state.lock_store() {
        Ok(store) => store,
        Err(response) => return response,
    };

    Json(AppStatus {
        app_name: state.config.app_name.clone(),
        version: state.config.version.clone(),
        sheets: store.sheet_names(),
    })
    .into_response()
}

async fn get_months(State(state): State<Arc<AppState>>) -> Json<Vec<MonthSheet>> {
    Json(state.config.months.clone())
}

async fn preview_paste(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PasteRequest>,
) -> Json<PreviewResponse> {
    let table = paste::parse(&payload.text);
    let preview = Preview::build(&table, state.config.preview_limit);

    let (status, message) = if preview.is_empty() {
        ("empty", "No data pasted yet".to_string())
    } else {
        (
            "ok",
            format!(
                "Parsed {} rows, {} columns",
                preview.total_rows, preview.column_count
            ),
        )
    };

    Json(PreviewResponse {
        status: status.to_string(),
        message,
        preview,
    })
}

async fn save_pasted(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SaveRequest>,
) -> Response {
    let table = paste::parse(&payload.text);
    if table.is_empty() {
        return failure(StatusCode::BAD_REQUEST, "Nothing to save".to_string());
    }

    let sheet = state.config.sheet_for_month(&payload.month).to_string();
    let mut store = match state.lock_store() {
        Ok(store) => store,
        Err(response) => return response,
    };

    match save_paste(&mut **store, &sheet, state.config.start_row, &table) {
        Ok(rows) => Json(SaveResponse {
            status: "ok".to_string(),
            message: format!("Saved {} rows to {}", rows, sheet),
            sheet,
            rows,
        })
        .into_response(),
        Err(e) => store_failure(e),
    }
}

async fn get_report(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportQuery>,
) -> Response {
    let month = params.month.unwrap_or_default();
    let sheet = state.config.sheet_for_month(&month).to_string();

    let values = {
        let store = match state.lock_store() {
            Ok(store) => store,
            Err(response) => return response,
        };
        match store.read(&SheetRange::sheet(sheet.as_str())) {
            Ok(values) => values,
            Err(e) => return store_failure(e),
        }
    };

    let frame = Frame::from_values(
        values.rows(),
        &state.config.header_marker,
        state.config.max_row,
    );
    let summary = Summary::compute(&frame, &state.rules);
    let (status, message) = if frame.is_empty() {
        ("empty", format!("No data in {}", sheet))
    } else {
        ("ok", format!("Loaded {} rows from {}", frame.rows.len(), sheet))
    };

    Json(ReportResponse {
        status: status.to_string(),
        message,
        month,
        sheet,
        frame,
        summary,
    })
    .into_response()
}

fn failure(code: StatusCode, message: String) -> Response {
    (
        code,
        Json(StatusResponse {
            status: "error".to_string(),
            message: Some(message),
        }),
    )
        .into_response()
}

fn store_failure(err: StoreError) -> Response {
    let code = match &err {
        StoreError::SheetNotFound(_) => StatusCode::NOT_FOUND,
        StoreError::InvalidRange(_) => StatusCode::BAD_REQUEST,
        StoreError::Io(_) | StoreError::Codec(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if code.is_server_error() {
        error!("Store request failed: {}", err);
    } else {
        warn!("Store request rejected: {}", err);
    }
    failure(code, err.to_string())
}
