// REST API over the expense store (Axum)
//
// Handlers never hold a connection between requests: each store call opens
// and closes its own, on the blocking pool.

use crate::config::parse_budget;
use crate::db::{ExpenseRecord, SUGGESTED_CATEGORIES};
use crate::entry::{submit_expense, ExpenseInput};
use crate::error::TrackerError;
use crate::export::export_csv_string;
use crate::money::Money;
use crate::report::{request_report, Report, ReportOptions};
use crate::store::ExpenseStore;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ExpenseStore>,
    /// Used when a report request does not name a budget
    pub default_budget: Money,
}

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
struct CreatedResponse {
    id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    budget: Option<String>,
    #[serde(default)]
    fill_gaps: bool,
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ApiResponse::<()>::err(message))).into_response()
}

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        let status = if self.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            tracing::error!("request failed: {}", self);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        error_response(status, self.to_string())
    }
}

/// Run a store call on the blocking pool
async fn blocking<T, F>(f: F) -> Result<T, Response>
where
    F: FnOnce() -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(IntoResponse::into_response),
        Err(join_err) => {
            tracing::error!("store task panicked: {}", join_err);
            Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string()))
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/categories - suggested labels for the entry form
async fn get_categories() -> impl IntoResponse {
    Json(ApiResponse::ok(SUGGESTED_CATEGORIES.to_vec()))
}

/// GET /api/expenses
async fn list_expenses(State(state): State<AppState>) -> Response {
    let store = state.store.clone();
    match blocking(move || store.all_records()).await {
        Ok(records) => Json(ApiResponse::<Vec<ExpenseRecord>>::ok(records)).into_response(),
        Err(resp) => resp,
    }
}

/// POST /api/expenses
async fn create_expense(State(state): State<AppState>, Json(input): Json<ExpenseInput>) -> Response {
    let store = state.store.clone();
    match blocking(move || submit_expense(store.as_ref(), &input)).await {
        Ok(id) => (StatusCode::CREATED, Json(ApiResponse::ok(CreatedResponse { id }))).into_response(),
        Err(resp) => resp,
    }
}

/// GET /api/report?budget=1000&fill_gaps=true
async fn get_report(State(state): State<AppState>, Query(query): Query<ReportQuery>) -> Response {
    let budget = match query.budget.as_deref() {
        Some(raw) => match parse_budget(raw) {
            Ok(budget) => budget,
            Err(e) => return TrackerError::from(e).into_response(),
        },
        None => state.default_budget,
    };
    let options = ReportOptions {
        fill_month_gaps: query.fill_gaps,
    };

    let store = state.store.clone();
    match blocking(move || request_report(store.as_ref(), budget, options)).await {
        Ok(report) => Json(ApiResponse::<Report>::ok(report)).into_response(),
        Err(resp) => resp,
    }
}

/// GET /api/export.csv
async fn export_expenses(State(state): State<AppState>) -> Response {
    let store = state.store.clone();
    let csv = blocking(move || {
        let records = store.all_records()?;
        export_csv_string(&records)
    })
    .await;

    match csv {
        Ok(csv) => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"expenses.csv\""),
            ],
            csv,
        )
            .into_response(),
        Err(resp) => resp,
    }
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/categories", get(get_categories))
        .route("/expenses", get(list_expenses).post(create_expense))
        .route("/report", get(get_report))
        .route("/export.csv", get(export_expenses))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}
