//! Axum router and handlers for the calculator API.
//!
//! The handlers stay thin: validate/evaluate through the pure core, then
//! persist or query through [`HistoryStore`]. Session correlation rides on
//! the `X-Session-ID` header the whole way through.

use axum::Json;
use axum::Router;
use axum::extract::{Path as AxumPath, Query, State as AxumState};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tally_core::{evaluate, validate};
use uuid::Uuid;

use crate::api::{
    CalculateRequest, CalculateResponse, ErrorBody, MessageResponse, ValidateResponse,
    eval_error_response, store_error_response,
};
use crate::history::HistoryStore;

/// Header carrying the opaque session token.
pub const SESSION_HEADER: &str = "x-session-id";

/// History page size when the caller doesn't ask for one.
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

pub struct AppState {
    pub store: HistoryStore,
    /// Upper bound on `?limit=`; requests above it are clamped.
    pub history_limit: u32,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api", get(api_root))
        .route("/api/calculator/calculate", post(calculate))
        .route("/api/calculator/validate", post(validate_expression))
        .route("/api/calculator/clear", post(clear_history))
        .route("/api/history", get(get_history))
        .route("/api/history/{id}", delete(delete_calculation))
        .with_state(state)
}

async fn api_root() -> Response {
    Json(json!({
        "name": "Tally API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "calculate": "/api/calculator/calculate",
            "validate": "/api/calculator/validate",
            "clear_history": "/api/calculator/clear",
            "history": "/api/history",
            "delete_calculation": "/api/history/{id}",
        },
    }))
    .into_response()
}

async fn calculate(
    AxumState(state): AxumState<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CalculateRequest>,
) -> Response {
    let expression = req.expression.trim().to_string();
    let session_id =
        session_from_headers(&headers).unwrap_or_else(|| Uuid::new_v4().to_string());

    if !validate(&expression) {
        let body = ErrorBody::new(
            "Invalid expression",
            "Expression contains invalid characters or syntax",
        );
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
    }

    let result = match evaluate(&expression) {
        Ok(value) => value,
        Err(err) => {
            let (status, body) = eval_error_response(&err);
            return (status, Json(body)).into_response();
        }
    };

    // Only successful calculations land in history.
    if let Err(err) = state.store.record(&expression, &result.to_string(), &session_id) {
        let (status, body) = store_error_response(&err);
        return (status, Json(body)).into_response();
    }

    Json(CalculateResponse {
        expression,
        result,
        session_id,
    })
    .into_response()
}

async fn validate_expression(Json(req): Json<CalculateRequest>) -> Response {
    let expression = req.expression.trim().to_string();
    let is_valid = validate(&expression);
    Json(ValidateResponse {
        expression,
        is_valid,
    })
    .into_response()
}

async fn clear_history(
    AxumState(state): AxumState<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    // Clearing without a session is a no-op success.
    if let Some(session_id) = session_from_headers(&headers) {
        if let Err(err) = state.store.clear(&session_id) {
            let (status, body) = store_error_response(&err);
            return (status, Json(body)).into_response();
        }
    }
    Json(MessageResponse {
        message: "History cleared successfully".to_string(),
    })
    .into_response()
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<u32>,
}

async fn get_history(
    AxumState(state): AxumState<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let Some(session_id) = session_from_headers(&headers) else {
        let body = ErrorBody::new("Session ID required", "Set the X-Session-ID header");
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
    };

    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .min(state.history_limit);

    match state.store.list(&session_id, limit) {
        Ok(records) => Json(records).into_response(),
        Err(err) => {
            let (status, body) = store_error_response(&err);
            (status, Json(body)).into_response()
        }
    }
}

async fn delete_calculation(
    AxumState(state): AxumState<Arc<AppState>>,
    AxumPath(id): AxumPath<i64>,
) -> Response {
    match state.store.delete(id) {
        Ok(true) => Json(MessageResponse {
            message: "Calculation deleted successfully".to_string(),
        })
        .into_response(),
        Ok(false) => {
            let body = ErrorBody::new("Calculation not found", format!("no calculation with id {id}"));
            (StatusCode::NOT_FOUND, Json(body)).into_response()
        }
        Err(err) => {
            let (status, body) = store_error_response(&err);
            (status, Json(body)).into_response()
        }
    }
}

fn session_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
