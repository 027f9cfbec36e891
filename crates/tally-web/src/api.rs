//! Wire envelopes and error mapping for the calculator API.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tally_core::{EvalError, Numeric};

use crate::history::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateRequest {
    #[serde(default)]
    pub expression: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateResponse {
    pub expression: String,
    pub result: Numeric,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub expression: String,
    pub is_valid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// Map an evaluation failure onto the HTTP contract: the four user-input
/// kinds are 400, internal faults are 500 with a generic message.
pub fn eval_error_response(err: &EvalError) -> (StatusCode, ErrorBody) {
    match err {
        EvalError::DivisionByZero => (
            StatusCode::BAD_REQUEST,
            ErrorBody::new("Division by zero", "Cannot divide by zero"),
        ),
        EvalError::EmptyExpression
        | EvalError::UnsupportedOperator(_)
        | EvalError::InvalidFormat => (
            StatusCode::BAD_REQUEST,
            ErrorBody::new("Invalid calculation", err.to_string()),
        ),
        EvalError::Internal(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody::new("Calculation failed", "An unexpected error occurred"),
        ),
    }
}

pub fn store_error_response(err: &StoreError) -> (StatusCode, ErrorBody) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorBody::new("Internal server error", err.to_string()),
    )
}
