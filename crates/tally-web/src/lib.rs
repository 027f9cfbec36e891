//! Tally web crate: the HTTP surface over the pure core.
//!
//! `history` owns the SQLite-backed calculation log, `api` the wire
//! envelopes and the error→status mapping, `routes` the axum router the
//! server binary mounts. The core stays a pair of pure functions; every
//! piece of state lives here.

pub mod api;
pub mod history;
pub mod routes;

pub use api::{
    CalculateRequest, CalculateResponse, ErrorBody, MessageResponse, ValidateResponse,
    eval_error_response, store_error_response,
};
pub use history::{CalculationRecord, HistoryStore, StoreError, StoreResult};
pub use routes::{AppState, DEFAULT_HISTORY_LIMIT, SESSION_HEADER, router};
