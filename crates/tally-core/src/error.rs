use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure taxonomy for expression evaluation.
///
/// The first four variants classify bad input. `Internal` covers faults
/// outside the input taxonomy (non-finite arithmetic results), so callers
/// can tell "your input is bad" apart from "we broke".
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum EvalError {
    #[error("nothing to evaluate")]
    EmptyExpression,
    #[error("unsupported operator '{0}'")]
    UnsupportedOperator(char),
    #[error("division by zero")]
    DivisionByZero,
    #[error("invalid expression format")]
    InvalidFormat,
    #[error("internal evaluation failure: {0}")]
    Internal(String),
}
