//! Tally core crate.
//!
//! This crate intentionally separates evaluation concerns into layers:
//!
//! - `validate`: lexical/syntactic gatekeeper over raw expression text.
//! - `parser`: tokenizer plus recursive-descent parser producing a typed
//!   [`Expr`](expr::Expr) tree.
//! - `eval`: fast-path binary evaluation and tree interpretation.
//! - `value`: the [`Numeric`](value::Numeric) result type and its
//!   formatting rules (integral collapse, ten-digit decimal rounding).
//!
//! The two public entry points are deliberately decoupled pure functions:
//! [`validate`](validate::validate) never feeds state into
//! [`evaluate`](eval::evaluate), and the evaluator re-checks the character
//! set on its own, so either is safe to call directly and both are safe to
//! call concurrently.

pub mod error;
pub mod eval;
pub mod expr;
pub mod parser;
pub mod validate;
pub mod value;

pub use error::EvalError;
pub use eval::evaluate;
pub use expr::Expr;
pub use parser::parse;
pub use validate::validate;
pub use value::Numeric;
