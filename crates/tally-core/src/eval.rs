//! Expression evaluation.
//!
//! Two tiers: a fast path that recognizes plain `<number><op><number>`
//! input without building a tree, and a general path that parses the full
//! grammar and walks the resulting [`Expr`]. Both tiers feed the same
//! [`Numeric::from_f64`] formatting, so results are identical regardless
//! of which tier handled the input.

use crate::error::EvalError;
use crate::expr::Expr;
use crate::parser::parse;
use crate::value::Numeric;

/// Evaluate an arithmetic expression.
///
/// Whitespace is insignificant anywhere in the input. Fails with
/// [`EvalError::EmptyExpression`] on blank input, [`EvalError::DivisionByZero`]
/// on a zero divisor, and [`EvalError::InvalidFormat`] on anything that is
/// not a well-formed arithmetic expression.
pub fn evaluate(expression: &str) -> Result<Numeric, EvalError> {
    let stripped: String = expression.chars().filter(|c| !c.is_whitespace()).collect();
    if stripped.is_empty() {
        return Err(EvalError::EmptyExpression);
    }

    if let Some((lhs, op, rhs)) = match_binary(&stripped) {
        return eval_binary(lhs, op, rhs);
    }

    // The character whitelist is re-checked here rather than trusted from
    // the validator; the two functions stay independently callable.
    if !stripped.chars().all(is_allowed_char) {
        return Err(EvalError::InvalidFormat);
    }

    let tree = parse(&stripped)?;
    let raw = eval_tree(&tree)?;
    Numeric::from_f64(raw)
}

fn is_allowed_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '+' | '-' | '*' | '/' | '.' | '(' | ')')
}

fn eval_binary(lhs: f64, op: char, rhs: f64) -> Result<Numeric, EvalError> {
    if op == '/' && rhs == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    let raw = apply_op(op, lhs, rhs)?;
    Numeric::from_f64(raw)
}

/// Apply a binary operator. The wildcard arm is defensive — both call
/// sites only ever pass the four known operators.
fn apply_op(op: char, lhs: f64, rhs: f64) -> Result<f64, EvalError> {
    match op {
        '+' => Ok(lhs + rhs),
        '-' => Ok(lhs - rhs),
        '*' => Ok(lhs * rhs),
        '/' => Ok(lhs / rhs),
        other => Err(EvalError::UnsupportedOperator(other)),
    }
}

/// Split whitespace-stripped input into `<number><op><number>` without
/// building a tree. `None` means the shape doesn't match and the general
/// path takes over — including for signed operands.
fn match_binary(s: &str) -> Option<(f64, char, f64)> {
    let bytes = s.as_bytes();
    let lhs_end = scan_number(bytes, 0)?;
    let op = *bytes.get(lhs_end)? as char;
    if !matches!(op, '+' | '-' | '*' | '/') {
        return None;
    }
    let rhs_end = scan_number(bytes, lhs_end + 1)?;
    if rhs_end != bytes.len() {
        return None;
    }
    let lhs = s[..lhs_end].parse::<f64>().ok()?;
    let rhs = s[lhs_end + 1..].parse::<f64>().ok()?;
    Some((lhs, op, rhs))
}

/// Scan a sign-less decimal literal starting at `from`. Returns the end
/// offset, or `None` when no digit was consumed or a second dot appears.
fn scan_number(bytes: &[u8], from: usize) -> Option<usize> {
    let mut i = from;
    let mut digits = 0usize;
    let mut dots = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'0'..=b'9' => digits += 1,
            b'.' => {
                dots += 1;
                if dots > 1 {
                    return None;
                }
            }
            _ => break,
        }
        i += 1;
    }
    if digits == 0 {
        None
    } else {
        Some(i)
    }
}

fn eval_tree(expr: &Expr) -> Result<f64, EvalError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Neg(inner) => Ok(-eval_tree(inner)?),
        Expr::Add(a, b) => Ok(eval_tree(a)? + eval_tree(b)?),
        Expr::Sub(a, b) => Ok(eval_tree(a)? - eval_tree(b)?),
        Expr::Mul(a, b) => Ok(eval_tree(a)? * eval_tree(b)?),
        Expr::Div(a, b) => {
            let numer = eval_tree(a)?;
            let denom = eval_tree(b)?;
            if denom == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Ok(numer / denom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate;

    #[test]
    fn test_simple_binary_operations() {
        assert_eq!(evaluate("2 + 3").unwrap(), Numeric::Integer(5));
        assert_eq!(evaluate("10 - 4").unwrap(), Numeric::Integer(6));
        assert_eq!(evaluate("6 * 7").unwrap(), Numeric::Integer(42));
        assert_eq!(evaluate("15 / 3").unwrap(), Numeric::Integer(5));
    }

    #[test]
    fn test_decimal_operands_with_integral_result() {
        assert_eq!(evaluate("2.5 + 1.5").unwrap(), Numeric::Integer(4));
        assert_eq!(evaluate("4.0 / 2.0").unwrap(), Numeric::Integer(2));
    }

    #[test]
    fn test_fractional_result_rounds_to_ten_places() {
        assert_eq!(evaluate("2 / 3").unwrap(), Numeric::Decimal(0.6666666667));
        assert_eq!(evaluate("1.5 + 1").unwrap(), Numeric::Decimal(2.5));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(evaluate("10 / 0"), Err(EvalError::DivisionByZero));
        assert_eq!(evaluate("10 / 0.0"), Err(EvalError::DivisionByZero));
        // Zero divisor reached only through the general path.
        assert_eq!(evaluate("1 / (2 - 2)"), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_empty_expression() {
        assert_eq!(evaluate(""), Err(EvalError::EmptyExpression));
        assert_eq!(evaluate("   "), Err(EvalError::EmptyExpression));
    }

    #[test]
    fn test_consecutive_operators_rejected() {
        assert_eq!(evaluate("2 + + 3"), Err(EvalError::InvalidFormat));
        assert_eq!(evaluate("2 */ 3"), Err(EvalError::InvalidFormat));
    }

    #[test]
    fn test_invalid_characters_rejected() {
        assert_eq!(evaluate("2 + x"), Err(EvalError::InvalidFormat));
        assert_eq!(evaluate("import os"), Err(EvalError::InvalidFormat));
    }

    #[test]
    fn test_precedence_and_parentheses() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), Numeric::Integer(14));
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), Numeric::Integer(20));
        assert_eq!(evaluate("(2 + 3) * (4 - 1)").unwrap(), Numeric::Integer(15));
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(evaluate("10 - 2 - 3").unwrap(), Numeric::Integer(5));
        assert_eq!(evaluate("100 / 10 / 2").unwrap(), Numeric::Integer(5));
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(evaluate("-5 + 3").unwrap(), Numeric::Integer(-2));
        assert_eq!(evaluate("-(2 + 3)").unwrap(), Numeric::Integer(-5));
        assert_eq!(evaluate("-(-2)").unwrap(), Numeric::Integer(2));
        assert_eq!(evaluate("3 * -2").unwrap(), Numeric::Integer(-6));
    }

    #[test]
    fn test_single_number_passes_through() {
        assert_eq!(evaluate("42").unwrap(), Numeric::Integer(42));
        assert_eq!(evaluate(".5").unwrap(), Numeric::Decimal(0.5));
    }

    #[test]
    fn test_whitespace_inside_numbers_is_insignificant() {
        // Whitespace is stripped before any token forms, matching the
        // validator's shape rules.
        assert_eq!(evaluate("1 2 + 3").unwrap(), Numeric::Integer(15));
    }

    #[test]
    fn test_chained_expression_uses_general_path() {
        assert_eq!(evaluate("1 + 2 + 3 + 4").unwrap(), Numeric::Integer(10));
    }

    #[test]
    fn test_validated_input_always_evaluates() {
        // Everything the validator accepts must evaluate (division by zero
        // aside) — the two accept sets stay consistent.
        let accepted = [
            "2 + 3",
            "2.5 + 1.5",
            "-5 + 3",
            "(1 + 2)",
            "(2 + 3) * (4 - 1)",
            "10 - 2 - 3",
            "3 * -2",
            "-(-2)",
            ".5 + 1",
            "42",
        ];
        for input in accepted {
            assert!(validate(input), "validator should accept {input:?}");
            let result = evaluate(input);
            assert!(
                !matches!(result, Err(EvalError::InvalidFormat)),
                "evaluate must not reject validated input {input:?}, got {result:?}"
            );
        }
    }
}
