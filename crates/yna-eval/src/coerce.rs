//! Text → number coercion for builtin arguments.
//!
//! Parse failures become [`YnaError`]s carrying the parse error as cause.

use yna_types::{ErrorKind, YnaError, YnaResult};

/// Parse an integer, tolerating surrounding whitespace.
pub fn int(value: &str, kind: ErrorKind, message: &str) -> YnaResult<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|e| YnaError::with_message(kind, message).caused_by(e))
}

/// Parse a float, tolerating surrounding whitespace.
pub fn float(value: &str, kind: ErrorKind, message: &str) -> YnaResult<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|e| YnaError::with_message(kind, message).caused_by(e))
}

/// Parse an optional integer: blank text yields `default`.
pub fn int_or(value: &str, default: i64, kind: ErrorKind, message: &str) -> YnaResult<i64> {
    if value.trim().is_empty() {
        Ok(default)
    } else {
        int(value, kind, message)
    }
}

/// Render a float the way templates expect: integral values without a
/// fractional part.
pub fn format_float(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
