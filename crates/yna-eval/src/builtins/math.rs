//! The `math` builtin: generic arithmetic over text operands.
//!
//! ```text
//! math(op, operand, operand, ...)
//! ```
//!
//! `op` is a tag (`add`, `idiv`, ...) or one of its symbolic aliases. The
//! alias is resolved to a [`MathOp`] once; arity is checked, then every
//! operand is coerced to the operator's operand kind, then the operator runs.

use super::required;
use crate::coerce;
use crate::invocation::Invocation;
use crate::registry::Kwargs;
use yna_types::{ErrorKind, VarValue, YnaError, YnaResult};

/// Arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOp {
    Add,
    Sub,
    Mul,
    Div,
    IDiv,
    Mod,
    Pow,
    And,
    Or,
    Xor,
    Not,
    Max,
    Min,
    Floor,
    Ceil,
    Round,
}

/// What operands of a [`MathOp`] are coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    Float,
    Int,
}

impl MathOp {
    /// Resolve a tag or symbolic alias.
    pub fn resolve(tag: &str) -> Option<Self> {
        let op = match tag.trim() {
            "add" | "+" => Self::Add,
            "sub" | "-" => Self::Sub,
            "mul" | "*" => Self::Mul,
            "div" | "/" | "/f" => Self::Div,
            "idiv" | "//" => Self::IDiv,
            "mod" | "%" => Self::Mod,
            "pow" | "**" => Self::Pow,
            "and" | "&" => Self::And,
            "or" | "|" => Self::Or,
            "xor" | "^" => Self::Xor,
            "not" | "~" => Self::Not,
            "max" => Self::Max,
            "min" => Self::Min,
            "floor" => Self::Floor,
            "ceil" => Self::Ceil,
            "round" => Self::Round,
            _ => return None,
        };
        Some(op)
    }

    pub fn min_arity(self) -> usize {
        match self {
            Self::Not | Self::Floor | Self::Ceil | Self::Round => 1,
            _ => 2,
        }
    }

    pub fn operand_kind(self) -> OperandKind {
        match self {
            Self::IDiv | Self::Mod | Self::And | Self::Or | Self::Xor | Self::Not => {
                OperandKind::Int
            }
            _ => OperandKind::Float,
        }
    }
}

/// `math(op, operands...)`.
pub fn math(_inv: &mut Invocation<'_>, args: &[String], kwargs: &Kwargs) -> YnaResult<VarValue> {
    let tag = required(args, kwargs, 0, "op")?;
    let operands = args.get(1..).unwrap_or_default();
    let op = MathOp::resolve(tag).ok_or_else(|| {
        YnaError::with_message(ErrorKind::UnknownOperator, format!("unknown op '{tag}'"))
    })?;
    Ok(apply(op, operands)?.into())
}

/// Check arity, coerce, and run `op`, returning the rendered result.
pub fn apply(op: MathOp, operands: &[String]) -> YnaResult<String> {
    if operands.is_empty() {
        return Err(YnaError::with_message(ErrorKind::InvalidArguments, "no args"));
    }
    if operands.len() < op.min_arity() {
        return Err(YnaError::with_message(
            ErrorKind::InvalidArguments,
            format!("needs at least {} args", op.min_arity()),
        ));
    }
    match op.operand_kind() {
        OperandKind::Float => {
            let values = operands
                .iter()
                .enumerate()
                .map(|(i, raw)| {
                    let message = format!("non-float arg {}", i + 1);
                    coerce::float(raw, ErrorKind::NonFloatArgument, &message)
                })
                .collect::<YnaResult<Vec<f64>>>()?;
            let result = apply_float(op, &values)?;
            check_finite(result).map(coerce::format_float)
        }
        OperandKind::Int => {
            let values = operands
                .iter()
                .enumerate()
                .map(|(i, raw)| {
                    let message = format!("non-int arg {}", i + 1);
                    coerce::int(raw, ErrorKind::NonIntArgument, &message)
                })
                .collect::<YnaResult<Vec<i64>>>()?;
            apply_int(op, &values).map(|n| n.to_string())
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Float operators
// ══════════════════════════════════════════════════════════════════════════════

fn apply_float(op: MathOp, v: &[f64]) -> YnaResult<f64> {
    let (a, rest) = (v[0], &v[1..]);
    let result = match op {
        MathOp::Add => rest.iter().fold(a, |acc, b| acc + b),
        MathOp::Mul => rest.iter().fold(a, |acc, b| acc * b),
        MathOp::Sub => a - rest[0],
        MathOp::Div => {
            if rest[0] == 0.0 {
                return Err(YnaError::new(ErrorKind::DivideByZero));
            }
            a / rest[0]
        }
        MathOp::Pow => a.powf(rest[0]),
        MathOp::Max => rest.iter().fold(a, |acc, &b| acc.max(b)),
        MathOp::Min => rest.iter().fold(a, |acc, &b| acc.min(b)),
        MathOp::Floor => a.floor(),
        MathOp::Ceil => a.ceil(),
        MathOp::Round => a.round_ties_even(),
        MathOp::IDiv | MathOp::Mod | MathOp::And | MathOp::Or | MathOp::Xor | MathOp::Not => {
            unreachable!("integer operator")
        }
    };
    Ok(result)
}

/// Map non-finite results onto the overflow policy.
fn check_finite(n: f64) -> YnaResult<f64> {
    if n.is_nan() {
        Err(YnaError::new(ErrorKind::NotANumber))
    } else if n == f64::INFINITY {
        Err(YnaError::new(ErrorKind::Overflow))
    } else if n == f64::NEG_INFINITY {
        Err(YnaError::new(ErrorKind::Underflow))
    } else {
        Ok(n)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Integer operators
// ══════════════════════════════════════════════════════════════════════════════

fn apply_int(op: MathOp, v: &[i64]) -> YnaResult<i64> {
    let (a, rest) = (v[0], &v[1..]);
    match op {
        MathOp::IDiv => floor_div(a, rest[0]),
        MathOp::Mod => floor_mod(a, rest[0]),
        MathOp::And => Ok(rest.iter().fold(a, |acc, b| acc & b)),
        MathOp::Or => Ok(rest.iter().fold(a, |acc, b| acc | b)),
        MathOp::Xor => Ok(a ^ rest[0]),
        MathOp::Not => Ok(!a),
        _ => unreachable!("float operator"),
    }
}

/// Division rounding toward negative infinity.
fn floor_div(a: i64, b: i64) -> YnaResult<i64> {
    if b == 0 {
        return Err(YnaError::new(ErrorKind::DivideByZero));
    }
    let q = a.checked_div(b).ok_or_else(|| YnaError::new(ErrorKind::Overflow))?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Ok(q - 1)
    } else {
        Ok(q)
    }
}

/// Remainder taking the sign of the divisor.
fn floor_mod(a: i64, b: i64) -> YnaResult<i64> {
    if b == 0 {
        return Err(YnaError::new(ErrorKind::DivideByZero));
    }
    let r = a.wrapping_rem(b);
    if r != 0 && ((r < 0) != (b < 0)) {
        Ok(r + b)
    } else {
        Ok(r)
    }
}
