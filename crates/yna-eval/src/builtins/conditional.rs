//! The `when` conditional.
//!
//! ```text
//! when(arg1, op, arg2, on_true, on_false?)
//! ```
//!
//! Operands arrive already evaluated. Branches arrive deferred and exactly
//! one of them runs, in the calling context.

use crate::coerce;
use crate::env::{ContextArena, ContextId};
use crate::invocation::Invocation;
use regex::Regex;
use std::borrow::Cow;
use yna_types::{ErrorKind, YnaError, YnaResult};

/// A deferred branch, evaluated in the calling context.
pub type Branch<'b> = Box<dyn FnOnce(&mut ContextArena, ContextId) -> YnaResult<String> + 'b>;

/// The left operand of `when`.
///
/// Evaluating it may itself have failed; the failure is kept so that
/// `is error` can test for it.
#[derive(Debug, Clone)]
pub enum Operand {
    Text(String),
    Failed(YnaError),
}

impl Operand {
    /// Text form; a failure renders as its inline diagnostic.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(s) => Cow::Borrowed(s),
            Self::Failed(e) => Cow::Owned(e.to_string()),
        }
    }
}

impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<YnaResult<String>> for Operand {
    fn from(result: YnaResult<String>) -> Self {
        match result {
            Ok(s) => Self::Text(s),
            Err(e) => Self::Failed(e),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Operators
// ══════════════════════════════════════════════════════════════════════════════

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhenOp {
    /// String equality.
    Eq,
    /// String inequality.
    Ne,
    /// Integer `<`.
    Lt,
    /// Integer `<=`.
    Le,
    /// Integer `>`.
    Gt,
    /// Integer `>=`.
    Ge,
    /// Substring, or membership in a comma-separated list.
    In,
    /// Type predicate named by the right operand.
    Is,
}

impl WhenOp {
    pub fn from_name(name: &str) -> Option<Self> {
        let op = match name {
            "eq" => Self::Eq,
            "ne" => Self::Ne,
            "lt" => Self::Lt,
            "le" => Self::Le,
            "gt" => Self::Gt,
            "ge" => Self::Ge,
            "in" => Self::In,
            "is" => Self::Is,
            _ => return None,
        };
        Some(op)
    }
}

/// The right operand of `is`.
#[derive(Debug, Clone)]
pub enum TypeTest {
    /// Exactly one whitespace-free word.
    Word,
    /// Non-empty and alphabetic.
    Letter,
    /// Parses as an integer.
    Number,
    /// Parses as a float.
    Decimal,
    /// The left operand is a failed evaluation.
    Error,
    /// `/pattern/`, matched from the start of the left operand.
    Pattern(Regex),
}

impl TypeTest {
    pub fn parse(name: &str) -> YnaResult<Self> {
        let test = match name {
            "word" => Self::Word,
            "letter" => Self::Letter,
            "number" => Self::Number,
            "decimal" => Self::Decimal,
            "error" => Self::Error,
            _ => {
                let pattern = name
                    .strip_prefix('/')
                    .and_then(|rest| rest.strip_suffix('/'))
                    .ok_or_else(|| {
                        YnaError::with_message(
                            ErrorKind::InvalidTypeName,
                            format!("invalid type name '{name}'"),
                        )
                    })?;
                let re = Regex::new(&format!("^(?:{pattern})"))
                    .map_err(|e| YnaError::new(ErrorKind::InvalidRegex).caused_by(e))?;
                Self::Pattern(re)
            }
        };
        Ok(test)
    }

    pub fn matches(&self, operand: &Operand) -> bool {
        let text = match (self, operand) {
            (Self::Error, operand) => return matches!(operand, Operand::Failed(_)),
            (_, Operand::Failed(_)) => return false,
            (_, Operand::Text(text)) => text,
        };
        match self {
            Self::Word => text.split_whitespace().count() == 1,
            Self::Letter => !text.is_empty() && text.chars().all(char::is_alphabetic),
            Self::Number => text.trim().parse::<i64>().is_ok(),
            Self::Decimal => text.trim().parse::<f64>().is_ok(),
            Self::Pattern(re) => re.is_match(text),
            Self::Error => unreachable!("handled above"),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Evaluation
// ══════════════════════════════════════════════════════════════════════════════

/// Decide the condition without running either branch.
pub fn evaluate_condition(arg1: &Operand, op: &str, arg2: &str) -> YnaResult<bool> {
    let op = WhenOp::from_name(op).ok_or_else(|| {
        YnaError::with_message(ErrorKind::InvalidOperator, format!("invalid op '{op}'"))
    })?;
    let condition = match op {
        WhenOp::Eq => arg1.text() == arg2,
        WhenOp::Ne => arg1.text() != arg2,
        WhenOp::Lt => compare(arg1, arg2, |a, b| a < b)?,
        WhenOp::Le => compare(arg1, arg2, |a, b| a <= b)?,
        WhenOp::Gt => compare(arg1, arg2, |a, b| a > b)?,
        WhenOp::Ge => compare(arg1, arg2, |a, b| a >= b)?,
        WhenOp::In => {
            let Operand::Text(needle) = arg1 else {
                return Err(YnaError::with_message(
                    ErrorKind::InvalidArgument,
                    "args do not support in",
                ));
            };
            if arg2.contains(',') {
                arg2.split(',').any(|alt| alt == needle.as_str())
            } else {
                arg2.contains(needle.as_str())
            }
        }
        WhenOp::Is => TypeTest::parse(arg2)?.matches(arg1),
    };
    Ok(condition)
}

fn compare(arg1: &Operand, arg2: &str, op: fn(i64, i64) -> bool) -> YnaResult<bool> {
    const MESSAGE: &str = "args must be numbers";
    let left = match arg1 {
        Operand::Text(text) => coerce::int(text, ErrorKind::InvalidArgument, MESSAGE)?,
        Operand::Failed(_) => {
            return Err(YnaError::with_message(ErrorKind::InvalidArgument, MESSAGE))
        }
    };
    let right = coerce::int(arg2, ErrorKind::InvalidArgument, MESSAGE)?;
    Ok(op(left, right))
}

/// Run `when`: test the condition, then evaluate exactly one branch.
///
/// A missing `on_false` yields empty output.
pub fn when(
    inv: &mut Invocation<'_>,
    arg1: &Operand,
    op: &str,
    arg2: &str,
    on_true: Branch<'_>,
    on_false: Option<Branch<'_>>,
) -> YnaResult<String> {
    let condition = evaluate_condition(arg1, op, arg2).map_err(|e| e.attributed("when"))?;
    let ctx = inv.context();
    if condition {
        on_true(inv.arena_mut(), ctx)
    } else {
        match on_false {
            Some(branch) => branch(inv.arena_mut(), ctx),
            None => Ok(String::new()),
        }
    }
}
