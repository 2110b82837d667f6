//! The builtin library.
//!
//! `conditional`, `iteration` and `math` carry real interpreter semantics;
//! the rest are small transformations over text, randomness, and members.

pub mod conditional;
pub mod iteration;
pub mod math;
pub mod members;
pub mod random;
pub mod text;
pub mod time;
pub mod variables;

use crate::invocation::Capabilities;
use crate::registry::{BuiltinKind, BuiltinRegistry, Kwargs};
use yna_types::{ErrorKind, YnaError, YnaResult};

/// Register every standard builtin with its capabilities.
pub fn register_standard(reg: &mut BuiltinRegistry) {
    let none = Capabilities::NONE;
    let storable = Capabilities::NONE.result_storable();

    // ── Text ──
    reg.register_simple("upper", none, text::upper);
    reg.register_simple("lower", none, text::lower);
    reg.register_simple("title", none, text::title);
    reg.register_simple("len", none, text::len);
    reg.register_simple("slice", none, text::slice);
    reg.register_simple("parse", none, text::parse);
    reg.register_simple("rep", none, text::rep);
    reg.register_simple("void", none, text::void);

    // ── Variables ──
    reg.register_simple("set", none, variables::set);
    reg.register_simple("split", none, variables::split);

    // ── Members ──
    reg.register_simple("user", storable, members::user);
    reg.register_simple("nameof", storable, members::nameof);
    reg.register_simple("member", none, members::member);

    // ── Randomness ──
    reg.register_simple("choose", storable, random::choose);
    reg.register_simple("wchoose", storable, random::wchoose);
    reg.register_simple("num", storable, random::num);

    // ── Time ──
    reg.register_simple("time", storable.callable_as_variable(), time::time);

    // ── Structural ──
    reg.register("when", none, BuiltinKind::Conditional);
    reg.register("loop", none, BuiltinKind::Iteration);
    reg.register_simple("math", none, math::math);
}

// ══════════════════════════════════════════════════════════════════════════════
// Argument helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Positional argument `index`, falling back to keyword `key`.
pub(crate) fn arg<'a>(
    args: &'a [String],
    kwargs: &'a Kwargs,
    index: usize,
    key: &str,
) -> Option<&'a str> {
    args.get(index)
        .or_else(|| kwargs.get(key))
        .map(String::as_str)
}

/// Like [`arg`], but missing arguments fail with `InvalidArguments`.
pub(crate) fn required<'a>(
    args: &'a [String],
    kwargs: &'a Kwargs,
    index: usize,
    key: &str,
) -> YnaResult<&'a str> {
    arg(args, kwargs, index, key).ok_or_else(|| {
        YnaError::with_message(ErrorKind::InvalidArguments, format!("missing {key}"))
    })
}

/// Fail when more than `max` positional arguments were given.
pub(crate) fn at_most(args: &[String], max: usize) -> YnaResult<()> {
    if args.len() > max {
        Err(YnaError::with_message(ErrorKind::InvalidArguments, "too many args"))
    } else {
        Ok(())
    }
}
