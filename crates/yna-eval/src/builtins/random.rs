//! Random choice builtins.

use super::arg;
use crate::coerce;
use crate::invocation::Invocation;
use crate::registry::Kwargs;
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use yna_types::{ErrorKind, VarValue, YnaError, YnaResult};

/// `choose(options...)`: one option, uniformly.
pub fn choose(_inv: &mut Invocation<'_>, args: &[String], _kwargs: &Kwargs) -> YnaResult<VarValue> {
    args.choose(&mut thread_rng())
        .map(|s| VarValue::from(s.as_str()))
        .ok_or_else(|| YnaError::with_message(ErrorKind::InvalidArguments, "no options"))
}

/// `wchoose(option, weight, option, weight, ...)`: one option by weight.
pub fn wchoose(
    _inv: &mut Invocation<'_>,
    args: &[String],
    _kwargs: &Kwargs,
) -> YnaResult<VarValue> {
    if args.is_empty() {
        return Err(YnaError::with_message(ErrorKind::InvalidArguments, "no options"));
    }
    if args.len() % 2 != 0 {
        return Err(YnaError::with_message(ErrorKind::InvalidArguments, "mismatched weightings"));
    }
    let (options, weights): (Vec<&String>, Vec<&String>) = args
        .chunks_exact(2)
        .map(|pair| (&pair[0], &pair[1]))
        .unzip();
    let weights = weights
        .into_iter()
        .map(|w| coerce::float(w, ErrorKind::NonFloatArgument, "invalid weight"))
        .collect::<YnaResult<Vec<f64>>>()?;
    // The sampler panics on an infinite total.
    if !weights.iter().all(|w| w.is_finite()) || !weights.iter().sum::<f64>().is_finite() {
        return Err(YnaError::with_message(ErrorKind::InvalidArguments, "invalid weight"));
    }
    let dist = WeightedIndex::new(&weights).map_err(|e| {
        YnaError::with_message(ErrorKind::InvalidArguments, "invalid weight").caused_by(e)
    })?;
    Ok(options[dist.sample(&mut thread_rng())].as_str().into())
}

/// `num(min=0, max=100, step=1)`: a random member of `range(min, max, step)`.
pub fn num(_inv: &mut Invocation<'_>, args: &[String], kwargs: &Kwargs) -> YnaResult<VarValue> {
    let bound = |index: usize, key: &str, default: i64| match arg(args, kwargs, index, key) {
        Some(raw) => coerce::int(raw, ErrorKind::InvalidArguments, "invalid args"),
        None => Ok(default),
    };
    let min = bound(0, "min", 0)?;
    let max = bound(1, "max", 100)?;
    let step = bound(2, "step", 1)?;

    let count = range_len(min, max, step)
        .filter(|&n| n > 0)
        .ok_or_else(|| YnaError::new(ErrorKind::InvalidRange))?;
    let offset = thread_rng().gen_range(0..count);
    let value = i128::from(min) + i128::from(offset) * i128::from(step);
    Ok(value.to_string().into())
}

/// Element count of `range(start, end, step)`; `None` for a zero step.
pub(crate) fn range_len(start: i64, end: i64, step: i64) -> Option<i64> {
    if step == 0 {
        return None;
    }
    let span = i128::from(end) - i128::from(start);
    let step = i128::from(step);
    let count = if (span > 0) == (step > 0) && span != 0 {
        (span.abs() + step.abs() - 1) / step.abs()
    } else {
        0
    };
    i64::try_from(count).ok()
}
