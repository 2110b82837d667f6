//! Text builtins: case changes, length, slicing, URL encoding, replacement.

use super::{at_most, required};
use crate::coerce;
use crate::invocation::Invocation;
use crate::registry::Kwargs;
use tracing::debug;
use yna_types::{ErrorKind, VarValue, YnaError, YnaResult};

pub fn upper(_inv: &mut Invocation<'_>, args: &[String], kwargs: &Kwargs) -> YnaResult<VarValue> {
    let content = required(args, kwargs, 0, "content")?;
    Ok(content.to_uppercase().into())
}

pub fn lower(_inv: &mut Invocation<'_>, args: &[String], kwargs: &Kwargs) -> YnaResult<VarValue> {
    let content = required(args, kwargs, 0, "content")?;
    Ok(content.to_lowercase().into())
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
pub fn title(_inv: &mut Invocation<'_>, args: &[String], kwargs: &Kwargs) -> YnaResult<VarValue> {
    let content = required(args, kwargs, 0, "content")?;
    let mut out = String::with_capacity(content.len());
    let mut in_word = false;
    for c in content.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    Ok(out.into())
}

pub fn len(_inv: &mut Invocation<'_>, args: &[String], kwargs: &Kwargs) -> YnaResult<VarValue> {
    let content = required(args, kwargs, 0, "content")?;
    Ok(content.chars().count().to_string().into())
}

/// `slice(i, content)` picks one character; `slice(b,e,s, content)` takes a
/// top-exclusive substring. Indices are 0-based and may count from the end.
pub fn slice(_inv: &mut Invocation<'_>, args: &[String], kwargs: &Kwargs) -> YnaResult<VarValue> {
    let spec = required(args, kwargs, 0, "spec")?;
    let content = required(args, kwargs, 1, "content")?;
    let chars: Vec<char> = content.chars().collect();
    let parts: Vec<&str> = spec.split(',').collect();

    match parts.as_slice() {
        [index] => {
            let index = coerce::int(index, ErrorKind::InvalidArguments, "non int index")?;
            let at = normalize(index, chars.len())
                .filter(|&i| i < chars.len())
                .ok_or_else(|| YnaError::new(ErrorKind::BadIndex))?;
            Ok(chars[at].to_string().into())
        }
        [_, _] => Err(YnaError::with_message(ErrorKind::InvalidArguments, "bad content")),
        [begin, end, step] => {
            let step = coerce::int_or(step, 1, ErrorKind::InvalidArguments, "non int index")?;
            if step <= 0 {
                return Err(YnaError::with_message(ErrorKind::InvalidArguments, "zero step"));
            }
            let len = chars.len();
            let begin = clamp_bound(begin, 0, len)?;
            let end = clamp_bound(end, len, len)?;
            let step = usize::try_from(step).unwrap_or(usize::MAX);
            let out: String = (begin..end.max(begin))
                .step_by(step)
                .map(|i| chars[i])
                .collect();
            Ok(out.into())
        }
        _ => Err(YnaError::with_message(ErrorKind::InvalidArguments, "too many nums")),
    }
}

/// Map a possibly negative index onto `0..=len`; `None` if before the start.
fn normalize(index: i64, len: usize) -> Option<usize> {
    if index >= 0 {
        usize::try_from(index).ok()
    } else {
        let back = usize::try_from(index.unsigned_abs()).ok()?;
        len.checked_sub(back)
    }
}

/// Parse a slice bound; blank means `default`, out of range clamps.
fn clamp_bound(raw: &str, default: usize, len: usize) -> YnaResult<usize> {
    if raw.trim().is_empty() {
        return Ok(default);
    }
    let index = coerce::int(raw, ErrorKind::InvalidArguments, "non int index")?;
    Ok(normalize(index, len).unwrap_or(0).min(len))
}

/// URL-encode content.
pub fn parse(_inv: &mut Invocation<'_>, args: &[String], kwargs: &Kwargs) -> YnaResult<VarValue> {
    let content = super::arg(args, kwargs, 0, "content").unwrap_or_default();
    if content.is_empty() {
        return Err(YnaError::new(ErrorKind::NoContent));
    }
    Ok(urlencoding::encode(content).into_owned().into())
}

/// Find-and-replace.
///
/// `rep(needle, haystack, replacement)` by default; with the replace-mode
/// flag on, `rep(needle, replacement, haystack)`.
pub fn rep(inv: &mut Invocation<'_>, args: &[String], _kwargs: &Kwargs) -> YnaResult<VarValue> {
    let [needle, first, second] = args else {
        return Err(YnaError::with_message(ErrorKind::InvalidArguments, "rep takes 3 args"));
    };
    let (haystack, replacement) = if inv.legacy_replace_mode() {
        (second, first)
    } else {
        (first, second)
    };
    Ok(haystack.replace(needle.as_str(), replacement).into())
}

/// Swallow already-evaluated content.
pub fn void(_inv: &mut Invocation<'_>, args: &[String], _kwargs: &Kwargs) -> YnaResult<VarValue> {
    at_most(args, 1)?;
    if let Some(content) = args.first() {
        debug!(%content, "void discarded output");
    }
    Ok(VarValue::Text(String::new()))
}
