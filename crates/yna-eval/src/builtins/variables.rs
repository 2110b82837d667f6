//! Variable-writing builtins.

use super::{arg, at_most, required};
use crate::invocation::Invocation;
use crate::registry::Kwargs;
use yna_types::{ErrorKind, VarValue, YnaError, YnaResult};

/// `set(name, value?)`: bind a text value; a missing or empty value unbinds.
pub fn set(inv: &mut Invocation<'_>, args: &[String], kwargs: &Kwargs) -> YnaResult<VarValue> {
    at_most(args, 2)?;
    let name = required(args, kwargs, 0, "name")?;
    if name.trim().is_empty() {
        return Err(YnaError::with_message(ErrorKind::InvalidArguments, "no name"));
    }
    let value = arg(args, kwargs, 1, "value").map(VarValue::from);
    inv.set_variable(name, value);
    Ok(VarValue::Text(String::new()))
}

/// `split(prefix, content, sep?)`: bind `prefix1..prefixN` to the pieces of
/// `content` and return `N`.
pub fn split(inv: &mut Invocation<'_>, args: &[String], kwargs: &Kwargs) -> YnaResult<VarValue> {
    at_most(args, 3)?;
    let prefix = required(args, kwargs, 0, "prefix")?;
    let content = required(args, kwargs, 1, "content")?;
    let sep = arg(args, kwargs, 2, "sep").unwrap_or(",");
    if sep.is_empty() {
        return Err(YnaError::with_message(ErrorKind::InvalidArguments, "empty separator"));
    }
    let pieces: Vec<&str> = content.split(sep).collect();
    for (i, piece) in pieces.iter().enumerate() {
        inv.set_text(&format!("{prefix}{}", i + 1), *piece);
    }
    Ok(pieces.len().to_string().into())
}
