//! The `time` builtin.

use super::{arg, at_most};
use crate::coerce;
use crate::invocation::Invocation;
use crate::registry::Kwargs;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Duration, Local, TimeZone};
use std::fmt::Display;
use yna_types::{ErrorKind, VarValue, YnaError, YnaResult};

/// Template used when none is given.
pub const DEFAULT_TEMPLATE: &str = "%H:%M";

/// `time(offset?, template?)`: local time shifted by `offset` hours.
pub fn time(_inv: &mut Invocation<'_>, args: &[String], kwargs: &Kwargs) -> YnaResult<VarValue> {
    at_most(args, 2)?;
    let offset = match arg(args, kwargs, 0, "offset") {
        Some(raw) if !raw.trim().is_empty() => {
            coerce::int(raw, ErrorKind::InvalidOffset, "invalid offset")?
        }
        _ => 0,
    };
    let template = arg(args, kwargs, 1, "template")
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TEMPLATE);
    Ok(format_shifted(Local::now(), offset, template)?.into())
}

/// Shift `now` by `offset` hours and render it with a strftime template.
pub fn format_shifted<Tz>(now: DateTime<Tz>, offset: i64, template: &str) -> YnaResult<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let shifted = Duration::try_hours(offset)
        .and_then(|d| now.checked_add_signed(d))
        .ok_or_else(|| YnaError::new(ErrorKind::InvalidOffset))?;
    let items: Vec<Item<'_>> = StrftimeItems::new(template).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(YnaError::new(ErrorKind::InvalidFormat));
    }
    Ok(shifted.format_with_items(items.iter()).to_string())
}
