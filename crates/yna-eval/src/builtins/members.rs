//! Guild member builtins.

use super::{arg, at_most, required};
use crate::invocation::Invocation;
use crate::registry::Kwargs;
use rand::seq::SliceRandom;
use yna_types::{ErrorKind, Member, VarValue, YnaError, YnaResult};

/// Whole member when `attrs` is blank, else the named attribute.
fn project(member: Member, attrs: Option<&str>) -> YnaResult<VarValue> {
    match attrs.map(str::trim).filter(|a| !a.is_empty()) {
        Some(path) => Ok(member.attr(path)?.into()),
        None => Ok(member.into()),
    }
}

/// `user(attrs?)`: a random member of the guild.
pub fn user(inv: &mut Invocation<'_>, args: &[String], kwargs: &Kwargs) -> YnaResult<VarValue> {
    at_most(args, 1)?;
    let members = inv.get_members();
    let picked = members
        .choose(&mut rand::thread_rng())
        .cloned()
        .ok_or_else(|| YnaError::with_message(ErrorKind::NotFound, "no members"))?;
    project(picked, arg(args, kwargs, 0, "attrs"))
}

/// `nameof(id, attrs?)`: a member's `name#discriminator`, or an attribute.
pub fn nameof(inv: &mut Invocation<'_>, args: &[String], kwargs: &Kwargs) -> YnaResult<VarValue> {
    at_most(args, 2)?;
    let raw = required(args, kwargs, 0, "id")?;
    let id = raw
        .trim()
        .parse::<u64>()
        .map_err(|e| YnaError::with_message(ErrorKind::InvalidArguments, "no id").caused_by(e))?;
    let member = inv
        .get_member(id)
        .ok_or_else(|| YnaError::new(ErrorKind::NotFound))?;
    match project(member, arg(args, kwargs, 1, "attrs"))? {
        VarValue::Member(m) => Ok(m.to_string().into()),
        text => Ok(text),
    }
}

/// `member(key, name)`: bind `key` to the member found by name.
pub fn member(inv: &mut Invocation<'_>, args: &[String], kwargs: &Kwargs) -> YnaResult<VarValue> {
    at_most(args, 2)?;
    let key = required(args, kwargs, 0, "key")?;
    let name = required(args, kwargs, 1, "name")?;
    let found = inv
        .get_member_named(name)
        .ok_or_else(|| YnaError::new(ErrorKind::NotFound))?;
    inv.set_variable(key, Some(found.into()));
    Ok(VarValue::Text(String::new()))
}
