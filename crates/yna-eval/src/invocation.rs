//! The invocation protocol shared by every builtin.
//!
//! A builtin declares [`Capabilities`] when it is registered. [`dispatch`]
//! is the one place those capabilities are enforced: call-mode checks run
//! before the body, result storage runs after it succeeds.

use crate::env::{ContextArena, ContextId};
use tracing::debug;
use yna_types::{ErrorKind, Member, VarValue, YnaError, YnaResult};

// ══════════════════════════════════════════════════════════════════════════════
// Capabilities
// ══════════════════════════════════════════════════════════════════════════════

/// How a result-storable builtin treats explicit call syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStorage {
    /// Callable either way.
    Lenient,
    /// Fails with a type clash unless invoked by bare reference.
    Strict,
}

/// Cross-cutting behavior attached to a builtin at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// May be invoked by a bare reference such as `{time}`.
    pub global_variable_callable: bool,
    /// Return value may be redirected into a variable.
    pub result_storage: Option<ResultStorage>,
}

impl Capabilities {
    pub const NONE: Self = Self {
        global_variable_callable: false,
        result_storage: None,
    };

    pub const fn callable_as_variable(self) -> Self {
        Self {
            global_variable_callable: true,
            ..self
        }
    }

    pub const fn result_storable(self) -> Self {
        Self {
            result_storage: Some(ResultStorage::Lenient),
            ..self
        }
    }

    pub const fn result_storable_strict(self) -> Self {
        Self {
            result_storage: Some(ResultStorage::Strict),
            ..self
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Invocation context
// ══════════════════════════════════════════════════════════════════════════════

/// One builtin call.
///
/// Not a scope: every variable and member operation goes to the calling
/// context.
pub struct Invocation<'a> {
    arena: &'a mut ContextArena,
    ctx: ContextId,
    called_as_bare_variable: bool,
    result_variable: Option<String>,
}

impl<'a> Invocation<'a> {
    /// An explicit call made from `ctx`.
    pub fn new(arena: &'a mut ContextArena, ctx: ContextId) -> Self {
        Self {
            arena,
            ctx,
            called_as_bare_variable: false,
            result_variable: None,
        }
    }

    /// Mark the call as a bare reference (`{name}` without call syntax).
    pub fn bare(mut self) -> Self {
        self.called_as_bare_variable = true;
        self
    }

    /// Redirect the result into `name`.
    pub fn storing_into(mut self, name: impl Into<String>) -> Self {
        self.result_variable = Some(name.into());
        self
    }

    pub fn context(&self) -> ContextId {
        self.ctx
    }

    pub fn root(&self) -> ContextId {
        self.arena.root(self.ctx)
    }

    pub fn called_as_bare_variable(&self) -> bool {
        self.called_as_bare_variable
    }

    pub fn result_variable(&self) -> Option<&str> {
        self.result_variable.as_deref()
    }

    pub fn arena(&self) -> &ContextArena {
        &*self.arena
    }

    pub fn arena_mut(&mut self) -> &mut ContextArena {
        &mut *self.arena
    }

    /// Give up the invocation, keeping the arena borrow and calling context.
    pub fn into_parts(self) -> (&'a mut ContextArena, ContextId) {
        (self.arena, self.ctx)
    }

    // ── Delegation to the calling context ────────────────────────────────

    pub fn set_variable(&mut self, name: &str, value: Option<VarValue>) {
        self.arena.set_variable(self.ctx, name, value);
    }

    pub fn set_text(&mut self, name: &str, value: impl Into<String>) {
        self.arena.set_text(self.ctx, name, value);
    }

    pub fn get_variable(&self, name: &str) -> Option<&VarValue> {
        self.arena.get_variable(self.ctx, name)
    }

    pub fn get_members(&self) -> Vec<Member> {
        self.arena.get_members(self.ctx)
    }

    pub fn get_member(&self, id: u64) -> Option<Member> {
        self.arena.get_member(self.ctx, id)
    }

    pub fn get_member_named(&self, name: &str) -> Option<Member> {
        self.arena.get_member_named(self.ctx, name)
    }

    pub fn legacy_replace_mode(&self) -> bool {
        self.arena.legacy_replace_mode(self.ctx)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Dispatch
// ══════════════════════════════════════════════════════════════════════════════

/// Reject call modes the builtin does not support.
pub fn check_call_mode(caps: Capabilities, inv: &Invocation<'_>) -> YnaResult<()> {
    if inv.called_as_bare_variable && !caps.global_variable_callable {
        return Err(YnaError::new(ErrorKind::NotCallableAsVariable));
    }
    if inv.result_variable.is_some() && caps.result_storage.is_none() {
        return Err(YnaError::new(ErrorKind::NotStorable));
    }
    if caps.result_storage == Some(ResultStorage::Strict) && !inv.called_as_bare_variable {
        return Err(YnaError::new(ErrorKind::TypeClash));
    }
    Ok(())
}

/// Store `value` in the result variable, or render it as output.
pub fn emit(caps: Capabilities, inv: &mut Invocation<'_>, value: VarValue) -> String {
    match (caps.result_storage, inv.result_variable.take()) {
        (Some(_), Some(var)) => {
            debug!(variable = %var, "storing builtin result");
            inv.set_variable(&var, Some(value));
            String::new()
        }
        _ => value.to_string(),
    }
}

/// Run a builtin body under its capabilities.
///
/// Errors from the checks or the body are attributed to `name`; storage
/// only happens after the body succeeds.
pub fn dispatch<'a>(
    name: &str,
    caps: Capabilities,
    inv: &mut Invocation<'a>,
    body: impl FnOnce(&mut Invocation<'a>) -> YnaResult<VarValue>,
) -> YnaResult<String> {
    check_call_mode(caps, inv).map_err(|e| e.attributed(name))?;
    debug!(
        builtin = name,
        bare = inv.called_as_bare_variable,
        storing = inv.result_variable.is_some(),
        "dispatching builtin"
    );
    let value = body(inv).map_err(|e| e.attributed(name))?;
    Ok(emit(caps, inv, value))
}
