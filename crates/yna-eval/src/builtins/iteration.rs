//! The `loop` construct.
//!
//! ```text
//! loop("end", body)
//! loop("start,end,step", body)
//! ```
//!
//! Output is a lazy sequence: one body evaluation per pull, nothing beyond
//! what the consumer takes. The loop owns one Sub scope for all iterations
//! and binds `iter` there. Sub scopes write through to the Root table, so
//! the parent's `iter` is snapshotted when the loop starts and put back
//! when the sequence ends, fails, or is dropped early.

use crate::coerce;
use crate::env::{ContextArena, ContextId};
use crate::invocation::Invocation;
use std::iter::FusedIterator;
use tracing::trace;
use yna_types::{ErrorKind, VarValue, YnaError, YnaResult};

/// Name of the loop counter variable.
pub const ITER_VARIABLE: &str = "iter";

/// A deferred loop body, evaluated once per iteration in the loop scope.
pub type Body<'b> = Box<dyn FnMut(&mut ContextArena, ContextId) -> YnaResult<String> + 'b>;

// ══════════════════════════════════════════════════════════════════════════════
// Range spec
// ══════════════════════════════════════════════════════════════════════════════

/// Half-open integer range `[start, end)` walked by `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub start: i64,
    pub end: i64,
    pub step: i64,
}

impl RangeSpec {
    /// Parse `end` or `start,end,step`; `start` and `step` default to 1.
    pub fn parse(spec: &str) -> YnaResult<Self> {
        const NON_INT: &str = "non int index";
        let tokens: Vec<&str> = spec.split(',').collect();
        let (start, end, step) = match tokens.as_slice() {
            [end] => (1, *end, 1),
            [start, end, step] => (
                coerce::int_or(start, 1, ErrorKind::InvalidArguments, NON_INT)?,
                *end,
                coerce::int_or(step, 1, ErrorKind::InvalidArguments, NON_INT)?,
            ),
            _ => return Err(YnaError::with_message(ErrorKind::InvalidArguments, "invalid args")),
        };
        let end = coerce::int(end, ErrorKind::InvalidArguments, NON_INT)?;
        if step == 0 {
            return Err(YnaError::with_message(ErrorKind::InvalidArguments, "zero step"));
        }
        Ok(Self { start, end, step })
    }

    pub fn indices(self) -> StepRange {
        StepRange {
            next: Some(self.start),
            end: self.end,
            step: self.step,
        }
    }
}

/// Iterator over the values of a [`RangeSpec`].
#[derive(Debug, Clone)]
pub struct StepRange {
    next: Option<i64>,
    end: i64,
    step: i64,
}

impl Iterator for StepRange {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        let current = self.next?;
        let in_range = if self.step > 0 {
            current < self.end
        } else {
            current > self.end
        };
        if !in_range {
            self.next = None;
            return None;
        }
        self.next = current.checked_add(self.step);
        Some(current)
    }
}

impl FusedIterator for StepRange {}

// ══════════════════════════════════════════════════════════════════════════════
// Loop output
// ══════════════════════════════════════════════════════════════════════════════

/// The output sequence of one `loop` call.
///
/// Finite and single-use. The first failing iteration is yielded as an
/// `Err` and ends the sequence.
pub struct LoopOutput<'a, 'b> {
    arena: &'a mut ContextArena,
    parent: ContextId,
    scope: ContextId,
    indices: StepRange,
    body: Body<'b>,
    /// Parent's `iter` before the loop; `None` once restored.
    saved_iter: Option<Option<VarValue>>,
}

impl LoopOutput<'_, '_> {
    /// The Sub scope the body runs in.
    pub fn scope(&self) -> ContextId {
        self.scope
    }

    fn restore(&mut self) {
        if let Some(saved) = self.saved_iter.take() {
            trace!(restored = saved.is_some(), "loop finished, restoring iter");
            self.arena.set_variable(self.parent, ITER_VARIABLE, saved);
        }
    }
}

impl Iterator for LoopOutput<'_, '_> {
    type Item = YnaResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.saved_iter.as_ref()?;
        let Some(i) = self.indices.next() else {
            self.restore();
            return None;
        };
        trace!(iter = i, "loop iteration");
        self.arena.set_text(self.scope, ITER_VARIABLE, i.to_string());
        let output = (self.body)(&mut *self.arena, self.scope);
        if output.is_err() {
            self.restore();
        }
        Some(output)
    }
}

impl FusedIterator for LoopOutput<'_, '_> {}

impl Drop for LoopOutput<'_, '_> {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Start a loop from the calling context of `inv`.
///
/// The range is validated before any scope is created or any body runs.
pub fn iterate<'a, 'b>(
    inv: Invocation<'a>,
    spec: &str,
    body: Body<'b>,
) -> YnaResult<LoopOutput<'a, 'b>> {
    let range = RangeSpec::parse(spec).map_err(|e| e.attributed("loop"))?;
    let (arena, parent) = inv.into_parts();
    let scope = arena.create_sub(parent);
    let saved = arena.get_variable(parent, ITER_VARIABLE).cloned();
    Ok(LoopOutput {
        arena,
        parent,
        scope,
        indices: range.indices(),
        body,
        saved_iter: Some(saved),
    })
}
