//! Context chain for template evaluation.
//!
//! Contexts live in a [`ContextArena`] and are addressed by [`ContextId`].
//! A Root context owns the variable table and the guild adapter; Sub
//! contexts are views that hold a handle to their parent and delegate every
//! lookup and write through it, so all contexts under one Root see the
//! same bindings.

use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::trace;
use yna_types::{GuildAdapter, Member, VarValue};

/// Variable name that toggles the `rep` argument order instead of binding.
pub const REPLACE_MODE_VARIABLE: &str = "newrep";

/// Handle to a context in a [`ContextArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(usize);

/// Which variant a context is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    Root,
    Sub,
}

// ══════════════════════════════════════════════════════════════════════════════
// Variable table
// ══════════════════════════════════════════════════════════════════════════════

/// Name → value bindings.
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    bindings: BTreeMap<String, VarValue>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&VarValue> {
        self.bindings.get(name)
    }

    /// Bind `name`, or remove it when `value` is absent or empty.
    pub fn set(&mut self, name: &str, value: Option<VarValue>) {
        match value.filter(|v| !v.is_empty()) {
            Some(v) => {
                self.bindings.insert(name.to_string(), v);
            }
            None => {
                self.bindings.remove(name);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VarValue)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Frames
// ══════════════════════════════════════════════════════════════════════════════

struct RootFrame {
    table: VariableTable,
    guild: Rc<dyn GuildAdapter>,
    legacy_replace_mode: bool,
}

enum Frame {
    Root(RootFrame),
    Sub { base: ContextId, root: ContextId },
}

// ══════════════════════════════════════════════════════════════════════════════
// Arena
// ══════════════════════════════════════════════════════════════════════════════

/// Owner of every context created during evaluation.
///
/// Contexts are never freed individually; the arena is dropped with the
/// evaluation. Not `Sync`: one evaluation per Root at a time.
#[derive(Default)]
pub struct ContextArena {
    frames: Vec<Frame>,
}

impl ContextArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a Root context bound to `guild`, with an empty table.
    pub fn create_root(&mut self, guild: Rc<dyn GuildAdapter>) -> ContextId {
        let id = ContextId(self.frames.len());
        self.frames.push(Frame::Root(RootFrame {
            table: VariableTable::new(),
            guild,
            legacy_replace_mode: false,
        }));
        id
    }

    /// Create a Sub context viewing `parent`'s table.
    pub fn create_sub(&mut self, parent: ContextId) -> ContextId {
        let root = self.root(parent);
        let id = ContextId(self.frames.len());
        self.frames.push(Frame::Sub { base: parent, root });
        id
    }

    pub fn kind(&self, ctx: ContextId) -> ContextKind {
        match self.frames[ctx.0] {
            Frame::Root(_) => ContextKind::Root,
            Frame::Sub { .. } => ContextKind::Sub,
        }
    }

    /// Parent of `ctx`; a Root is its own base.
    pub fn base(&self, ctx: ContextId) -> ContextId {
        match self.frames[ctx.0] {
            Frame::Root(_) => ctx,
            Frame::Sub { base, .. } => base,
        }
    }

    /// Cached Root of `ctx`.
    pub fn root(&self, ctx: ContextId) -> ContextId {
        match self.frames[ctx.0] {
            Frame::Root(_) => ctx,
            Frame::Sub { root, .. } => root,
        }
    }

    /// Root of `ctx` found by walking `base` handles.
    pub fn resolve_root(&self, ctx: ContextId) -> ContextId {
        let mut current = ctx;
        while let Frame::Sub { base, .. } = self.frames[current.0] {
            current = base;
        }
        current
    }

    fn root_frame(&self, ctx: ContextId) -> &RootFrame {
        match &self.frames[self.root(ctx).0] {
            Frame::Root(frame) => frame,
            Frame::Sub { .. } => unreachable!("cached root is always a Root frame"),
        }
    }

    fn root_frame_mut(&mut self, ctx: ContextId) -> &mut RootFrame {
        let root = self.root(ctx);
        match &mut self.frames[root.0] {
            Frame::Root(frame) => frame,
            Frame::Sub { .. } => unreachable!("cached root is always a Root frame"),
        }
    }

    // ── Variables ────────────────────────────────────────────────────────

    /// Bind `name` in the table visible from `ctx`.
    ///
    /// An absent or empty value removes the binding. The replace-mode
    /// variable sets the Root flag and never reaches the table.
    pub fn set_variable(&mut self, ctx: ContextId, name: &str, value: Option<VarValue>) {
        let frame = self.root_frame_mut(ctx);
        if name == REPLACE_MODE_VARIABLE {
            frame.legacy_replace_mode = value.is_some_and(|v| !v.is_empty());
            trace!(enabled = frame.legacy_replace_mode, "replace mode toggled");
            return;
        }
        let removed = value.as_ref().map_or(true, VarValue::is_empty);
        trace!(variable = name, removed, "set variable");
        frame.table.set(name, value);
    }

    /// Convenience for text writes; empty text removes the binding.
    pub fn set_text(&mut self, ctx: ContextId, name: &str, value: impl Into<String>) {
        self.set_variable(ctx, name, Some(VarValue::Text(value.into())));
    }

    pub fn get_variable(&self, ctx: ContextId, name: &str) -> Option<&VarValue> {
        self.root_frame(ctx).table.get(name)
    }

    /// The table visible from `ctx`.
    pub fn variables(&self, ctx: ContextId) -> &VariableTable {
        &self.root_frame(ctx).table
    }

    /// Replace-mode flag, set through the `newrep` variable.
    ///
    /// Off by default, where `rep` reads `(haystack, replacement)`; when on
    /// it reads `(replacement, haystack)`.
    pub fn legacy_replace_mode(&self, ctx: ContextId) -> bool {
        self.root_frame(ctx).legacy_replace_mode
    }

    // ── Guild delegation ─────────────────────────────────────────────────

    pub fn get_members(&self, ctx: ContextId) -> Vec<Member> {
        self.root_frame(ctx).guild.list_members()
    }

    pub fn get_member(&self, ctx: ContextId, id: u64) -> Option<Member> {
        self.root_frame(ctx).guild.get_member(id)
    }

    pub fn get_member_named(&self, ctx: ContextId, name: &str) -> Option<Member> {
        self.root_frame(ctx).guild.get_member_named(name)
    }
}
