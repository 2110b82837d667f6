//! Call-tree evaluator.
//!
//! Walks an already-parsed [`Node`] tree in a context, resolving builtins
//! through the [`BuiltinRegistry`]. A failing call renders as an inline
//! diagnostic in place of its output and evaluation continues with its
//! siblings. Only gas exhaustion aborts the whole render.

use crate::builtins::conditional::{self, Branch, Operand};
use crate::builtins::iteration::{self, Body};
use crate::config::EvalConfig;
use crate::env::{ContextArena, ContextId};
use crate::invocation::{check_call_mode, Capabilities, Invocation};
use crate::registry::{BuiltinKind, BuiltinRegistry, Kwargs};
use serde::Serialize;
use std::cell::{Cell, RefCell};
use tracing::debug;
use yna_types::{ErrorKind, ErrorReport, YnaError, YnaResult};

// ══════════════════════════════════════════════════════════════════════════════
// Call tree
// ══════════════════════════════════════════════════════════════════════════════

/// A node of a parsed template.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text.
    Text(String),
    /// Bare reference: a variable, else a global-variable-callable builtin.
    Var(String),
    /// Explicit builtin call.
    Call(Call),
    /// Children rendered one after another.
    Concat(Vec<Node>),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    pub fn concat(nodes: Vec<Node>) -> Self {
        Self::Concat(nodes)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Call> for Node {
    fn from(call: Call) -> Self {
        Self::Call(call)
    }
}

/// An explicit call such as `{name(arg, key=value)}`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Call {
    pub name: String,
    pub args: Vec<Node>,
    pub kwargs: Vec<(String, Node)>,
    pub result_variable: Option<String>,
}

impl Call {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, node: impl Into<Node>) -> Self {
        self.args.push(node.into());
        self
    }

    pub fn kwarg(mut self, key: impl Into<String>, node: impl Into<Node>) -> Self {
        self.kwargs.push((key.into(), node.into()));
        self
    }

    /// Redirect the call's result into `variable`.
    pub fn store_in(mut self, variable: impl Into<String>) -> Self {
        self.result_variable = Some(variable.into());
        self
    }
}

/// Output of one render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    pub text: String,
    /// Every failure rendered inline, in evaluation order.
    pub diagnostics: Vec<ErrorReport>,
    pub gas_used: u64,
}

// ══════════════════════════════════════════════════════════════════════════════
// Evaluator
// ══════════════════════════════════════════════════════════════════════════════

/// Renders call trees with a fixed registry and limits.
#[derive(Debug)]
pub struct Evaluator {
    registry: BuiltinRegistry,
    config: EvalConfig,
}

impl Evaluator {
    pub fn new(registry: BuiltinRegistry, config: EvalConfig) -> Self {
        Self { registry, config }
    }

    /// Standard builtins, default limits.
    pub fn standard() -> Self {
        Self::new(BuiltinRegistry::standard(), EvalConfig::default())
    }

    pub fn registry(&self) -> &BuiltinRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut BuiltinRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Render `node` in `ctx`.
    ///
    /// Fails only with `GasExhausted`; every other failure is part of the
    /// rendered text and listed in [`Rendered::diagnostics`].
    pub fn render(
        &self,
        arena: &mut ContextArena,
        ctx: ContextId,
        node: &Node,
    ) -> YnaResult<Rendered> {
        let session = Session {
            registry: &self.registry,
            config: &self.config,
            gas: Cell::new(0),
            diagnostics: RefCell::new(Vec::new()),
            loop_depth: Cell::new(0),
            looped: Cell::new(0),
        };
        let text = session.eval(arena, ctx, node)?;
        Ok(Rendered {
            text,
            diagnostics: session.diagnostics.into_inner(),
            gas_used: session.gas.get(),
        })
    }
}

/// State of one render; shared by reference with deferred branches and
/// loop bodies.
struct Session<'e> {
    registry: &'e BuiltinRegistry,
    config: &'e EvalConfig,
    gas: Cell<u64>,
    diagnostics: RefCell<Vec<ErrorReport>>,
    /// Loops currently being pulled.
    loop_depth: Cell<usize>,
    /// Bytes emitted by finished elements of outermost loops.
    looped: Cell<usize>,
}

impl Session<'_> {
    /// Consume one unit of gas.
    fn tick(&self) -> YnaResult<()> {
        let used = self.gas.get() + 1;
        self.gas.set(used);
        if used > self.config.gas_limit {
            Err(YnaError::new(ErrorKind::GasExhausted))
        } else {
            Ok(())
        }
    }

    /// Evaluate `node`, rendering failures inline.
    fn eval(&self, arena: &mut ContextArena, ctx: ContextId, node: &Node) -> YnaResult<String> {
        match self.try_eval(arena, ctx, node) {
            Err(e) if e.kind() != ErrorKind::GasExhausted => Ok(self.inline(e)),
            other => other,
        }
    }

    fn try_eval(&self, arena: &mut ContextArena, ctx: ContextId, node: &Node) -> YnaResult<String> {
        self.tick()?;
        match node {
            Node::Text(text) => Ok(text.clone()),
            Node::Var(name) => self.resolve_bare(arena, ctx, name),
            Node::Call(call) => self.call(arena, ctx, call),
            Node::Concat(nodes) => {
                let mut out = String::new();
                for node in nodes {
                    out.push_str(&self.eval(arena, ctx, node)?);
                }
                Ok(out)
            }
        }
    }

    fn inline(&self, e: YnaError) -> String {
        debug!(error = %e, kind = ?e.kind(), "rendering inline diagnostic");
        self.diagnostics.borrow_mut().push(e.report());
        e.to_string()
    }

    fn resolve_bare(
        &self,
        arena: &mut ContextArena,
        ctx: ContextId,
        name: &str,
    ) -> YnaResult<String> {
        if let Some(value) = arena.get_variable(ctx, name) {
            return Ok(value.to_string());
        }
        if !self.registry.contains(name) {
            return Err(YnaError::with_message(
                ErrorKind::UndefinedVariable,
                format!("undefined variable '{name}'"),
            ));
        }
        let mut inv = Invocation::new(arena, ctx).bare();
        self.registry.call(name, &mut inv, &[], &Kwargs::new())
    }

    fn invocation<'a>(
        &self,
        arena: &'a mut ContextArena,
        ctx: ContextId,
        call: &Call,
    ) -> Invocation<'a> {
        let inv = Invocation::new(arena, ctx);
        match &call.result_variable {
            Some(var) => inv.storing_into(var.clone()),
            None => inv,
        }
    }

    fn call(&self, arena: &mut ContextArena, ctx: ContextId, call: &Call) -> YnaResult<String> {
        let spec = *self.registry.get(&call.name).ok_or_else(|| {
            YnaError::with_message(
                ErrorKind::UnknownFunction,
                format!("unknown function '{}'", call.name),
            )
        })?;
        match spec.kind {
            BuiltinKind::Simple(_) => {
                let args = call
                    .args
                    .iter()
                    .map(|arg| self.eval(arena, ctx, arg))
                    .collect::<YnaResult<Vec<_>>>()?;
                let mut kwargs = Kwargs::new();
                for (key, value) in &call.kwargs {
                    kwargs.insert(key.clone(), self.eval(arena, ctx, value)?);
                }
                let mut inv = self.invocation(arena, ctx, call);
                self.registry.call(spec.name, &mut inv, &args, &kwargs)
            }
            BuiltinKind::Conditional => self.when(arena, ctx, spec.capabilities, call),
            BuiltinKind::Iteration => self.repeat(arena, ctx, spec.capabilities, call),
        }
    }

    fn deferred<'s>(&'s self, node: &'s Node) -> Branch<'s> {
        Box::new(move |arena: &mut ContextArena, ctx: ContextId| self.eval(arena, ctx, node))
    }

    // ── when ─────────────────────────────────────────────────────────────

    fn when(
        &self,
        arena: &mut ContextArena,
        ctx: ContextId,
        caps: Capabilities,
        call: &Call,
    ) -> YnaResult<String> {
        let invalid = |message: &str| {
            YnaError::with_message(ErrorKind::InvalidArguments, message).attributed("when")
        };
        if call.args.len() < 4 {
            return Err(invalid("missing branch"));
        }
        if call.args.len() > 5 {
            return Err(invalid("too many args"));
        }
        check_call_mode(caps, &self.invocation(arena, ctx, call))
            .map_err(|e| e.attributed("when"))?;

        // A failed left operand is kept as a value for `is error`.
        let arg1 = match self.try_eval(arena, ctx, &call.args[0]) {
            Err(e) if e.kind() == ErrorKind::GasExhausted => return Err(e),
            result => Operand::from(result),
        };
        let op = self.eval(arena, ctx, &call.args[1])?;
        let arg2 = self.eval(arena, ctx, &call.args[2])?;
        let on_true = self.deferred(&call.args[3]);
        let on_false = call.args.get(4).map(|node| self.deferred(node));

        let mut inv = Invocation::new(arena, ctx);
        conditional::when(&mut inv, &arg1, &op, &arg2, on_true, on_false)
    }

    // ── loop ─────────────────────────────────────────────────────────────

    fn repeat(
        &self,
        arena: &mut ContextArena,
        ctx: ContextId,
        caps: Capabilities,
        call: &Call,
    ) -> YnaResult<String> {
        let [range_node, body_node] = call.args.as_slice() else {
            return Err(
                YnaError::with_message(ErrorKind::InvalidArguments, "needs range and body")
                    .attributed("loop"),
            );
        };
        check_call_mode(caps, &self.invocation(arena, ctx, call))
            .map_err(|e| e.attributed("loop"))?;

        let range = self.eval(arena, ctx, range_node)?;
        let body: Body<'_> = Box::new(move |arena: &mut ContextArena, scope: ContextId| {
            self.eval(arena, scope, body_node)
        });
        let output = iteration::iterate(Invocation::new(arena, ctx), &range, body)?;

        let outermost = self.loop_depth.get() == 0;
        self.loop_depth.set(self.loop_depth.get() + 1);
        let result = self.drain(output, outermost);
        self.loop_depth.set(self.loop_depth.get() - 1);
        result
    }

    /// Pull loop elements until exhaustion or until the render's loop
    /// output reaches `max_output_len`.
    fn drain(
        &self,
        mut output: impl Iterator<Item = YnaResult<String>>,
        outermost: bool,
    ) -> YnaResult<String> {
        let mut out = String::new();
        while !self.output_limit_reached(&out) {
            let Some(item) = output.next() else {
                break;
            };
            let item = item?;
            if outermost {
                self.looped.set(self.looped.get() + item.len());
            }
            out.push_str(&item);
        }
        Ok(out)
    }

    fn output_limit_reached(&self, pending: &str) -> bool {
        let Some(max) = self.config.max_output_len else {
            return false;
        };
        // Outermost elements were already counted into `looped`.
        let len = if self.loop_depth.get() == 1 {
            self.looped.get()
        } else {
            self.looped.get() + pending.len()
        };
        if len >= max {
            debug!(len, max, "output limit reached, no more loop elements pulled");
            true
        } else {
            false
        }
    }
}
