//! Builtin registry: name → capabilities and implementation.

use crate::builtins;
use crate::invocation::{check_call_mode, dispatch, Capabilities, Invocation};
use std::collections::{BTreeMap, HashMap};
use yna_types::{ErrorKind, VarValue, YnaError, YnaResult};

/// Keyword arguments of a call, already evaluated to text.
pub type Kwargs = BTreeMap<String, String>;

/// Signature of a builtin whose arguments are all plain text.
pub type SimpleFn = fn(&mut Invocation<'_>, &[String], &Kwargs) -> YnaResult<VarValue>;

/// How the evaluator must call a builtin.
#[derive(Clone, Copy)]
pub enum BuiltinKind {
    /// Arguments evaluated up front, one value out.
    Simple(SimpleFn),
    /// `when`: operands plus two deferred branches.
    Conditional,
    /// `loop`: range spec plus a deferred body, lazy output sequence.
    Iteration,
}

/// A registered builtin.
#[derive(Clone, Copy)]
pub struct BuiltinSpec {
    pub name: &'static str,
    pub capabilities: Capabilities,
    pub kind: BuiltinKind,
}

impl std::fmt::Debug for BuiltinSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            BuiltinKind::Simple(_) => "simple",
            BuiltinKind::Conditional => "conditional",
            BuiltinKind::Iteration => "iteration",
        };
        f.debug_struct("BuiltinSpec")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .field("kind", &kind)
            .finish()
    }
}

/// Registry of every builtin a template may call.
#[derive(Debug, Default)]
pub struct BuiltinRegistry {
    builtins: HashMap<&'static str, BuiltinSpec>,
}

impl BuiltinRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the full standard library.
    pub fn standard() -> Self {
        let mut reg = Self::new();
        builtins::register_standard(&mut reg);
        reg
    }

    /// Register (or replace) a builtin.
    pub fn register(&mut self, name: &'static str, capabilities: Capabilities, kind: BuiltinKind) {
        self.builtins.insert(
            name,
            BuiltinSpec {
                name,
                capabilities,
                kind,
            },
        );
    }

    /// Shorthand for registering a [`BuiltinKind::Simple`] builtin.
    pub fn register_simple(
        &mut self,
        name: &'static str,
        capabilities: Capabilities,
        func: SimpleFn,
    ) {
        self.register(name, capabilities, BuiltinKind::Simple(func));
    }

    pub fn get(&self, name: &str) -> Option<&BuiltinSpec> {
        self.builtins.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.builtins.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Call a simple builtin through the central dispatch routine.
    pub fn call(
        &self,
        name: &str,
        inv: &mut Invocation<'_>,
        args: &[String],
        kwargs: &Kwargs,
    ) -> YnaResult<String> {
        let spec = self.get(name).ok_or_else(|| {
            YnaError::with_message(ErrorKind::UnknownFunction, format!("unknown function '{name}'"))
        })?;
        match spec.kind {
            BuiltinKind::Simple(func) => {
                dispatch(spec.name, spec.capabilities, inv, |inv| func(inv, args, kwargs))
            }
            BuiltinKind::Conditional | BuiltinKind::Iteration => {
                check_call_mode(spec.capabilities, inv).map_err(|e| e.attributed(spec.name))?;
                Err(YnaError::with_message(ErrorKind::InvalidArguments, "needs deferred bodies")
                    .attributed(spec.name))
            }
        }
    }
}
