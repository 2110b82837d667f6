//! YNA template evaluation core.
//!
//! Contexts and variable storage live in [`env`]; every builtin runs
//! through the invocation protocol in [`invocation`] and is looked up in a
//! [`BuiltinRegistry`]. [`Evaluator`] walks an already-parsed call tree and
//! renders it to text, turning failures into inline diagnostics.

pub mod builtins;
pub mod coerce;
pub mod config;
pub mod env;
pub mod evaluator;
pub mod invocation;
pub mod registry;

pub use config::EvalConfig;
pub use env::{ContextArena, ContextId, ContextKind, VariableTable};
pub use evaluator::{Call, Evaluator, Node, Rendered};
pub use invocation::{Capabilities, Invocation, ResultStorage};
pub use registry::{BuiltinKind, BuiltinRegistry, BuiltinSpec, Kwargs};
