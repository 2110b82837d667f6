use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Failure classification.
///
/// The `Display` text of each kind is the default message used when a
/// builtin raises the kind without a more specific message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    // ── Argument shape ──
    /// An operand could not be used by the requested comparison or test.
    #[error("invalid argument")]
    InvalidArgument,
    /// Wrong argument count or a malformed argument list.
    #[error("invalid args")]
    InvalidArguments,
    /// A float operand failed to coerce.
    #[error("non-float args")]
    NonFloatArgument,
    /// An integer operand failed to coerce.
    #[error("non-int args")]
    NonIntArgument,
    /// Empty content where content is required.
    #[error("no content")]
    NoContent,
    /// Index outside the content bounds.
    #[error("bad index")]
    BadIndex,
    /// Empty or inverted random range.
    #[error("invalid range")]
    InvalidRange,
    /// Unusable hour offset for `time`.
    #[error("invalid offset")]
    InvalidOffset,
    /// Unusable strftime template for `time`.
    #[error("invalid format")]
    InvalidFormat,

    // ── Conditional ──
    /// Unknown `when` operator.
    #[error("invalid op")]
    InvalidOperator,
    /// Unknown `is` type name.
    #[error("invalid type name")]
    InvalidTypeName,
    /// `/pattern/` failed to compile.
    #[error("invalid regex")]
    InvalidRegex,

    // ── Arithmetic ──
    /// Division or modulo by zero.
    #[error("divide by 0")]
    DivideByZero,
    /// Result reached positive infinity or exceeded the integer range.
    #[error("inf")]
    Overflow,
    /// Result reached negative infinity.
    #[error("-inf")]
    Underflow,
    /// Result is not a number.
    #[error("nan")]
    NotANumber,
    /// Operator tag unknown after alias resolution.
    #[error("unknown op")]
    UnknownOperator,

    // ── Invocation protocol ──
    /// Strict result-storable builtin called with explicit call syntax.
    #[error("type clash")]
    TypeClash,
    /// Result variable requested from a builtin that cannot store results.
    #[error("not result storable")]
    NotStorable,
    /// Bare reference to a builtin that is not global-variable-callable.
    #[error("not a variable")]
    NotCallableAsVariable,

    // ── Lookup ──
    /// No builtin with this name.
    #[error("unknown function")]
    UnknownFunction,
    /// Bare reference resolved to neither a variable nor a builtin.
    #[error("undefined variable")]
    UndefinedVariable,
    /// Member lookup miss.
    #[error("not found")]
    NotFound,
    /// Attribute path not available on a member.
    #[error("has no attrs")]
    NoAttribute,

    // ── Evaluation limits ──
    /// Evaluation exceeded its node budget.
    #[error("gas exhausted")]
    GasExhausted,
}

/// The single error type shared by every layer of the core.
///
/// Carries the builtin the failure originated in. Errors raised inside a
/// builtin are attributed by the dispatch routine when they cross the
/// builtin boundary, so builtin bodies rarely name themselves.
#[derive(Debug, Clone)]
pub struct YnaError {
    kind: ErrorKind,
    message: String,
    source_function: Option<String>,
    cause: Option<Arc<dyn StdError + Send + Sync>>,
}

impl YnaError {
    /// Create an error with the kind's default message.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: kind.to_string(),
            source_function: None,
            cause: None,
        }
    }

    /// Create an error with a specific message.
    pub fn with_message(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source_function: None,
            cause: None,
        }
    }

    /// Attach the foreign failure that caused this error.
    pub fn caused_by(mut self, cause: impl StdError + Send + Sync + 'static) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// Name the originating builtin explicitly, replacing any attribution.
    pub fn from_builtin(mut self, name: impl Into<String>) -> Self {
        self.source_function = Some(name.into());
        self
    }

    /// Attribute to `name` unless the error already names its origin.
    pub fn attributed(mut self, name: &str) -> Self {
        if self.source_function.is_none() {
            self.source_function = Some(name.to_string());
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_function(&self) -> Option<&str> {
        self.source_function.as_deref()
    }

    /// Structured form for hosts.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind,
            source_function: self.source_function.clone(),
            message: self.message.clone(),
            cause: self.cause.as_ref().map(|c| c.to_string()),
        }
    }
}

impl fmt::Display for YnaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source_function {
            Some(name) => write!(f, "<{name}:{}>", self.message),
            None => write!(f, "<{}>", self.message),
        }
    }
}

impl StdError for YnaError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_ref()
            .map(|c| c.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<ErrorKind> for YnaError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Serializable summary of a [`YnaError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_function: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}
