//! Shared types for the YNA template core.
//!
//! Defines the single error type used by every builtin, the two-case
//! variable value, and the guild member model consumed through
//! [`GuildAdapter`].

mod error;
mod member;
mod value;

pub use error::{ErrorKind, ErrorReport, YnaError};
pub use member::{GuildAdapter, Member, StaticGuild};
pub use value::VarValue;

/// Result type used throughout the YNA core.
pub type YnaResult<T> = std::result::Result<T, YnaError>;
