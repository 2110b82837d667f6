use crate::member::Member;
use std::fmt;

/// A value bound to a template variable.
///
/// Everything is stored as text except members fetched by the `member`
/// and `user` builtins, which stay rich until something renders them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarValue {
    Text(String),
    Member(Member),
}

impl VarValue {
    /// Empty text counts as "no value": writing it removes a binding.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Member(_) => None,
        }
    }

    pub fn as_member(&self) -> Option<&Member> {
        match self {
            Self::Member(m) => Some(m),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for VarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Member(m) => write!(f, "{m}"),
        }
    }
}

impl From<String> for VarValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for VarValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Member> for VarValue {
    fn from(m: Member) -> Self {
        Self::Member(m)
    }
}
