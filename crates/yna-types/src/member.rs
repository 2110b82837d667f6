//! Guild members and the adapter that looks them up.

use crate::error::{ErrorKind, YnaError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A member of the chat server a template is evaluated for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: u64,
    /// Username, without discriminator.
    pub name: String,
    /// Four-digit discriminator, kept as text to preserve leading zeros.
    pub discriminator: String,
    /// Server-specific nickname.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nick: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl Member {
    pub fn new(id: u64, name: impl Into<String>, discriminator: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            discriminator: discriminator.into(),
            nick: None,
            bot: false,
        }
    }

    pub fn with_nick(mut self, nick: impl Into<String>) -> Self {
        self.nick = Some(nick.into());
        self
    }

    /// Nickname if set, else username.
    pub fn display_name(&self) -> &str {
        self.nick.as_deref().unwrap_or(&self.name)
    }

    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }

    /// Resolve a dotted attribute path to text.
    ///
    /// Members are flat, so a path longer than one segment always fails.
    pub fn attr(&self, path: &str) -> Result<String, YnaError> {
        let mut segments = path.trim().split('.');
        let attr = segments.next().unwrap_or_default();
        if segments.next().is_some() {
            return Err(YnaError::with_message(
                ErrorKind::NoAttribute,
                format!("has no attrs: {path}"),
            ));
        }
        let value = match attr {
            "id" => self.id.to_string(),
            "name" => self.name.clone(),
            "discriminator" => self.discriminator.clone(),
            "nick" => self.nick.clone().unwrap_or_default(),
            "display_name" => self.display_name().to_string(),
            "mention" => self.mention(),
            "bot" => self.bot.to_string(),
            _ => {
                return Err(YnaError::with_message(
                    ErrorKind::NoAttribute,
                    format!("has no attrs: {path}"),
                ))
            }
        };
        Ok(value)
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.discriminator)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Guild adapter
// ══════════════════════════════════════════════════════════════════════════════

/// Member lookup for one chat server.
///
/// Implemented by the chat-platform adapter; the core only consumes it.
pub trait GuildAdapter {
    /// All members, in the guild's order.
    fn list_members(&self) -> Vec<Member>;

    fn get_member(&self, id: u64) -> Option<Member>;

    /// Find a member by `name#discriminator`, nickname, or username.
    ///
    /// A query with `#` as its fifth character from the end is first tried
    /// as an exact `name#discriminator`; otherwise, or if that misses, the
    /// first member whose nickname or username equals the query wins.
    fn get_member_named(&self, query: &str) -> Option<Member> {
        let members = self.list_members();
        if let Some((name, discriminator)) = split_tag(query) {
            let tagged = members
                .iter()
                .find(|m| m.name == name && m.discriminator == discriminator);
            if let Some(member) = tagged {
                return Some(member.clone());
            }
        }
        members
            .into_iter()
            .find(|m| m.nick.as_deref() == Some(query) || m.name == query)
    }
}

/// Split `name#1234` into its parts when `#` sits at the discriminator offset.
fn split_tag(query: &str) -> Option<(&str, &str)> {
    let chars: Vec<(usize, char)> = query.char_indices().collect();
    if chars.len() <= 5 {
        return None;
    }
    let (hash_at, hash) = chars[chars.len() - 5];
    if hash != '#' {
        return None;
    }
    Some((&query[..hash_at], &query[hash_at + 1..]))
}

/// An in-memory guild with a fixed member list.
///
/// Used for development and tests, and by hosts that snapshot members
/// before evaluation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticGuild {
    members: Vec<Member>,
}

impl StaticGuild {
    pub fn new(members: Vec<Member>) -> Self {
        Self { members }
    }

    /// Load a guild from JSON of the form `{"members": [...]}`.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl GuildAdapter for StaticGuild {
    fn list_members(&self) -> Vec<Member> {
        self.members.clone()
    }

    fn get_member(&self, id: u64) -> Option<Member> {
        self.members.iter().find(|m| m.id == id).cloned()
    }
}
