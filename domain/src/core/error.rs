//! Domain error types

use crate::conversation::entities::Role;
use thiserror::Error;

/// A conversation could not be brought into alternating-role form.
///
/// Carries the role sequence observed after merging so callers can log
/// exactly what was wrong with the history.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Conversation does not alternate roles: {reason} (roles: {})", format_roles(.roles))]
pub struct FormatError {
    pub reason: String,
    pub roles: Vec<Role>,
}

impl FormatError {
    pub fn new(reason: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            reason: reason.into(),
            roles,
        }
    }
}

fn format_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Prompt plus requested new tokens do not fit the model context.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Context token limit exceeded: {tokens_used}/{context_size} tokens ({tokens_left} left)")]
pub struct ContextExceededError {
    pub tokens_used: usize,
    pub tokens_left: i64,
    pub context_size: usize,
}

/// A `key=value` specification could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigParseError {
    #[error("Malformed entry '{entry}': expected key=value")]
    MissingSeparator { entry: String },

    #[error("Malformed entry '{entry}': key is empty")]
    EmptyKey { entry: String },

    #[error("Invalid value for '{key}': '{value}' ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Missing required key '{0}'")]
    MissingKey(String),
}

impl ConfigParseError {
    pub fn invalid_value(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}
