//! Role normalization for chat-style models.
//!
//! Chat templates require user and assistant turns to alternate, but the
//! game loop may hand an agent several consecutive messages from the same
//! role (e.g. a game-master prompt followed by an error notice). Instead of
//! dropping anything, consecutive same-role messages are merged.

use crate::conversation::entities::{Message, Role, roles_of};
use crate::core::error::FormatError;

/// Separator placed between merged message contents.
pub const MERGE_SEPARATOR: &str = "\n";

/// Merges consecutive same-role messages into strict alternation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleNormalizer {
    cull_empty_system: bool,
    separator: String,
}

impl Default for RoleNormalizer {
    fn default() -> Self {
        Self {
            cull_empty_system: true,
            separator: MERGE_SEPARATOR.to_string(),
        }
    }
}

impl RoleNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep a leading system message even when its content is blank.
    pub fn keep_empty_system(mut self) -> Self {
        self.cull_empty_system = false;
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Normalize `messages` into alternating form.
    ///
    /// A leading system message is kept as-is (unless blank and culling is
    /// on). A system message in any later position cannot be merged away
    /// and yields a [`FormatError`].
    pub fn normalize(&self, messages: &[Message]) -> Result<Vec<Message>, FormatError> {
        let mut source = messages;
        if self.cull_empty_system
            && let Some(first) = source.first()
            && first.role == Role::System
            && first.content.trim().is_empty()
        {
            source = &source[1..];
        }

        let mut merged: Vec<Message> = Vec::with_capacity(source.len());
        for message in source {
            match merged.last_mut() {
                Some(last) if last.role == message.role => {
                    last.content.push_str(&self.separator);
                    last.content.push_str(&message.content);
                }
                _ => merged.push(message.clone()),
            }
        }

        if let Some(pos) = merged.iter().skip(1).position(|m| m.role == Role::System) {
            return Err(FormatError::new(
                format!("system message at position {}", pos + 1),
                roles_of(&merged),
            ));
        }

        Ok(merged)
    }
}

/// Normalize with default settings (blank leading system culled, `\n` separator).
pub fn ensure_alternating_roles(messages: &[Message]) -> Result<Vec<Message>, FormatError> {
    RoleNormalizer::default().normalize(messages)
}

/// True when no two consecutive messages share a role.
pub fn is_alternating(messages: &[Message]) -> bool {
    messages.windows(2).all(|w| w[0].role != w[1].role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merges_consecutive_user_messages() {
        let input = vec![
            Message::user("a"),
            Message::user("b"),
            Message::assistant("c"),
        ];
        let output = ensure_alternating_roles(&input).unwrap();
        assert_eq!(output, vec![Message::user("a\nb"), Message::assistant("c")]);
    }

    #[test]
    fn test_already_alternating_is_unchanged() {
        let input = vec![
            Message::system("You are a player."),
            Message::user("Guess a word."),
            Message::assistant("GUESS: apple"),
            Message::user("Wrong."),
        ];
        assert_eq!(ensure_alternating_roles(&input).unwrap(), input);
    }

    #[test]
    fn test_leading_system_exempt_from_alternation() {
        let input = vec![
            Message::system("rules"),
            Message::user("x"),
            Message::user("y"),
        ];
        let output = ensure_alternating_roles(&input).unwrap();
        assert_eq!(output, vec![Message::system("rules"), Message::user("x\ny")]);
        assert!(is_alternating(&output));
    }

    #[test]
    fn test_merges_long_runs_without_loss() {
        let input = vec![
            Message::assistant("1"),
            Message::assistant("2"),
            Message::assistant("3"),
            Message::user("4"),
            Message::user("5"),
        ];
        let output = ensure_alternating_roles(&input).unwrap();
        assert_eq!(
            output,
            vec![Message::assistant("1\n2\n3"), Message::user("4\n5")]
        );
    }

    #[test]
    fn test_blank_leading_system_is_culled() {
        let input = vec![Message::system("  "), Message::user("hi")];
        assert_eq!(
            ensure_alternating_roles(&input).unwrap(),
            vec![Message::user("hi")]
        );
    }

    #[test]
    fn test_blank_leading_system_kept_when_configured() {
        let input = vec![Message::system(""), Message::user("hi")];
        let output = RoleNormalizer::new()
            .keep_empty_system()
            .normalize(&input)
            .unwrap();
        assert_eq!(output.len(), 2);
    }

    #[test]
    fn test_late_system_message_is_format_error() {
        let input = vec![
            Message::user("a"),
            Message::system("late"),
            Message::assistant("b"),
        ];
        let err = ensure_alternating_roles(&input).unwrap_err();
        assert_eq!(err.roles, vec![Role::User, Role::System, Role::Assistant]);
        assert!(err.reason.contains("position 1"));
    }

    #[test]
    fn test_custom_separator() {
        let input = vec![Message::user("a"), Message::user("b")];
        let output = RoleNormalizer::new()
            .with_separator("\n\n")
            .normalize(&input)
            .unwrap();
        assert_eq!(output, vec![Message::user("a\n\nb")]);
    }

    #[test]
    fn test_empty_conversation() {
        assert!(ensure_alternating_roles(&[]).unwrap().is_empty());
    }
}
