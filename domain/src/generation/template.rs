//! Chat templates for common instruction-tuned model families.
//!
//! Backends that expose a native chat template use it directly; these
//! renderings exist for backends that only tokenize plain text.

use crate::conversation::entities::{Message, Role, roles_of};
use crate::conversation::normalize::is_alternating;
use crate::core::error::FormatError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Prompt format of a model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatTemplate {
    /// `<|im_start|>role ... <|im_end|>` (Qwen, Yi, OpenHermes, ...)
    ChatMl,
    /// Llama 3 header/eot format
    Llama3,
    /// `[INST] ... [/INST]` (Mistral, Mixtral); no system role
    Mistral,
    /// `<start_of_turn>` format; no system role
    Gemma,
}

impl ChatTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatTemplate::ChatMl => "chatml",
            ChatTemplate::Llama3 => "llama3",
            ChatTemplate::Mistral => "mistral",
            ChatTemplate::Gemma => "gemma",
        }
    }

    /// Guess the template from a model name such as
    /// `meta-llama/Meta-Llama-3-8B-Instruct`. Unknown families use ChatML.
    pub fn for_model_name(model_name: &str) -> Self {
        let name = model_name.to_ascii_lowercase();
        if name.contains("llama-3") || name.contains("llama3") {
            ChatTemplate::Llama3
        } else if name.contains("mistral") || name.contains("mixtral") {
            ChatTemplate::Mistral
        } else if name.contains("gemma") {
            ChatTemplate::Gemma
        } else {
            ChatTemplate::ChatMl
        }
    }

    /// Literal end-of-turn marker the model emits.
    pub fn end_of_turn(&self) -> &'static str {
        match self {
            ChatTemplate::ChatMl => "<|im_end|>",
            ChatTemplate::Llama3 => "<|eot_id|>",
            ChatTemplate::Mistral => "</s>",
            ChatTemplate::Gemma => "<end_of_turn>",
        }
    }

    fn supports_system(&self) -> bool {
        matches!(self, ChatTemplate::ChatMl | ChatTemplate::Llama3)
    }

    /// Render an already-normalized conversation to prompt text.
    ///
    /// Templates without a system role fold a leading system message into
    /// the first user turn, or render it as the only user turn when no turn
    /// follows it; they also require the first turn to be a user turn.
    /// Mistral has no assistant cue, so with `add_generation_prompt` its
    /// conversation must end on a user turn. Non-alternating input is a
    /// [`FormatError`].
    pub fn render(
        &self,
        messages: &[Message],
        add_generation_prompt: bool,
    ) -> Result<String, FormatError> {
        let (system, turns) = match messages.split_first() {
            Some((first, rest)) if first.role == Role::System => (Some(first), rest),
            _ => (None, messages),
        };

        if !is_alternating(turns) || turns.iter().any(|m| m.role == Role::System) {
            return Err(FormatError::new(
                format!("{} template needs alternating turns", self.as_str()),
                roles_of(messages),
            ));
        }
        if !self.supports_system()
            && let Some(first) = turns.first()
            && first.role != Role::User
        {
            return Err(FormatError::new(
                format!("{} template must start with a user turn", self.as_str()),
                roles_of(messages),
            ));
        }

        if *self == ChatTemplate::Mistral
            && add_generation_prompt
            && turns.last().is_some_and(|m| m.role == Role::Assistant)
        {
            return Err(FormatError::new(
                "mistral template cannot open a turn after an assistant turn",
                roles_of(messages),
            ));
        }

        let mut out = String::new();
        match self {
            ChatTemplate::ChatMl => {
                for m in messages {
                    out.push_str(&format!("<|im_start|>{}\n{}<|im_end|>\n", m.role, m.content));
                }
                if add_generation_prompt {
                    out.push_str("<|im_start|>assistant\n");
                }
            }
            ChatTemplate::Llama3 => {
                out.push_str("<|begin_of_text|>");
                for m in messages {
                    out.push_str(&format!(
                        "<|start_header_id|>{}<|end_header_id|>\n\n{}<|eot_id|>",
                        m.role,
                        m.content.trim()
                    ));
                }
                if add_generation_prompt {
                    out.push_str("<|start_header_id|>assistant<|end_header_id|>\n\n");
                }
            }
            ChatTemplate::Mistral => {
                out.push_str("<s>");
                for (role, content) in fold_system(system, turns) {
                    match role {
                        Role::User => out.push_str(&format!("[INST] {} [/INST]", content)),
                        _ => out.push_str(&format!("{}</s>", content)),
                    }
                }
                // The [/INST] suffix already cues the assistant turn.
            }
            ChatTemplate::Gemma => {
                out.push_str("<bos>");
                for (role, content) in fold_system(system, turns) {
                    let role = if role == Role::User { "user" } else { "model" };
                    out.push_str(&format!("<start_of_turn>{}\n{}<end_of_turn>\n", role, content));
                }
                if add_generation_prompt {
                    out.push_str("<start_of_turn>model\n");
                }
            }
        }
        Ok(out)
    }
}

/// Turns for a template without a system role. The system content is
/// prepended to the first user turn, or becomes a user turn of its own.
fn fold_system(system: Option<&Message>, turns: &[Message]) -> Vec<(Role, String)> {
    let mut folded: Vec<(Role, String)> =
        turns.iter().map(|m| (m.role, m.content.clone())).collect();
    let Some(sys) = system.filter(|s| !s.content.is_empty()) else {
        return folded;
    };
    match folded.first_mut() {
        Some((_, content)) => *content = format!("{}\n\n{}", sys.content, content),
        None => folded.push((Role::User, sys.content.clone())),
    }
    folded
}

impl FromStr for ChatTemplate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chatml" => Ok(ChatTemplate::ChatMl),
            "llama3" | "llama-3" => Ok(ChatTemplate::Llama3),
            "mistral" => Ok(ChatTemplate::Mistral),
            "gemma" => Ok(ChatTemplate::Gemma),
            other => Err(format!(
                "unknown chat template '{other}' (expected chatml, llama3, mistral or gemma)"
            )),
        }
    }
}

impl std::fmt::Display for ChatTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation() -> Vec<Message> {
        vec![
            Message::system("Be brief."),
            Message::user("Hi"),
            Message::assistant("Hello"),
            Message::user("Bye"),
        ]
    }

    #[test]
    fn test_detects_family_from_model_name() {
        assert_eq!(
            ChatTemplate::for_model_name("meta-llama/Meta-Llama-3-8B-Instruct"),
            ChatTemplate::Llama3
        );
        assert_eq!(
            ChatTemplate::for_model_name("mistralai/Mistral-7B-Instruct-v0.2"),
            ChatTemplate::Mistral
        );
        assert_eq!(ChatTemplate::for_model_name("google/gemma-2-9b-it"), ChatTemplate::Gemma);
        assert_eq!(ChatTemplate::for_model_name("Qwen/Qwen2-7B-Instruct"), ChatTemplate::ChatMl);
    }

    #[test]
    fn test_chatml_render() {
        let text = ChatTemplate::ChatMl
            .render(&[Message::user("Hi")], true)
            .unwrap();
        assert_eq!(text, "<|im_start|>user\nHi<|im_end|>\n<|im_start|>assistant\n");
    }

    #[test]
    fn test_llama3_render_ends_with_assistant_header() {
        let text = ChatTemplate::Llama3.render(&conversation(), true).unwrap();
        assert!(text.starts_with("<|begin_of_text|><|start_header_id|>system<|end_header_id|>\n\nBe brief.<|eot_id|>"));
        assert!(text.ends_with("<|start_header_id|>assistant<|end_header_id|>\n\n"));
    }

    #[test]
    fn test_mistral_folds_system_into_first_user_turn() {
        let text = ChatTemplate::Mistral.render(&conversation(), true).unwrap();
        assert_eq!(
            text,
            "<s>[INST] Be brief.\n\nHi [/INST]Hello</s>[INST] Bye [/INST]"
        );
    }

    #[test]
    fn test_gemma_uses_model_role() {
        let text = ChatTemplate::Gemma
            .render(&[Message::user("Hi"), Message::assistant("Yo")], false)
            .unwrap();
        assert_eq!(
            text,
            "<bos><start_of_turn>user\nHi<end_of_turn>\n<start_of_turn>model\nYo<end_of_turn>\n"
        );
    }

    #[test]
    fn test_rejects_unnormalized_input() {
        let err = ChatTemplate::ChatMl
            .render(&[Message::user("a"), Message::user("b")], true)
            .unwrap_err();
        assert_eq!(err.roles, vec![Role::User, Role::User]);
    }

    #[test]
    fn test_mistral_requires_user_first() {
        assert!(
            ChatTemplate::Mistral
                .render(&[Message::assistant("hi")], true)
                .is_err()
        );
    }

    #[test]
    fn test_system_only_becomes_user_turn() {
        let system = [Message::system("RULES: guess a word")];
        assert_eq!(
            ChatTemplate::Mistral.render(&system, true).unwrap(),
            "<s>[INST] RULES: guess a word [/INST]"
        );
        assert_eq!(
            ChatTemplate::Gemma.render(&system, true).unwrap(),
            "<bos><start_of_turn>user\nRULES: guess a word<end_of_turn>\n<start_of_turn>model\n"
        );
    }

    #[test]
    fn test_mistral_rejects_generation_after_assistant_turn() {
        let messages = [Message::user("Hi"), Message::assistant("Hello")];
        let err = ChatTemplate::Mistral.render(&messages, true).unwrap_err();
        assert_eq!(err.roles, vec![Role::User, Role::Assistant]);
        assert_eq!(
            ChatTemplate::Mistral.render(&messages, false).unwrap(),
            "<s>[INST] Hi [/INST]Hello</s>"
        );
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Llama3".parse::<ChatTemplate>().unwrap(), ChatTemplate::Llama3);
        assert!("alpaca".parse::<ChatTemplate>().is_err());
    }
}
