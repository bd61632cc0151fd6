//! Continuation extraction from raw decoded model output.
//!
//! Causal LMs echo the prompt: the decoded output is `prompt + continuation`.
//! [`extract_continuation`] removes the echo, and [`OutputCleanup`] applies
//! optional model-specific trimming afterwards.

use serde::{Deserialize, Serialize};

/// Strip the echoed prompt from `full_text` unless `return_full_text` is set.
///
/// The first verbatim occurrence of `prompt_text` is removed and the rest is
/// trimmed. If detokenization changed the prompt so it no longer appears
/// verbatim, nothing is removed and the whole output is returned trimmed.
pub fn extract_continuation(full_text: &str, prompt_text: &str, return_full_text: bool) -> String {
    if return_full_text || prompt_text.is_empty() {
        return full_text.trim().to_string();
    }
    match full_text.strip_prefix(prompt_text) {
        Some(rest) => rest.trim().to_string(),
        None => full_text.replacen(prompt_text, "", 1).trim().to_string(),
    }
}

/// Optional post-processing of an extracted continuation.
///
/// - `output_split_prefix`: keep only the text after the last occurrence
///   (for templates whose assistant header survives decoding)
/// - `eos_to_cull`: literal end-of-sequence marker removed everywhere
///   (e.g. `<|eot_id|>`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputCleanup {
    pub output_split_prefix: Option<String>,
    pub eos_to_cull: Option<String>,
}

impl OutputCleanup {
    pub fn with_output_split_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.output_split_prefix = Some(prefix.into());
        self
    }

    pub fn with_eos_to_cull(mut self, eos: impl Into<String>) -> Self {
        self.eos_to_cull = Some(eos.into());
        self
    }

    pub fn is_noop(&self) -> bool {
        self.output_split_prefix.is_none() && self.eos_to_cull.is_none()
    }

    pub fn apply(&self, text: &str) -> String {
        let mut out = match self.output_split_prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => match text.rsplit_once(prefix) {
                Some((_, tail)) => tail.to_string(),
                None => text.to_string(),
            },
            _ => text.to_string(),
        };
        if let Some(eos) = self.eos_to_cull.as_deref()
            && !eos.is_empty()
        {
            out = out.replace(eos, "");
        }
        out.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_prompt_prefix() {
        assert_eq!(
            extract_continuation("PROMPT TEXT continuation", "PROMPT TEXT", false),
            "continuation"
        );
    }

    #[test]
    fn test_return_full_text_keeps_prompt() {
        assert_eq!(
            extract_continuation("  PROMPT TEXT continuation \n", "PROMPT TEXT", true),
            "PROMPT TEXT continuation"
        );
    }

    #[test]
    fn test_missing_prompt_is_noop() {
        assert_eq!(
            extract_continuation("<s> PROMPT  TEXT continuation", "<s>PROMPT TEXT", false),
            "<s> PROMPT  TEXT continuation"
        );
    }

    #[test]
    fn test_prompt_not_at_start_removed_once() {
        assert_eq!(
            extract_continuation("<pad>PROMPT answer", "PROMPT", false),
            "<pad> answer"
        );
    }

    #[test]
    fn test_empty_prompt() {
        assert_eq!(extract_continuation(" text ", "", false), "text");
    }

    #[test]
    fn test_cleanup_culls_eos_literal() {
        let cleanup = OutputCleanup::default().with_eos_to_cull("<|eot_id|>");
        assert_eq!(cleanup.apply("GUESS: apple<|eot_id|>"), "GUESS: apple");
    }

    #[test]
    fn test_cleanup_split_prefix_keeps_last_segment() {
        let cleanup = OutputCleanup::default().with_output_split_prefix("<|assistant|>");
        assert_eq!(
            cleanup.apply("<|assistant|>old<|assistant|> new answer"),
            "new answer"
        );
        assert_eq!(cleanup.apply("no marker"), "no marker");
    }

    #[test]
    fn test_default_cleanup_only_trims() {
        let cleanup = OutputCleanup::default();
        assert!(cleanup.is_noop());
        assert_eq!(cleanup.apply(" x "), "x");
    }
}
