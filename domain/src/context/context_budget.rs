//! Context budget for a single generation request.
//!
//! A causal LM attends to at most `context_size` tokens, and that window has
//! to hold both the prompt and every token generated after it. The budget
//! check is advisory: [`ContextCheck`] always comes back, and callers turn a
//! non-fitting check into a refusal with [`ContextCheck::ensure_fits`].

use crate::core::error::ContextExceededError;
use serde::{Deserialize, Serialize};

/// Outcome of a context budget check (pure value, never persisted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextCheck {
    pub fits: bool,
    pub tokens_used: usize,
    /// Negative when the request overshoots the window.
    pub tokens_left: i64,
    pub context_size: usize,
}

impl ContextCheck {
    /// Refuse the request when it does not fit.
    pub fn ensure_fits(self) -> Result<Self, ContextExceededError> {
        if self.fits {
            Ok(self)
        } else {
            Err(ContextExceededError {
                tokens_used: self.tokens_used,
                tokens_left: self.tokens_left,
                context_size: self.context_size,
            })
        }
    }
}

/// Compute whether `prompt_tokens + max_new_tokens` fits in `context_size`.
pub fn check_context_limit(
    context_size: usize,
    prompt_tokens: usize,
    max_new_tokens: usize,
) -> ContextCheck {
    let tokens_used = prompt_tokens.saturating_add(max_new_tokens);
    let tokens_left = context_size as i64 - tokens_used as i64;
    ContextCheck {
        fits: tokens_used <= context_size,
        tokens_used,
        tokens_left,
        context_size,
    }
}

/// Context window of a loaded model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextBudget {
    context_size: usize,
}

impl ContextBudget {
    pub fn new(context_size: usize) -> Self {
        Self { context_size }
    }

    pub fn context_size(&self) -> usize {
        self.context_size
    }

    pub fn check(&self, prompt_tokens: usize, max_new_tokens: usize) -> ContextCheck {
        check_context_limit(self.context_size, prompt_tokens, max_new_tokens)
    }
}
