//! Domain layer for playpen-agents
//!
//! This crate contains the pure pieces of the agent response pipeline.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! - **Conversation**: role-tagged [`Message`]s, normalized into strict
//!   user/assistant alternation by the [`RoleNormalizer`]
//! - **Context budget**: whether a prompt plus the requested new tokens fit
//!   the model window ([`check_context_limit`])
//! - **Generation**: per-agent [`GenerationConfig`], greedy vs sampled
//!   [`DecodingStrategy`], and prompt-echo removal ([`extract_continuation`])
//! - **Specifications**: comma-separated `key=value` strings ([`KwargSpec`])

pub mod config;
pub mod context;
pub mod conversation;
pub mod core;
pub mod generation;

// Re-export commonly used types
pub use config::KwargSpec;
pub use context::{ContextBudget, ContextCheck, check_context_limit};
pub use conversation::{
    entities::{Message, Role},
    normalize::{RoleNormalizer, ensure_alternating_roles, is_alternating},
};
pub use crate::core::error::{ConfigParseError, ContextExceededError, FormatError};
pub use generation::{
    ChatTemplate, DEFAULT_MAX_NEW_TOKENS, DEFAULT_TEMPERATURE, DecodingParams, DecodingStrategy,
    GENERATION_KEYS, GenerationConfig, OutputCleanup, TokenId, extract_continuation,
};
