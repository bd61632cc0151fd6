//! Model backend port
//!
//! Defines the capabilities the generation engine consumes from an inference
//! backend: a tokenizer that can render chat conversations, a causal LM that
//! continues token sequences, and a loader that produces both for an agent
//! specification. Any conforming backend is substitutable.

use crate::config::AgentSpec;
use playpen_domain::{DecodingParams, FormatError, Message, TokenId};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur inside a model backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Unknown backend: {0}")]
    UnknownBackend(String),

    #[error("Failed to load model '{model_name}': {reason}")]
    Load { model_name: String, reason: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Chat template error: {0}")]
    Template(#[from] FormatError),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Invalid backend option '{key}': {reason}")]
    InvalidOption { key: String, reason: String },
}

/// Tokenizer capability.
pub trait ChatTokenizer: Send + Sync {
    /// Render `messages` with the model's chat template and tokenize.
    ///
    /// With `add_generation_prompt` the rendering ends with the cue that
    /// opens an assistant turn.
    fn apply_chat_template(
        &self,
        messages: &[Message],
        add_generation_prompt: bool,
    ) -> Result<Vec<TokenId>, BackendError>;

    /// Detokenize, keeping special tokens.
    fn decode(&self, tokens: &[TokenId]) -> Result<String, BackendError>;

    /// End-of-sequence token, if the backend knows it.
    fn eos_token_id(&self) -> Option<TokenId> {
        None
    }
}

/// Causal language model capability.
///
/// `generate` returns the prompt tokens followed by the generated tokens,
/// stopping after `max_new_tokens` new tokens or an end-of-sequence token.
/// Implementations take `&self`; one that is not reentrant must serialize
/// calls internally.
pub trait CausalLm: Send + Sync {
    fn generate(
        &self,
        prompt: &[TokenId],
        params: &DecodingParams,
    ) -> Result<Vec<TokenId>, BackendError>;

    /// Maximum number of tokens the model attends to.
    fn context_size(&self) -> usize;
}

/// A tokenizer/model pair loaded for one agent.
#[derive(Clone)]
pub struct LoadedModel {
    pub model_name: String,
    pub tokenizer: Arc<dyn ChatTokenizer>,
    pub model: Arc<dyn CausalLm>,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("model_name", &self.model_name)
            .field("context_size", &self.model.context_size())
            .finish_non_exhaustive()
    }
}

/// Loads models for agent specifications.
pub trait ModelBackend: Send + Sync {
    fn load(&self, spec: &AgentSpec) -> Result<LoadedModel, BackendError>;
}
