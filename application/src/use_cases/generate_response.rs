//! Generation engine: one agent turn from conversation to cleaned text.
//!
//! A turn runs through fixed stages with no retries:
//!
//! ```text
//! Idle → Rendering → BudgetCheck ─┬─ Refused (ContextExceededError)
//!                                 └─ Decoding → Extracting → Done
//! ```
//!
//! A failure at any stage aborts the turn; a truncated or corrupted
//! generation is not resumable.

use crate::config::AgentSpec;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::model_backend::{BackendError, CausalLm, ChatTokenizer, LoadedModel};
use crate::ports::operator_log::{OperatorLog, TracingOperatorLog};
use playpen_domain::core::string::preview;
use playpen_domain::{
    ContextBudget, ContextCheck, ContextExceededError, FormatError, GenerationConfig, Message,
    OutputCleanup, RoleNormalizer, TokenId, extract_continuation,
};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};

/// Stage of a single `act()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStage {
    Idle,
    Rendering,
    BudgetCheck,
    Refused,
    Decoding,
    Extracting,
    Done,
}

impl fmt::Display for TurnStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TurnStage::Idle => "idle",
            TurnStage::Rendering => "rendering",
            TurnStage::BudgetCheck => "budget check",
            TurnStage::Refused => "refused",
            TurnStage::Decoding => "decoding",
            TurnStage::Extracting => "extracting",
            TurnStage::Done => "done",
        };
        f.write_str(s)
    }
}

/// Errors that abort an agent turn (or an agent operation).
#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    ContextExceeded(#[from] ContextExceededError),

    #[error("Agent '{name}' has been shut down; cannot {operation}")]
    Lifecycle {
        name: String,
        operation: &'static str,
    },

    #[error("Backend failure while {stage}: {source}")]
    Backend {
        stage: TurnStage,
        #[source]
        source: BackendError,
    },
}

impl AgentError {
    /// A chat-template rejection is a conversation-shape error, not a
    /// backend failure, so it surfaces as [`AgentError::Format`].
    fn backend(stage: TurnStage, source: BackendError) -> Self {
        match source {
            BackendError::Template(e) => AgentError::Format(e),
            source => AgentError::Backend { stage, source },
        }
    }

    pub fn is_format(&self) -> bool {
        matches!(self, AgentError::Format(_))
    }

    pub fn is_context_exceeded(&self) -> bool {
        matches!(self, AgentError::ContextExceeded(_))
    }
}

/// Prompt as sent to the model, for transcripts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptRecord {
    /// Rendered prompt text (decoded prompt tokens).
    pub inputs: String,
    pub max_new_tokens: usize,
    pub temperature: f32,
    pub return_full_text: bool,
}

/// Raw model payload, for transcripts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawResponse {
    /// Full decoded output including the echoed prompt.
    pub response: String,
}

/// Everything one turn produced: the exact prompt, the raw model payload
/// and the cleaned continuation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActOutput {
    pub prompt: PromptRecord,
    pub raw_response: RawResponse,
    pub text: String,
}

/// Prompt tokens plus their decoded text form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub tokens: Vec<TokenId>,
    pub text: String,
}

/// Owns a tokenizer/model pair and turns conversations into continuations.
///
/// Shared between agents through `Arc` when a roster slot is duplicated;
/// the engine itself holds no per-conversation state.
pub struct GenerationEngine {
    model_name: String,
    tokenizer: Arc<dyn ChatTokenizer>,
    model: Arc<dyn CausalLm>,
    budget: ContextBudget,
    normalizer: RoleNormalizer,
    cleanup: OutputCleanup,
    log_messages: bool,
    conversation_logger: Arc<dyn ConversationLogger>,
    operator_log: Arc<dyn OperatorLog>,
}

impl GenerationEngine {
    /// Create an engine whose budget is the model's reported context size.
    pub fn new(loaded: LoadedModel) -> Self {
        let budget = ContextBudget::new(loaded.model.context_size());
        Self {
            model_name: loaded.model_name,
            tokenizer: loaded.tokenizer,
            model: loaded.model,
            budget,
            normalizer: RoleNormalizer::default(),
            cleanup: OutputCleanup::default(),
            log_messages: false,
            conversation_logger: Arc::new(NoConversationLogger),
            operator_log: Arc::new(TracingOperatorLog),
        }
    }

    /// Create an engine configured from an agent specification.
    pub fn from_spec(loaded: LoadedModel, spec: &AgentSpec) -> Self {
        let mut engine = Self::new(loaded)
            .with_cleanup(spec.cleanup.clone())
            .with_log_messages(spec.log_messages);
        if let Some(size) = spec.context_size {
            engine = engine.with_context_size(size);
        }
        engine
    }

    pub fn with_context_size(mut self, context_size: usize) -> Self {
        self.budget = ContextBudget::new(context_size);
        self
    }

    pub fn with_normalizer(mut self, normalizer: RoleNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_cleanup(mut self, cleanup: OutputCleanup) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn with_log_messages(mut self, enabled: bool) -> Self {
        self.log_messages = enabled;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn with_operator_log(mut self, log: Arc<dyn OperatorLog>) -> Self {
        self.operator_log = log;
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn context_size(&self) -> usize {
        self.budget.context_size()
    }

    /// Apply the chat template and decode the prompt tokens back to text.
    ///
    /// The text form is needed later to strip the echoed prompt.
    pub fn render(&self, conversation: &[Message]) -> Result<RenderedPrompt, AgentError> {
        let tokens = self
            .tokenizer
            .apply_chat_template(conversation, true)
            .map_err(|e| AgentError::backend(TurnStage::Rendering, e))?;
        let text = self
            .tokenizer
            .decode(&tokens)
            .map_err(|e| AgentError::backend(TurnStage::Rendering, e))?;
        Ok(RenderedPrompt { tokens, text })
    }

    pub fn check_budget(&self, prompt_tokens: usize, config: &GenerationConfig) -> ContextCheck {
        self.budget.check(prompt_tokens, config.max_new_tokens())
    }

    /// Run the model and clip its output to the prompt, at most
    /// `max_new_tokens` new tokens, ending at the first end-of-sequence token.
    pub fn generate(
        &self,
        prompt_tokens: &[TokenId],
        config: &GenerationConfig,
    ) -> Result<Vec<TokenId>, AgentError> {
        let params = config.decoding_params();
        trace!(
            "{}: generating with {:?}, {} prompt tokens",
            self.model_name,
            params.strategy,
            prompt_tokens.len()
        );
        let output = self
            .model
            .generate(prompt_tokens, &params)
            .map_err(|e| AgentError::backend(TurnStage::Decoding, e))?;
        Ok(clip_generated(
            output,
            prompt_tokens.len(),
            config.max_new_tokens(),
            self.tokenizer.eos_token_id(),
        ))
    }

    pub fn decode(&self, tokens: &[TokenId]) -> Result<String, AgentError> {
        self.tokenizer
            .decode(tokens)
            .map_err(|e| AgentError::backend(TurnStage::Extracting, e))
    }

    /// Full pipeline for one turn.
    pub fn generate_response(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<ActOutput, AgentError> {
        let mut stage = TurnStage::Idle;
        self.log_transcript("raw_messages", || {
            serde_json::json!({ "model": self.model_name, "messages": messages })
        });

        self.advance(&mut stage, TurnStage::Rendering);
        let conversation = self.normalizer.normalize(messages)?;
        self.log_transcript("normalized_messages", || {
            serde_json::json!({ "model": self.model_name, "messages": conversation })
        });
        let prompt = self.render(&conversation)?;

        self.advance(&mut stage, TurnStage::BudgetCheck);
        let check = self.check_budget(prompt.tokens.len(), config);
        if let Err(exceeded) = check.ensure_fits() {
            self.advance(&mut stage, TurnStage::Refused);
            self.operator_log.error(&format!(
                "Context token limit for {} exceeded: {}/{}",
                self.model_name, exceeded.tokens_used, exceeded.context_size
            ));
            self.conversation_logger.log(ConversationEvent::new(
                "context_check",
                serde_json::json!({ "model": self.model_name, "check": check }),
            ));
            return Err(exceeded.into());
        }

        self.advance(&mut stage, TurnStage::Decoding);
        let output_tokens = self.generate(&prompt.tokens, config)?;

        self.advance(&mut stage, TurnStage::Extracting);
        let full_text = self.decode(&output_tokens)?;
        let continuation =
            extract_continuation(&full_text, &prompt.text, config.return_full_text());
        let text = if self.cleanup.is_noop() {
            continuation
        } else {
            self.cleanup.apply(&continuation)
        };

        self.advance(&mut stage, TurnStage::Done);
        debug!("{} response: {}", self.model_name, preview(&text, 120));
        self.log_transcript("llm_response", || {
            serde_json::json!({
                "model": self.model_name,
                "tokens_used": check.tokens_used,
                "tokens_left": check.tokens_left,
                "text": text,
            })
        });

        let strategy = config.strategy();
        Ok(ActOutput {
            prompt: PromptRecord {
                inputs: prompt.text,
                max_new_tokens: config.max_new_tokens(),
                temperature: strategy.temperature(),
                return_full_text: config.return_full_text(),
            },
            raw_response: RawResponse {
                response: full_text,
            },
            text,
        })
    }

    fn advance(&self, stage: &mut TurnStage, next: TurnStage) {
        trace!("{}: {} -> {}", self.model_name, stage, next);
        *stage = next;
    }

    fn log_transcript(&self, event_type: &'static str, payload: impl FnOnce() -> serde_json::Value) {
        if self.log_messages {
            self.conversation_logger
                .log(ConversationEvent::new(event_type, payload()));
        }
    }
}

impl fmt::Debug for GenerationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationEngine")
            .field("model_name", &self.model_name)
            .field("budget", &self.budget)
            .field("cleanup", &self.cleanup)
            .field("log_messages", &self.log_messages)
            .finish_non_exhaustive()
    }
}

/// Keep the prompt, then at most `max_new_tokens` tokens, stopping after
/// the first `eos` among the new tokens.
fn clip_generated(
    mut output: Vec<TokenId>,
    prompt_len: usize,
    max_new_tokens: usize,
    eos: Option<TokenId>,
) -> Vec<TokenId> {
    if output.len() <= prompt_len {
        return output;
    }
    let mut end = output.len().min(prompt_len.saturating_add(max_new_tokens));
    if let Some(eos) = eos
        && let Some(pos) = output[prompt_len..end].iter().position(|t| *t == eos)
    {
        end = prompt_len + pos + 1;
    }
    if end < output.len() {
        debug!(
            "clipping model output from {} to {} tokens",
            output.len(),
            end
        );
        output.truncate(end);
    }
    output
}
