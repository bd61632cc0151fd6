//! Application layer for playpen-agents
//!
//! This crate contains the agent response pipeline, the roster builder and
//! the port definitions backends and log sinks implement.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{AGENT_KEYS, AgentSpec};
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    game::{FixedPlayers, GameBenchmark},
    model_backend::{BackendError, CausalLm, ChatTokenizer, LoadedModel, ModelBackend},
    operator_log::{OperatorLog, TracingOperatorLog},
};
pub use use_cases::agent::Agent;
pub use use_cases::build_roster::{Roster, RosterBuilder, RosterError};
pub use use_cases::generate_response::{
    ActOutput, AgentError, GenerationEngine, PromptRecord, RawResponse, RenderedPrompt, TurnStage,
};
pub use use_cases::self_play::{SelfPlay, SelfPlayTurn};
