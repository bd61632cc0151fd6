//! Turn-taking agent backed by a [`GenerationEngine`].
//!
//! The game loop feeds an agent observations with [`Agent::observe`] and asks
//! for a move with [`Agent::act`]. Memory is append-only and belongs to the
//! agent alone; the engine (and with it the loaded model) may be shared with
//! duplicated roster slots.

use super::generate_response::{ActOutput, AgentError, GenerationEngine};
use playpen_domain::{GenerationConfig, Message};
use std::sync::Arc;
use tracing::{debug, info};

/// A player agent.
#[derive(Debug)]
pub struct Agent {
    name: String,
    config: GenerationConfig,
    engine: Option<Arc<GenerationEngine>>,
    memory: Vec<Message>,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        config: GenerationConfig,
        engine: Arc<GenerationEngine>,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            engine: Some(engine),
            memory: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn generation_config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Messages observed so far, in call order.
    pub fn memory(&self) -> &[Message] {
        &self.memory
    }

    pub fn is_active(&self) -> bool {
        self.engine.is_some()
    }

    /// The engine this agent generates with; `None` after shutdown.
    pub fn engine(&self) -> Option<&GenerationEngine> {
        self.engine.as_deref()
    }

    /// Record an incoming message.
    pub fn observe(&mut self, message: Message) -> Result<(), AgentError> {
        self.ensure_active("observe")?;
        self.memory.push(message);
        Ok(())
    }

    /// Produce the next move from everything observed so far.
    ///
    /// Memory is read, not modified: a refused or failed turn leaves the
    /// agent exactly as it was.
    pub fn act(&self) -> Result<ActOutput, AgentError> {
        let engine = self.engine_for("act")?;
        debug!(
            "Agent {} acting on {} observed messages",
            self.name,
            self.memory.len()
        );
        engine.generate_response(&self.memory, &self.config)
    }

    /// Release the model. Any later call fails with
    /// [`AgentError::Lifecycle`].
    pub fn shutdown(&mut self) -> Result<(), AgentError> {
        self.ensure_active("shut down")?;
        self.engine = None;
        info!("Agent {} shut down", self.name);
        Ok(())
    }

    /// A new agent with the same name, configuration and engine, and an
    /// empty memory.
    pub fn replicate(&self) -> Result<Agent, AgentError> {
        let engine = self.engine_for("replicate")?;
        Ok(Agent::new(self.name.clone(), self.config, Arc::clone(engine)))
    }

    /// True when both agents drive the same loaded model.
    pub fn shares_engine_with(&self, other: &Agent) -> bool {
        match (&self.engine, &other.engine) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn engine_for(&self, operation: &'static str) -> Result<&Arc<GenerationEngine>, AgentError> {
        self.engine.as_ref().ok_or_else(|| AgentError::Lifecycle {
            name: self.name.clone(),
            operation,
        })
    }

    fn ensure_active(&self, operation: &'static str) -> Result<(), AgentError> {
        self.engine_for(operation).map(|_| ())
    }
}
