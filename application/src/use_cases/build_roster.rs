//! Build roster use case.
//!
//! Turns agent and generation specifications into exactly as many agents as
//! the game has player slots.
//!
//! Current limitation: a single generation configuration is shared by every
//! agent in the roster, and missing slots are filled by replicating the last
//! agent. Per-slot configuration is not supported.

use crate::config::AgentSpec;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::game::GameBenchmark;
use crate::ports::model_backend::{BackendError, ModelBackend};
use crate::ports::operator_log::{OperatorLog, TracingOperatorLog};
use crate::use_cases::agent::Agent;
use crate::use_cases::generate_response::{AgentError, GenerationEngine};
use playpen_domain::generation::config::GENERATION_KEYS;
use playpen_domain::{ConfigParseError, GenerationConfig, KwargSpec};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors that abort roster construction (and with it the run).
#[derive(Error, Debug)]
pub enum RosterError {
    #[error("Invalid specification: {0}")]
    ConfigParse(#[from] ConfigParseError),

    #[error("No agent specification given")]
    NoAgents,

    #[error(
        "Too many agents for this game ({requested} requested). The maximum number of player agents for this game is {max}"
    )]
    TooManyAgents { requested: usize, max: usize },

    #[error("Failed to load model '{model_name}': {source}")]
    Backend {
        model_name: String,
        #[source]
        source: BackendError,
    },

    #[error("Failed to fill roster: {0}")]
    Agent(#[from] AgentError),
}

/// Agents for one game run, in player-slot order.
#[derive(Debug)]
pub struct Roster {
    agents: Vec<Agent>,
}

impl Roster {
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    pub fn get(&self, slot: usize) -> Option<&Agent> {
        self.agents.get(slot)
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Agent> {
        self.agents.get_mut(slot)
    }

    pub fn into_agents(self) -> Vec<Agent> {
        self.agents
    }

    /// Shut down every agent that is still active.
    pub fn shutdown(&mut self) {
        for agent in self.agents.iter_mut().filter(|a| a.is_active()) {
            let _ = agent.shutdown();
        }
    }
}

/// Builds rosters, loading models through the injected backend.
pub struct RosterBuilder {
    backend: Arc<dyn ModelBackend>,
    conversation_logger: Arc<dyn ConversationLogger>,
    operator_log: Arc<dyn OperatorLog>,
}

impl RosterBuilder {
    pub fn new(backend: Arc<dyn ModelBackend>) -> Self {
        Self {
            backend,
            conversation_logger: Arc::new(NoConversationLogger),
            operator_log: Arc::new(TracingOperatorLog),
        }
    }

    /// Transcript sink, also handed to every engine the builder creates.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Operator sink, also handed to every engine the builder creates.
    pub fn with_operator_log(mut self, log: Arc<dyn OperatorLog>) -> Self {
        self.operator_log = log;
        self
    }

    /// Build the roster for `game`.
    ///
    /// 1. Parse every agent specification and the generation specification.
    /// 2. Reject more agents than the game has player slots (before loading).
    /// 3. Load one model per specification.
    /// 4. Replicate the last agent into any remaining slots.
    pub fn build<S: AsRef<str>>(
        &self,
        agent_specs: &[S],
        generation_spec: &str,
        game: &dyn GameBenchmark,
    ) -> Result<Roster, RosterError> {
        let specs = agent_specs
            .iter()
            .map(|s| AgentSpec::parse(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let gen_kwargs = KwargSpec::parse(generation_spec)?;
        let config = GenerationConfig::from_kwargs(&gen_kwargs)?;
        for key in gen_kwargs.unknown_keys(GENERATION_KEYS) {
            self.operator_log
                .warning(&format!("Ignoring unknown generation argument '{key}'"));
        }

        let num_players = game.required_players();
        if specs.is_empty() {
            return Err(RosterError::NoAgents);
        }
        if specs.len() > num_players {
            let error = RosterError::TooManyAgents {
                requested: specs.len(),
                max: num_players,
            };
            self.operator_log.error(&error.to_string());
            return Err(error);
        }

        let mut agents = Vec::with_capacity(num_players);
        for spec in &specs {
            agents.push(self.instantiate(spec, config)?);
        }

        let missing = num_players - agents.len();
        if missing > 0 {
            self.operator_log.warning(&format!(
                "The number of agents was insufficient for playing the game. \
                 Creating {missing} agent(s) with the last model specified in the arguments."
            ));
            let last_slot = agents.len() - 1;
            for _ in 0..missing {
                let duplicate = agents[last_slot].replicate()?;
                agents.push(duplicate);
            }
        }

        info!(
            "Roster built: {}",
            agents
                .iter()
                .map(|a| a.name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.conversation_logger.log(ConversationEvent::new(
            "roster_built",
            serde_json::json!({
                "players": num_players,
                "duplicated": missing,
                "agents": agents.iter().map(|a| a.name()).collect::<Vec<_>>(),
                "generation": config,
            }),
        ));

        Ok(Roster { agents })
    }

    fn instantiate(&self, spec: &AgentSpec, config: GenerationConfig) -> Result<Agent, RosterError> {
        let loaded = self
            .backend
            .load(spec)
            .map_err(|source| RosterError::Backend {
                model_name: spec.model_name.clone(),
                source,
            })?;
        let engine = GenerationEngine::from_spec(loaded, spec)
            .with_conversation_logger(Arc::clone(&self.conversation_logger))
            .with_operator_log(Arc::clone(&self.operator_log));
        Ok(Agent::new(spec.name.clone(), config, Arc::new(engine)))
    }
}
