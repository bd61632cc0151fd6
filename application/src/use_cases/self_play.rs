//! Self-play use case.
//!
//! A minimal two-seat dialogue loop for driving a roster without an external
//! benchmark: the seat to move acts on its memory, keeps its own reply as an
//! assistant message, and the other seat observes it as a user message.

use crate::use_cases::build_roster::Roster;
use crate::use_cases::generate_response::{ActOutput, AgentError};
use playpen_domain::Message;
use tracing::debug;

/// One completed turn.
#[derive(Debug, Clone, PartialEq)]
pub struct SelfPlayTurn {
    pub turn: usize,
    pub slot: usize,
    pub agent: String,
    pub output: ActOutput,
}

#[derive(Debug, Clone)]
pub struct SelfPlay {
    turns: usize,
    system: Option<String>,
}

impl SelfPlay {
    pub fn new(turns: usize) -> Self {
        Self {
            turns,
            system: None,
        }
    }

    /// System message every seat observes before the opening.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Play `turns` turns starting with slot 0, which observes `opening`.
    ///
    /// `on_turn` is called after every turn. The first failing turn aborts
    /// the run; turns played before it are lost to the caller except through
    /// `on_turn`.
    pub fn run<F>(
        &self,
        roster: &mut Roster,
        opening: impl Into<String>,
        mut on_turn: F,
    ) -> Result<Vec<SelfPlayTurn>, AgentError>
    where
        F: FnMut(&SelfPlayTurn),
    {
        let seats = roster.len();
        if seats == 0 {
            return Ok(Vec::new());
        }
        if let Some(system) = &self.system {
            for agent in roster.agents_mut() {
                agent.observe(Message::system(system.clone()))?;
            }
        }
        if let Some(first) = roster.get_mut(0) {
            first.observe(Message::user(opening))?;
        }

        let mut played = Vec::with_capacity(self.turns);
        for turn in 0..self.turns {
            let slot = turn % seats;
            let agents = roster.agents_mut();
            let output = agents[slot].act()?;
            debug!(turn, slot, "Self-play turn done");

            agents[slot].observe(Message::assistant(output.text.clone()))?;
            for (other, agent) in agents.iter_mut().enumerate() {
                if other != slot {
                    agent.observe(Message::user(output.text.clone()))?;
                }
            }

            let record = SelfPlayTurn {
                turn,
                slot,
                agent: agents[slot].name().to_string(),
                output,
            };
            on_turn(&record);
            played.push(record);
        }
        Ok(played)
    }
}
