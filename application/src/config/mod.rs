//! Application-level configuration.
//!
//! - [`AgentSpec`]: one agent's model, naming, backend and output cleanup

pub mod agent_spec;

pub use agent_spec::{AGENT_KEYS, AgentSpec};
