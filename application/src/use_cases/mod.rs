//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod agent;
pub mod build_roster;
pub mod generate_response;
pub mod self_play;
