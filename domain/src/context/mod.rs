//! Context window accounting.

pub mod context_budget;

pub use context_budget::{ContextBudget, ContextCheck, check_context_limit};
