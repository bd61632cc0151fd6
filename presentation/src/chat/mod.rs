//! Interactive chat module
//!
//! Provides a reedline-based chat interface against a single agent.

mod repl;

pub use repl::{ChatRepl, ReplInput};
