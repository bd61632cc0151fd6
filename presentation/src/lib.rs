//! Presentation layer for playpen-agents
//!
//! This crate contains CLI definitions, output formatters
//! and the interactive chat interface.

pub mod chat;
pub mod cli;
pub mod output;

// Re-export commonly used types
pub use chat::ChatRepl;
pub use cli::commands::{Cli, Command, OutputFormat};
pub use output::console::{ConsoleFormatter, JsonFormatter, disable_color};
pub use output::formatter::{OutputFormatter, formatter_for};
