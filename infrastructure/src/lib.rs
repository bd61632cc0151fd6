//! Infrastructure layer for playpen-agents
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the llama.cpp server backend, the backend
//! registry, the JSONL transcript writer and configuration file loading.

pub mod backends;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use backends::{BackendRegistry, LLAMA_SERVER, LlamaServerBackend, LlamaServerClient};
pub use config::{
    ConfigIssue, ConfigLoader, FileBackendConfig, FileConfig, FileGenerationConfig,
    FileLoggingConfig, FileOutputConfig, FileOutputFormat, FileReplConfig, Severity,
};
pub use logging::JsonlConversationLogger;
