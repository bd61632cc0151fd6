//! Configuration file loading for playpen
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. `PLAYPEN_*` environment variables
//! 3. Project root: `./playpen.toml` or `./.playpen.toml`
//! 4. Global: `$XDG_CONFIG_HOME/playpen/config.toml` (or `~/.config/playpen/config.toml`)
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigIssue, FileAgentConfig, FileBackendConfig, FileConfig, FileGenerationConfig,
    FileLoggingConfig, FileOutputConfig, FileOutputFormat, FileReplConfig, Severity, expand_home,
};
pub use loader::ConfigLoader;
