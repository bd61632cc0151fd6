//! Generation and agent defaults from TOML (`[generation]`, `[agent]`)

use playpen_domain::{DEFAULT_MAX_NEW_TOKENS, DEFAULT_TEMPERATURE};
use serde::{Deserialize, Serialize};

/// Raw generation configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGenerationConfig {
    /// Default `--gen_kwargs` string
    pub spec: String,
}

impl Default for FileGenerationConfig {
    fn default() -> Self {
        Self {
            spec: format!(
                "temperature={DEFAULT_TEMPERATURE:?},max_new_tokens={DEFAULT_MAX_NEW_TOKENS}"
            ),
        }
    }
}

/// Raw agent configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentConfig {
    /// Default `--agent_kwargs` string, used when none is given on the command line
    pub spec: Option<String>,
}
