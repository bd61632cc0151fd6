//! Backend configuration from TOML (`[backend]` section)

use serde::{Deserialize, Serialize};

/// Raw backend configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    /// Base URL of the llama.cpp server, used when an agent has no `endpoint=`
    pub endpoint: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Adapter used when an agent has no `backend=`
    pub default_backend: String,
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8080".to_string(),
            timeout_secs: 300,
            default_backend: "llama-server".to_string(),
        }
    }
}
