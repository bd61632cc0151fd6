//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};

/// Raw logging configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory for JSONL conversation transcripts; no transcript when unset
    pub transcript_dir: Option<String>,
    /// Record raw and normalized messages for every agent
    pub log_messages: bool,
    /// Also write operator logs to this file
    pub file: Option<String>,
}
