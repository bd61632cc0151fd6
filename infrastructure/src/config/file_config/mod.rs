//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Spec strings are kept as strings here and parsed by the domain layer.

mod backend;
mod generation;
mod logging;
mod output;

pub use backend::FileBackendConfig;
pub use generation::{FileAgentConfig, FileGenerationConfig};
pub use logging::FileLoggingConfig;
pub use output::{FileOutputConfig, FileOutputFormat, FileReplConfig};

use playpen_application::AgentSpec;
use playpen_domain::{GENERATION_KEYS, GenerationConfig, KwargSpec};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub generation: FileGenerationConfig,
    pub agent: FileAgentConfig,
    pub backend: FileBackendConfig,
    pub logging: FileLoggingConfig,
    pub output: FileOutputConfig,
    pub repl: FileReplConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// One problem found by [`FileConfig::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    pub severity: Severity,
    /// Dotted field path, e.g. `backend.timeout_secs`
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    fn error(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            field: field.to_string(),
            message: message.into(),
        }
    }

    fn warning(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Spec strings are parsed with the same rules the roster builder uses,
    /// so a bad `[generation] spec` is reported before any model loads.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        match KwargSpec::parse(&self.generation.spec) {
            Ok(kwargs) => {
                if let Err(e) = GenerationConfig::from_kwargs(&kwargs) {
                    issues.push(ConfigIssue::error("generation.spec", e.to_string()));
                }
                for key in kwargs.unknown_keys(GENERATION_KEYS) {
                    issues.push(ConfigIssue::warning(
                        "generation.spec",
                        format!("unknown generation key '{key}' is ignored"),
                    ));
                }
            }
            Err(e) => issues.push(ConfigIssue::error("generation.spec", e.to_string())),
        }

        if let Some(spec) = &self.agent.spec
            && let Err(e) = AgentSpec::parse(spec)
        {
            issues.push(ConfigIssue::error("agent.spec", e.to_string()));
        }

        if self.backend.timeout_secs == 0 {
            issues.push(ConfigIssue::error("backend.timeout_secs", "cannot be 0"));
        }
        if self.backend.endpoint.trim().is_empty() {
            issues.push(ConfigIssue::error("backend.endpoint", "cannot be empty"));
        }

        issues
    }

    pub fn has_errors(issues: &[ConfigIssue]) -> bool {
        issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn transcript_dir(&self) -> Option<PathBuf> {
        self.logging.transcript_dir.as_deref().map(expand_home)
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.logging.file.as_deref().map(expand_home)
    }

    pub fn history_file(&self) -> Option<PathBuf> {
        self.repl.history_file.as_deref().map(expand_home)
    }
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
