//! Agent specification: what one `--agent_kwargs` string asks for.

use playpen_domain::{ChatTemplate, ConfigParseError, KwargSpec, OutputCleanup};

/// Keys consumed by [`AgentSpec`]; anything else is a backend option.
pub const AGENT_KEYS: &[&str] = &[
    "model_name",
    "name",
    "backend",
    "context_size",
    "chat_template",
    "eos_to_cull",
    "output_split_prefix",
    "log_messages",
];

/// Parsed agent specification.
///
/// Only `model_name` is required. The agent name defaults to the last path
/// segment of the model name (`org/Model-7B` → `Model-7B`).
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSpec {
    pub model_name: String,
    pub name: String,
    /// Backend adapter to load the model with; `None` uses the default.
    pub backend: Option<String>,
    /// Overrides the context window reported by the model.
    pub context_size: Option<usize>,
    /// Overrides the chat template inferred from the model name.
    pub chat_template: Option<ChatTemplate>,
    pub cleanup: OutputCleanup,
    /// Write raw/normalized messages and responses to the transcript sink.
    pub log_messages: bool,
    /// Remaining keys, passed through to the backend.
    pub options: KwargSpec,
}

impl AgentSpec {
    pub fn new(model_name: impl Into<String>) -> Self {
        let model_name = model_name.into();
        Self {
            name: default_agent_name(&model_name),
            model_name,
            backend: None,
            context_size: None,
            chat_template: None,
            cleanup: OutputCleanup::default(),
            log_messages: false,
            options: KwargSpec::default(),
        }
    }

    /// Parse from a comma-separated `key=value` string.
    pub fn parse(spec: &str) -> Result<Self, ConfigParseError> {
        Self::from_kwargs(&KwargSpec::parse(spec)?)
    }

    pub fn from_kwargs(kwargs: &KwargSpec) -> Result<Self, ConfigParseError> {
        let model_name = kwargs.require("model_name")?;
        if model_name.is_empty() {
            return Err(ConfigParseError::invalid_value(
                "model_name",
                model_name,
                "must not be empty",
            ));
        }

        let mut spec = Self::new(model_name);
        if let Some(name) = kwargs.get("name").filter(|n| !n.is_empty()) {
            spec.name = name.to_string();
        }
        spec.backend = kwargs
            .get("backend")
            .filter(|b| !b.is_empty())
            .map(str::to_string);
        spec.context_size = kwargs.get_parsed::<usize>("context_size")?;
        if spec.context_size == Some(0) {
            return Err(ConfigParseError::invalid_value(
                "context_size",
                "0",
                "must be > 0",
            ));
        }
        if let Some(raw) = kwargs.get("chat_template") {
            let template = raw
                .parse::<ChatTemplate>()
                .map_err(|reason| ConfigParseError::invalid_value("chat_template", raw, reason))?;
            spec.chat_template = Some(template);
        }
        if let Some(eos) = kwargs.get("eos_to_cull").filter(|e| !e.is_empty()) {
            spec.cleanup = spec.cleanup.with_eos_to_cull(eos);
        }
        if let Some(prefix) = kwargs.get("output_split_prefix").filter(|p| !p.is_empty()) {
            spec.cleanup = spec.cleanup.with_output_split_prefix(prefix);
        }
        spec.log_messages = kwargs.get_bool("log_messages")?.unwrap_or(false);
        spec.options = kwargs.without(AGENT_KEYS);
        Ok(spec)
    }

    /// Template to render with: explicit setting, else inferred from the
    /// model name.
    pub fn resolved_chat_template(&self) -> ChatTemplate {
        self.chat_template
            .unwrap_or_else(|| ChatTemplate::for_model_name(&self.model_name))
    }
}

fn default_agent_name(model_name: &str) -> String {
    model_name
        .rsplit('/')
        .next()
        .unwrap_or(model_name)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_defaults_to_last_path_segment() {
        let spec = AgentSpec::parse("model_name=meta-llama/Meta-Llama-3-8B-Instruct").unwrap();
        assert_eq!(spec.name, "Meta-Llama-3-8B-Instruct");
        assert_eq!(spec.resolved_chat_template(), ChatTemplate::Llama3);
    }

    #[test]
    fn test_all_keys() {
        let spec = AgentSpec::parse(
            "model_name=m,name=player,backend=llama-server,context_size=2048,\
             chat_template=gemma,eos_to_cull=<eos>,output_split_prefix=>>,log_messages=true,\
             endpoint=http://localhost:8080",
        )
        .unwrap();
        assert_eq!(spec.name, "player");
        assert_eq!(spec.backend.as_deref(), Some("llama-server"));
        assert_eq!(spec.context_size, Some(2048));
        assert_eq!(spec.resolved_chat_template(), ChatTemplate::Gemma);
        assert_eq!(spec.cleanup.eos_to_cull.as_deref(), Some("<eos>"));
        assert_eq!(spec.cleanup.output_split_prefix.as_deref(), Some(">>"));
        assert!(spec.log_messages);
        assert_eq!(spec.options.get("endpoint"), Some("http://localhost:8080"));
        assert_eq!(spec.options.len(), 1);
    }

    #[test]
    fn test_model_name_required() {
        assert_eq!(
            AgentSpec::parse("temperature=0.0").unwrap_err(),
            ConfigParseError::MissingKey("model_name".to_string())
        );
    }

    #[test]
    fn test_bad_chat_template() {
        let err = AgentSpec::parse("model_name=m,chat_template=alpaca").unwrap_err();
        assert!(matches!(err, ConfigParseError::InvalidValue { ref key, .. } if key == "chat_template"));
    }

    #[test]
    fn test_zero_context_size_rejected() {
        assert!(AgentSpec::parse("model_name=m,context_size=0").is_err());
    }
}
