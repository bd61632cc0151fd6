//! llama.cpp server adapter
//!
//! Implements the tokenizer and causal-LM ports on top of a running
//! `llama-server` (or any server exposing the same `/tokenize`,
//! `/detokenize`, `/completion` and `/props` endpoints). The chat template is
//! rendered locally with [`ChatTemplate`] and the resulting text is
//! tokenized by the server with special-token parsing enabled, so token ids
//! match what the model was trained on.
//!
//! Agent options understood here:
//! - `endpoint=<url>`: server base URL (defaults to the configured endpoint)
//! - `timeout_secs=<n>`: per-request timeout

mod client;
mod types;

pub use client::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT, LlamaServerClient};

use playpen_application::{
    AgentSpec, BackendError, CausalLm, ChatTokenizer, LoadedModel, ModelBackend,
};
use playpen_domain::{ChatTemplate, DecodingParams, Message, TokenId};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Backend options consumed by this adapter.
pub const LLAMA_SERVER_OPTIONS: &[&str] = &["endpoint", "timeout_secs"];

pub struct LlamaServerTokenizer {
    client: LlamaServerClient,
    template: ChatTemplate,
    eos_token_id: Option<TokenId>,
}

impl LlamaServerTokenizer {
    pub fn new(client: LlamaServerClient, template: ChatTemplate) -> Self {
        Self {
            client,
            template,
            eos_token_id: None,
        }
    }

    pub fn with_eos_token_id(mut self, eos: Option<TokenId>) -> Self {
        self.eos_token_id = eos;
        self
    }

    pub fn template(&self) -> ChatTemplate {
        self.template
    }
}

impl ChatTokenizer for LlamaServerTokenizer {
    fn apply_chat_template(
        &self,
        messages: &[Message],
        add_generation_prompt: bool,
    ) -> Result<Vec<TokenId>, BackendError> {
        let text = self.template.render(messages, add_generation_prompt)?;
        self.client.tokenize(&text)
    }

    fn decode(&self, tokens: &[TokenId]) -> Result<String, BackendError> {
        self.client.detokenize(tokens)
    }

    fn eos_token_id(&self) -> Option<TokenId> {
        self.eos_token_id
    }
}

pub struct LlamaServerModel {
    client: LlamaServerClient,
    context_size: usize,
    eos_token_id: Option<TokenId>,
}

impl LlamaServerModel {
    pub fn new(client: LlamaServerClient, context_size: usize) -> Self {
        Self {
            client,
            context_size,
            eos_token_id: None,
        }
    }

    pub fn with_eos_token_id(mut self, eos: Option<TokenId>) -> Self {
        self.eos_token_id = eos;
        self
    }
}

impl CausalLm for LlamaServerModel {
    fn generate(
        &self,
        prompt: &[TokenId],
        params: &DecodingParams,
    ) -> Result<Vec<TokenId>, BackendError> {
        let completion = self.client.complete(prompt, params)?;

        let mut generated = if completion.tokens.is_empty() && !completion.content.is_empty() {
            // older servers ignore `return_tokens`
            self.client.tokenize(&completion.content)?
        } else {
            completion.tokens.clone()
        };
        // the server strips the EOS token from the returned sequence
        if completion.stopped_on_eos()
            && let Some(eos) = self.eos_token_id
            && generated.last() != Some(&eos)
        {
            generated.push(eos);
        }

        let mut out = Vec::with_capacity(prompt.len() + generated.len());
        out.extend_from_slice(prompt);
        out.extend(generated);
        Ok(out)
    }

    fn context_size(&self) -> usize {
        self.context_size
    }
}

/// Loads agents against a llama.cpp server.
#[derive(Debug, Clone)]
pub struct LlamaServerBackend {
    default_endpoint: String,
    default_timeout: Duration,
}

impl Default for LlamaServerBackend {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT, DEFAULT_TIMEOUT)
    }
}

impl LlamaServerBackend {
    pub fn new(default_endpoint: impl Into<String>, default_timeout: Duration) -> Self {
        Self {
            default_endpoint: default_endpoint.into(),
            default_timeout,
        }
    }

    fn client_for(&self, spec: &AgentSpec) -> Result<LlamaServerClient, BackendError> {
        let endpoint = spec
            .options
            .get("endpoint")
            .filter(|e| !e.is_empty())
            .unwrap_or(self.default_endpoint.as_str());
        let timeout = spec
            .options
            .get_parsed::<u64>("timeout_secs")
            .map_err(|e| BackendError::InvalidOption {
                key: "timeout_secs".to_string(),
                reason: e.to_string(),
            })?
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout);
        if timeout.is_zero() {
            return Err(BackendError::InvalidOption {
                key: "timeout_secs".to_string(),
                reason: "must be > 0".to_string(),
            });
        }
        LlamaServerClient::new(endpoint, timeout)
    }
}

impl ModelBackend for LlamaServerBackend {
    fn load(&self, spec: &AgentSpec) -> Result<LoadedModel, BackendError> {
        for key in spec.options.unknown_keys(LLAMA_SERVER_OPTIONS) {
            warn!(model = %spec.model_name, "Ignoring unknown backend option '{}'", key);
        }

        let client = self.client_for(spec)?;
        let props = client.props().map_err(|e| BackendError::Load {
            model_name: spec.model_name.clone(),
            reason: e.to_string(),
        })?;

        let context_size = props
            .context_size()
            .or(spec.context_size)
            .ok_or_else(|| BackendError::Load {
                model_name: spec.model_name.clone(),
                reason: "server did not report n_ctx; set context_size=".to_string(),
            })?;

        let eos_token_id = match props.eos_token.as_deref() {
            Some(text) if !text.is_empty() => match client.tokenize(text)?.as_slice() {
                [id] => Some(*id),
                other => {
                    debug!(eos = text, tokens = other.len(), "EOS token is not a single id");
                    None
                }
            },
            _ => None,
        };

        let template = spec.resolved_chat_template();
        info!(
            model = %spec.model_name,
            endpoint = client.endpoint(),
            context_size,
            template = %template,
            "Loaded llama-server model"
        );

        Ok(LoadedModel {
            model_name: spec.model_name.clone(),
            tokenizer: Arc::new(
                LlamaServerTokenizer::new(client.clone(), template).with_eos_token_id(eos_token_id),
            ),
            model: Arc::new(
                LlamaServerModel::new(client, context_size).with_eos_token_id(eos_token_id),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_option_overrides_default() {
        let backend = LlamaServerBackend::default();
        let spec = AgentSpec::parse("model_name=m,endpoint=http://gpu-box:9000/").unwrap();
        let client = backend.client_for(&spec).unwrap();
        assert_eq!(client.endpoint(), "http://gpu-box:9000");
    }

    #[test]
    fn test_default_endpoint_used() {
        let backend = LlamaServerBackend::new("http://localhost:1234", DEFAULT_TIMEOUT);
        let spec = AgentSpec::parse("model_name=m").unwrap();
        assert_eq!(
            backend.client_for(&spec).unwrap().endpoint(),
            "http://localhost:1234"
        );
    }

    #[test]
    fn test_invalid_timeout_option() {
        let backend = LlamaServerBackend::default();
        for raw in ["timeout_secs=soon", "timeout_secs=0"] {
            let spec = AgentSpec::parse(&format!("model_name=m,{raw}")).unwrap();
            assert!(matches!(
                backend.client_for(&spec),
                Err(BackendError::InvalidOption { .. })
            ));
        }
    }

    #[test]
    fn test_load_against_unreachable_server_fails() {
        let backend = LlamaServerBackend::new("http://127.0.0.1:9", Duration::from_secs(2));
        let spec = AgentSpec::parse("model_name=org/model").unwrap();
        let err = backend.load(&spec).unwrap_err();
        assert!(matches!(err, BackendError::Load { ref model_name, .. } if model_name == "org/model"));
    }
}
