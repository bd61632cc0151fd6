//! Deterministic in-process backend and recording sinks for tests.

#![allow(dead_code)]

use playpen_application::{
    AgentSpec, BackendError, CausalLm, ChatTokenizer, ConversationEvent, ConversationLogger,
    LoadedModel, ModelBackend, OperatorLog,
};
use playpen_domain::{ChatTemplate, DecodingParams, DecodingStrategy, Message, TokenId};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const EOS: TokenId = 0;

/// One token per character; renders `[role]content\n` per message.
pub struct CharTokenizer;

impl ChatTokenizer for CharTokenizer {
    fn apply_chat_template(
        &self,
        messages: &[Message],
        add_generation_prompt: bool,
    ) -> Result<Vec<TokenId>, BackendError> {
        let mut text = String::new();
        for m in messages {
            text.push_str(&format!("[{}]{}\n", m.role, m.content));
        }
        if add_generation_prompt {
            text.push_str("[assistant]");
        }
        Ok(encode(&text))
    }

    fn decode(&self, tokens: &[TokenId]) -> Result<String, BackendError> {
        let mut out = String::new();
        for &t in tokens {
            if t == EOS {
                out.push_str("<eos>");
            } else {
                out.push(char::from_u32(t).ok_or_else(|| {
                    BackendError::Tokenizer(format!("invalid token {t}"))
                })?);
            }
        }
        Ok(out)
    }

    fn eos_token_id(&self) -> Option<TokenId> {
        Some(EOS)
    }
}

/// Renders through a domain [`ChatTemplate`], one token per character.
pub struct TemplateTokenizer(pub ChatTemplate);

impl ChatTokenizer for TemplateTokenizer {
    fn apply_chat_template(
        &self,
        messages: &[Message],
        add_generation_prompt: bool,
    ) -> Result<Vec<TokenId>, BackendError> {
        Ok(encode(&self.0.render(messages, add_generation_prompt)?))
    }

    fn decode(&self, tokens: &[TokenId]) -> Result<String, BackendError> {
        CharTokenizer.decode(tokens)
    }

    fn eos_token_id(&self) -> Option<TokenId> {
        Some(EOS)
    }
}

pub fn encode(text: &str) -> Vec<TokenId> {
    text.chars().map(|c| c as TokenId).collect()
}

/// Replies with a fixed text. Greedy decoding is a pure function of the
/// prompt; sampled decoding appends a draw number so repeated calls differ
/// unless a seed is fixed.
pub struct ScriptedModel {
    reply: String,
    context_size: usize,
    draws: AtomicU64,
    pub calls: Mutex<Vec<DecodingParams>>,
}

impl ScriptedModel {
    pub fn new(reply: impl Into<String>, context_size: usize) -> Self {
        Self {
            reply: reply.into(),
            context_size,
            draws: AtomicU64::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl CausalLm for ScriptedModel {
    fn generate(
        &self,
        prompt: &[TokenId],
        params: &DecodingParams,
    ) -> Result<Vec<TokenId>, BackendError> {
        self.calls.lock().unwrap().push(*params);
        let reply = match params.strategy {
            DecodingStrategy::Greedy => format!(" {} ({} prompt tokens)", self.reply, prompt.len()),
            DecodingStrategy::Sampled { .. } => {
                let draw = params
                    .seed
                    .unwrap_or_else(|| self.draws.fetch_add(1, Ordering::SeqCst));
                format!(" {} #{}", self.reply, draw)
            }
        };
        let mut out = prompt.to_vec();
        out.extend(encode(&reply));
        out.push(EOS);
        // trailing garbage after EOS, which the engine must clip
        out.extend(encode("IGNORED"));
        Ok(out)
    }

    fn context_size(&self) -> usize {
        self.context_size
    }
}

pub fn loaded(reply: &str, context_size: usize) -> (LoadedModel, Arc<ScriptedModel>) {
    let model = Arc::new(ScriptedModel::new(reply, context_size));
    let loaded = LoadedModel {
        model_name: "test/scripted".to_string(),
        tokenizer: Arc::new(CharTokenizer),
        model: model.clone(),
    };
    (loaded, model)
}

pub fn loaded_with_template(template: ChatTemplate, reply: &str) -> LoadedModel {
    LoadedModel {
        model_name: "test/templated".to_string(),
        tokenizer: Arc::new(TemplateTokenizer(template)),
        model: Arc::new(ScriptedModel::new(reply, 4096)),
    }
}

/// Backend that counts loads and fails for `model_name=missing`.
pub struct ScriptedBackend {
    pub loads: AtomicUsize,
    pub loaded_names: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            loads: AtomicUsize::new(0),
            loaded_names: Mutex::new(Vec::new()),
        }
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl ModelBackend for ScriptedBackend {
    fn load(&self, spec: &AgentSpec) -> Result<LoadedModel, BackendError> {
        if spec.model_name == "missing" {
            return Err(BackendError::Load {
                model_name: spec.model_name.clone(),
                reason: "not found".to_string(),
            });
        }
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.loaded_names
            .lock()
            .unwrap()
            .push(spec.model_name.clone());
        Ok(LoadedModel {
            model_name: spec.model_name.clone(),
            tokenizer: Arc::new(CharTokenizer),
            model: Arc::new(ScriptedModel::new("move", 4096)),
        })
    }
}

#[derive(Default)]
pub struct RecordingOperatorLog {
    pub warnings: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl OperatorLog for RecordingOperatorLog {
    fn warning(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

#[derive(Default)]
pub struct RecordingConversationLogger {
    pub events: Mutex<Vec<ConversationEvent>>,
}

impl RecordingConversationLogger {
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.event_type)
            .collect()
    }
}

impl ConversationLogger for RecordingConversationLogger {
    fn log(&self, event: ConversationEvent) {
        self.events.lock().unwrap().push(event);
    }
}
