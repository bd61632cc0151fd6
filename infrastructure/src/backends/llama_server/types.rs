//! Wire types for the llama.cpp server HTTP API.

use playpen_domain::{DecodingParams, TokenId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct TokenizeRequest<'a> {
    pub content: &'a str,
    /// BOS is part of the rendered chat template already.
    pub add_special: bool,
    /// Map template markers such as `<|im_start|>` to their special ids.
    pub parse_special: bool,
}

#[derive(Debug, Deserialize)]
pub struct TokenizeResponse {
    pub tokens: Vec<TokenId>,
}

#[derive(Debug, Serialize)]
pub struct DetokenizeRequest<'a> {
    pub tokens: &'a [TokenId],
}

#[derive(Debug, Deserialize)]
pub struct DetokenizeResponse {
    pub content: String,
}

/// `POST /completion` body.
///
/// The server decodes greedily when `temperature <= 0`.
#[derive(Debug, Serialize)]
pub struct CompletionRequest<'a> {
    pub prompt: &'a [TokenId],
    pub n_predict: usize,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub return_tokens: bool,
    pub cache_prompt: bool,
    pub stream: bool,
}

impl<'a> CompletionRequest<'a> {
    pub fn new(prompt: &'a [TokenId], params: &DecodingParams) -> Self {
        Self {
            prompt,
            n_predict: params.max_new_tokens,
            temperature: params.strategy.temperature(),
            seed: params.seed,
            return_tokens: true,
            cache_prompt: true,
            stream: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    /// Generated token ids; only sent by servers that honour `return_tokens`.
    #[serde(default)]
    pub tokens: Vec<TokenId>,
    #[serde(default)]
    pub stop_type: Option<String>,
}

impl CompletionResponse {
    pub fn stopped_on_eos(&self) -> bool {
        self.stop_type.as_deref() == Some("eos")
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerationSettings {
    pub n_ctx: Option<usize>,
}

/// `GET /props` response (only the fields used here).
#[derive(Debug, Default, Deserialize)]
pub struct PropsResponse {
    #[serde(default)]
    pub default_generation_settings: GenerationSettings,
    #[serde(default)]
    pub eos_token: Option<String>,
}

impl PropsResponse {
    pub fn context_size(&self) -> Option<usize> {
        self.default_generation_settings.n_ctx.filter(|n| *n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playpen_domain::{DecodingStrategy, GenerationConfig};

    #[test]
    fn test_greedy_completion_request() {
        let params = GenerationConfig::default().decoding_params();
        let prompt = [1, 2, 3];
        let json = serde_json::to_value(CompletionRequest::new(&prompt, &params)).unwrap();
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["n_predict"], 100);
        assert_eq!(json["prompt"], serde_json::json!([1, 2, 3]));
        assert!(json.get("seed").is_none());
    }

    #[test]
    fn test_sampled_completion_request_with_seed() {
        let params = DecodingParams {
            strategy: DecodingStrategy::Sampled { temperature: 0.5 },
            max_new_tokens: 8,
            seed: Some(3),
        };
        let json = serde_json::to_value(CompletionRequest::new(&[], &params)).unwrap();
        assert_eq!(json["temperature"], 0.5);
        assert_eq!(json["seed"], 3);
    }

    #[test]
    fn test_parse_props() {
        let props: PropsResponse = serde_json::from_str(
            r#"{"default_generation_settings":{"n_ctx":8192,"model":"x"},"eos_token":"<|im_end|>","total_slots":1}"#,
        )
        .unwrap();
        assert_eq!(props.context_size(), Some(8192));
        assert_eq!(props.eos_token.as_deref(), Some("<|im_end|>"));
    }

    #[test]
    fn test_parse_completion_without_tokens() {
        let resp: CompletionResponse =
            serde_json::from_str(r#"{"content":" hi","stop":true,"stop_type":"eos"}"#).unwrap();
        assert!(resp.tokens.is_empty());
        assert!(resp.stopped_on_eos());
    }
}
