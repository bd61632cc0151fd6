//! Blocking HTTP client for a llama.cpp-compatible server.

use super::types::{
    CompletionRequest, CompletionResponse, DetokenizeRequest, DetokenizeResponse, PropsResponse,
    TokenizeRequest, TokenizeResponse,
};
use playpen_application::BackendError;
use playpen_domain::{DecodingParams, TokenId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Thin wrapper over `reqwest::blocking::Client` bound to one server.
///
/// Each call is a single stateless request, so one client may be shared by
/// several tokenizer/model handles.
#[derive(Debug, Clone)]
pub struct LlamaServerClient {
    http: reqwest::blocking::Client,
    endpoint: String,
}

impl LlamaServerClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Connection(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn tokenize(&self, content: &str) -> Result<Vec<TokenId>, BackendError> {
        let request = TokenizeRequest {
            content,
            add_special: false,
            parse_special: true,
        };
        let response: TokenizeResponse = self.post("tokenize", &request)?;
        Ok(response.tokens)
    }

    pub fn detokenize(&self, tokens: &[TokenId]) -> Result<String, BackendError> {
        let response: DetokenizeResponse = self.post("detokenize", &DetokenizeRequest { tokens })?;
        Ok(response.content)
    }

    pub fn complete(
        &self,
        prompt: &[TokenId],
        params: &DecodingParams,
    ) -> Result<CompletionResponse, BackendError> {
        debug!(
            prompt_tokens = prompt.len(),
            n_predict = params.max_new_tokens,
            greedy = params.strategy.is_greedy(),
            "POST /completion"
        );
        self.post("completion", &CompletionRequest::new(prompt, params))
    }

    pub fn props(&self) -> Result<PropsResponse, BackendError> {
        let url = self.url("props");
        let response = self.http.get(&url).send().map_err(|e| map_send_error(&url, e))?;
        read_json(&url, response)
    }

    fn post<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R, BackendError> {
        let url = self.url(path);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| map_send_error(&url, e))?;
        read_json(&url, response)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }
}

fn read_json<R: DeserializeOwned>(
    url: &str,
    response: reqwest::blocking::Response,
) -> Result<R, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(BackendError::Generation(format!(
            "{url} returned {status}: {}",
            body.trim()
        )));
    }
    response
        .json()
        .map_err(|e| BackendError::Generation(format!("Invalid response from {url}: {e}")))
}

fn map_send_error(url: &str, error: reqwest::Error) -> BackendError {
    if error.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Connection(format!("{url}: {error}"))
    }
}
