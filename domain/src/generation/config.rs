//! Generation settings carried by each agent.

use crate::config::KwargSpec;
use crate::core::error::ConfigParseError;
use serde::{Deserialize, Serialize};

/// Default sampling temperature (greedy).
pub const DEFAULT_TEMPERATURE: f32 = 0.0;
/// Default cap on newly generated tokens.
pub const DEFAULT_MAX_NEW_TOKENS: usize = 100;
/// Generation keys understood by [`GenerationConfig::from_kwargs`].
pub const GENERATION_KEYS: &[&str] = &["temperature", "max_new_tokens", "return_full_text", "seed"];

/// Token identifier in a model vocabulary.
pub type TokenId = u32;

/// Per-agent generation settings (immutable after construction).
///
/// `temperature == 0.0` selects greedy decoding; any positive value selects
/// sampling from the temperature-scaled distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    temperature: f32,
    max_new_tokens: usize,
    return_full_text: bool,
    seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
            return_full_text: false,
            seed: None,
        }
    }
}

impl GenerationConfig {
    /// Validated constructor: temperature must be finite and `>= 0`,
    /// `max_new_tokens` must be positive.
    pub fn new(temperature: f32, max_new_tokens: usize) -> Result<Self, ConfigParseError> {
        if !temperature.is_finite() || temperature < 0.0 {
            return Err(ConfigParseError::invalid_value(
                "temperature",
                temperature.to_string(),
                "must be a finite number >= 0",
            ));
        }
        if max_new_tokens == 0 {
            return Err(ConfigParseError::invalid_value(
                "max_new_tokens",
                "0",
                "must be > 0",
            ));
        }
        Ok(Self {
            temperature,
            max_new_tokens,
            ..Self::default()
        })
    }

    /// Build from a parsed generation specification. Missing keys take
    /// defaults; keys outside [`GENERATION_KEYS`] are left for the caller
    /// to report.
    pub fn from_kwargs(spec: &KwargSpec) -> Result<Self, ConfigParseError> {
        let temperature = spec
            .get_parsed::<f32>("temperature")?
            .unwrap_or(DEFAULT_TEMPERATURE);
        let max_new_tokens = spec
            .get_parsed::<usize>("max_new_tokens")?
            .unwrap_or(DEFAULT_MAX_NEW_TOKENS);

        let mut config = Self::new(temperature, max_new_tokens)?;
        if let Some(full) = spec.get_bool("return_full_text")? {
            config.return_full_text = full;
        }
        config.seed = spec.get_parsed::<u64>("seed")?;
        Ok(config)
    }

    pub fn with_return_full_text(mut self, full: bool) -> Self {
        self.return_full_text = full;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_new_tokens(&self) -> usize {
        self.max_new_tokens
    }

    pub fn return_full_text(&self) -> bool {
        self.return_full_text
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn strategy(&self) -> DecodingStrategy {
        if self.temperature > 0.0 {
            DecodingStrategy::Sampled {
                temperature: self.temperature,
            }
        } else {
            DecodingStrategy::Greedy
        }
    }

    /// Parameters handed to the model for one generation call.
    pub fn decoding_params(&self) -> DecodingParams {
        DecodingParams {
            strategy: self.strategy(),
            max_new_tokens: self.max_new_tokens,
            seed: self.seed,
        }
    }
}

/// Decoding mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DecodingStrategy {
    /// Always take the highest-probability token.
    Greedy,
    /// Draw from the temperature-scaled distribution.
    Sampled { temperature: f32 },
}

impl DecodingStrategy {
    pub fn is_greedy(&self) -> bool {
        matches!(self, DecodingStrategy::Greedy)
    }

    /// Temperature to report; greedy decoding reports `0.0`.
    pub fn temperature(&self) -> f32 {
        match self {
            DecodingStrategy::Greedy => 0.0,
            DecodingStrategy::Sampled { temperature } => *temperature,
        }
    }
}

/// What the model capability receives for one `generate` call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecodingParams {
    pub strategy: DecodingStrategy,
    pub max_new_tokens: usize,
    pub seed: Option<u64>,
}
