//! Generation settings, chat templates and output extraction.

pub mod config;
pub mod continuation;
pub mod template;

pub use config::{
    DEFAULT_MAX_NEW_TOKENS, DEFAULT_TEMPERATURE, DecodingParams, DecodingStrategy, GENERATION_KEYS,
    GenerationConfig, TokenId,
};
pub use continuation::{OutputCleanup, extract_continuation};
pub use template::ChatTemplate;
