//! Model backend adapters and the registry that selects between them.

pub mod llama_server;
mod registry;

pub use llama_server::{LlamaServerBackend, LlamaServerClient};
pub use registry::BackendRegistry;

use crate::config::FileBackendConfig;
use std::sync::Arc;
use std::time::Duration;

/// Name the llama.cpp adapter is registered under.
pub const LLAMA_SERVER: &str = "llama-server";

impl BackendRegistry {
    /// Registry with every built-in adapter, configured from `[backend]`.
    pub fn from_config(config: &FileBackendConfig) -> Self {
        let llama = LlamaServerBackend::new(
            config.endpoint.clone(),
            Duration::from_secs(config.timeout_secs),
        );
        Self::new()
            .register(LLAMA_SERVER, Arc::new(llama))
            .with_default(config.default_backend.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_registers_llama_server() {
        let registry = BackendRegistry::from_config(&FileBackendConfig::default());
        assert_eq!(registry.names().collect::<Vec<_>>(), vec![LLAMA_SERVER]);
    }
}
