//! Registry of model backends selected by name

use playpen_application::{AgentSpec, BackendError, LoadedModel, ModelBackend};
use std::sync::Arc;
use tracing::debug;

/// Dispatches `load` to a named backend adapter.
///
/// Resolution order:
///  1. the agent's `backend=` key
///  2. the registry default
///  3. the first registered backend
pub struct BackendRegistry {
    backends: Vec<(String, Arc<dyn ModelBackend>)>,
    default_backend: Option<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
            default_backend: None,
        }
    }

    /// Register `backend` under `name`, replacing an earlier one of the same name.
    pub fn register(mut self, name: impl Into<String>, backend: Arc<dyn ModelBackend>) -> Self {
        let name = name.into();
        if let Some(slot) = self.backends.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = backend;
        } else {
            self.backends.push((name, backend));
        }
        self
    }

    pub fn with_default(mut self, name: impl Into<String>) -> Self {
        self.default_backend = Some(name.into());
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.backends.iter().map(|(n, _)| n.as_str())
    }

    fn resolve(&self, spec: &AgentSpec) -> Result<(&str, &dyn ModelBackend), BackendError> {
        let requested = spec.backend.as_deref().or(self.default_backend.as_deref());

        if let Some(name) = requested {
            return self
                .backends
                .iter()
                .find(|(n, _)| n == name)
                .map(|(n, b)| (n.as_str(), b.as_ref()))
                .ok_or_else(|| BackendError::UnknownBackend(name.to_string()));
        }

        self.backends
            .first()
            .map(|(n, b)| (n.as_str(), b.as_ref()))
            .ok_or_else(|| BackendError::UnknownBackend("no backends registered".to_string()))
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelBackend for BackendRegistry {
    fn load(&self, spec: &AgentSpec) -> Result<LoadedModel, BackendError> {
        let (name, backend) = self.resolve(spec)?;
        debug!(model = %spec.model_name, backend = name, "Resolved backend");
        backend.load(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Named {
        label: &'static str,
        seen: Arc<Mutex<Vec<&'static str>>>,
    }

    impl ModelBackend for Named {
        fn load(&self, spec: &AgentSpec) -> Result<LoadedModel, BackendError> {
            self.seen.lock().unwrap().push(self.label);
            Err(BackendError::Load {
                model_name: spec.model_name.clone(),
                reason: "stub".to_string(),
            })
        }
    }

    fn registry(seen: &Arc<Mutex<Vec<&'static str>>>) -> BackendRegistry {
        BackendRegistry::new()
            .register(
                "alpha",
                Arc::new(Named {
                    label: "alpha",
                    seen: seen.clone(),
                }),
            )
            .register(
                "beta",
                Arc::new(Named {
                    label: "beta",
                    seen: seen.clone(),
                }),
            )
    }

    #[test]
    fn test_explicit_backend_key_wins() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let registry = registry(&seen).with_default("alpha");
        let spec = AgentSpec::parse("model_name=m,backend=beta").unwrap();
        let _ = registry.load(&spec);
        assert_eq!(*seen.lock().unwrap(), vec!["beta"]);
    }

    #[test]
    fn test_default_then_first() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let spec = AgentSpec::parse("model_name=m").unwrap();

        let _ = registry(&seen).with_default("beta").load(&spec);
        let _ = registry(&seen).load(&spec);

        assert_eq!(*seen.lock().unwrap(), vec!["beta", "alpha"]);
    }

    #[test]
    fn test_unknown_backend() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let spec = AgentSpec::parse("model_name=m,backend=vllm").unwrap();
        let err = registry(&seen).load(&spec).unwrap_err();
        assert!(matches!(err, BackendError::UnknownBackend(ref n) if n == "vllm"));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_empty_registry() {
        let spec = AgentSpec::parse("model_name=m").unwrap();
        assert!(matches!(
            BackendRegistry::new().load(&spec),
            Err(BackendError::UnknownBackend(_))
        ));
    }

    #[test]
    fn test_register_replaces_same_name() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let registry = registry(&seen).register(
            "alpha",
            Arc::new(Named {
                label: "alpha2",
                seen: seen.clone(),
            }),
        );
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["alpha", "beta"]);
        let _ = registry.load(&AgentSpec::parse("model_name=m,backend=alpha").unwrap());
        assert_eq!(*seen.lock().unwrap(), vec!["alpha2"]);
    }
}
