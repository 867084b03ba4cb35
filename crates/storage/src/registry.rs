//! Adapter registry: configuration identifier → statically known factory.
//!
//! The registry replaces instantiate-by-class-name adapter selection with
//! an enumerated allow-list checked at startup. Unknown identifiers are a
//! configuration error that names the identifiers that would have worked;
//! nothing is ever resolved from a path or loaded dynamically.

use std::collections::BTreeMap;
use std::sync::Arc;

use nimbus_core::CoreError;

use crate::adapter::StorageAdapter;
use crate::memory::MemoryAdapter;
use crate::AdapterError;

/// Constructs one adapter instance. Called at most once per process, at
/// startup.
pub type AdapterFactory =
    Box<dyn Fn() -> Result<Arc<dyn StorageAdapter>, AdapterError> + Send + Sync>;

pub struct AdapterRegistry {
    factories: BTreeMap<String, AdapterFactory>,
}

impl AdapterRegistry {
    /// A registry pre-populated with the built-in adapters.
    pub fn with_builtins() -> Self {
        let mut registry = Self {
            factories: BTreeMap::new(),
        };
        registry.register("memory", Box::new(|| Ok(Arc::new(MemoryAdapter::new()))));
        registry
    }

    /// Register an external adapter under `name`, replacing any previous
    /// registration.
    pub fn register(&mut self, name: impl Into<String>, factory: AdapterFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// The identifiers this registry accepts.
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Build the adapter configured under `name`.
    pub fn build(&self, name: &str) -> Result<Arc<dyn StorageAdapter>, CoreError> {
        let factory = self.factories.get(name).ok_or_else(|| {
            CoreError::Configuration(format!(
                "unknown storage adapter '{}' (known adapters: {})",
                name,
                self.names().join(", ")
            ))
        })?;

        factory().map_err(|e| {
            CoreError::Configuration(format!("failed to initialise adapter '{name}': {e}"))
        })
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_the_builtin_memory_adapter() {
        let registry = AdapterRegistry::with_builtins();
        assert!(registry.build("memory").is_ok());
    }

    #[test]
    fn rejects_unknown_identifiers_with_the_allow_list() {
        let registry = AdapterRegistry::with_builtins();
        let err = registry.build("../evil").err().unwrap();
        let message = err.to_string();
        assert!(message.contains("../evil"));
        assert!(message.contains("memory"));
    }

    #[test]
    fn external_adapters_can_be_registered() {
        let mut registry = AdapterRegistry::with_builtins();
        registry.register("memory2", Box::new(|| Ok(Arc::new(MemoryAdapter::new()))));
        assert_eq!(registry.names(), ["memory", "memory2"]);
        assert!(registry.build("memory2").is_ok());
    }
}
