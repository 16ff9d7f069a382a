use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::warn;

use super::providers::{AnyoneSecurityProvider, BlackholeSecurityProvider, ExplicitUsersSecurityProvider};
use super::{SecurityProvider, ANYONE, BLACKHOLE, EXPLICIT_USERS};
use crate::management::ConfigStore;

/// Builds a provider from the current configuration.
pub type ProviderFactory = Arc<dyn Fn(&ConfigStore) -> Arc<dyn SecurityProvider> + Send + Sync>;

/// Name → factory lookup for security providers.
#[derive(Clone)]
pub struct SecurityRegistry {
    factories: HashMap<String, ProviderFactory>,
}

impl SecurityRegistry {
    /// Empty registry; [`create`](Self::create) falls back to `blackhole` for everything.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with `anyone`, `explicit-users` and `blackhole`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(ANYONE, |_| Arc::new(AnyoneSecurityProvider));
        registry.register(EXPLICIT_USERS, |config| {
            Arc::new(ExplicitUsersSecurityProvider::from_config(config))
        });
        registry.register(BLACKHOLE, |_| Arc::new(BlackholeSecurityProvider));
        registry
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&ConfigStore) -> Arc<dyn SecurityProvider> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Instantiate `name`; unknown names deny everything.
    pub fn create(&self, name: &str, config: &ConfigStore) -> Arc<dyn SecurityProvider> {
        match self.factories.get(name) {
            Some(factory) => factory(config),
            None => {
                warn!(provider = %name, "Unknown security provider configured, denying all requests");
                Arc::new(BlackholeSecurityProvider)
            }
        }
    }
}

impl Default for SecurityRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for SecurityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityRegistry")
            .field("providers", &self.names())
            .finish()
    }
}
