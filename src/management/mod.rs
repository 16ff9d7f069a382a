//! # Management Module
//!
//! The management platform whose state the REST API exposes. The launcher only needs a
//! narrow slice of it:
//!
//! - a shared [`ConfigStore`] with get/put semantics keyed by dotted setting names
//! - a [`HighAvailabilityManager`] it can disable at startup
//! - catalog scan roots and a startup-complete marker
//!
//! [`ManagementContext::local`] gives a standalone context suitable for programmatic
//! launches and tests.

mod config;
mod ha;

pub use config::{keys, ConfigStore};
pub use ha::{HaState, HighAvailabilityManager, LocalHighAvailability};

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// Optional platform behaviours toggled through configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    /// Cross-origin support on the API.
    Cors,
}

impl Feature {
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Cors => keys::FEATURE_CORS,
        }
    }

    pub fn is_enabled(&self, config: &ConfigStore) -> bool {
        config.get_bool(self.key(), false)
    }
}

pub struct ManagementContext {
    config: ConfigStore,
    high_availability: Arc<dyn HighAvailabilityManager>,
    base_classpath: RwLock<Vec<PathBuf>>,
    startup_complete: AtomicBool,
}

impl ManagementContext {
    pub fn new(config: ConfigStore, high_availability: Arc<dyn HighAvailabilityManager>) -> Self {
        Self {
            config,
            high_availability,
            base_classpath: RwLock::new(Vec::new()),
            startup_complete: AtomicBool::new(false),
        }
    }

    /// Standalone context with an empty store and a local HA manager.
    pub fn local() -> Self {
        Self::with_config(ConfigStore::new())
    }

    pub fn with_config(config: ConfigStore) -> Self {
        Self::new(config, Arc::new(LocalHighAvailability::new()))
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn high_availability(&self) -> &dyn HighAvailabilityManager {
        self.high_availability.as_ref()
    }

    pub fn set_base_classpath_for_scanning(&self, roots: Vec<PathBuf>) {
        *self.base_classpath.write() = roots;
    }

    pub fn base_classpath_for_scanning(&self) -> Vec<PathBuf> {
        self.base_classpath.read().clone()
    }

    pub fn note_startup_complete(&self) {
        self.startup_complete.store(true, Ordering::Release);
    }

    pub fn is_startup_complete(&self) -> bool {
        self.startup_complete.load(Ordering::Acquire)
    }
}

impl Default for ManagementContext {
    fn default() -> Self {
        Self::local()
    }
}

impl std::fmt::Debug for ManagementContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagementContext")
            .field("config_keys", &self.config.snapshot().len())
            .field("ha_state", &self.high_availability.state())
            .field("startup_complete", &self.is_startup_complete())
            .finish()
    }
}
