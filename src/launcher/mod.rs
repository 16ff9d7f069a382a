//! # Launcher Module
//!
//! Bootstraps the REST server: picks the content to serve, resolves security, chooses a
//! bind address, assembles the filters and starts the engine.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use restlaunch::launcher::Launcher;
//!
//! let server = Launcher::launcher_servlet()
//!     .security_provider("explicit-users")
//!     .without_gui()
//!     .start()?;
//! println!("listening on {}", server.url());
//! server.wait_for_shutdown();
//! # Ok::<(), restlaunch::LaunchError>(())
//! ```
//!
//! A [`LauncherConfig`] is consumed by [`start`](LauncherConfig::start), so every launch
//! computes its content, security decision and bind address exactly once.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::RestApi;
use crate::bind::DEFAULT_PREFERRED_PORT;
use crate::content::{default_descriptor_candidates, default_gui_candidates, BUNDLED_GUI_RESOURCE};
use crate::error::LaunchError;
use crate::filters::{default_servlet_filters, FilterKind};
use crate::management::ManagementContext;
use crate::resources::ClasspathResources;
use crate::security::SecurityRegistry;
use crate::shutdown::ShutdownCoordinator;

mod catalog;
mod context;
mod start;

pub use catalog::{CatalogSource, EMPTY_CATALOG_URL, SCANNING_CATALOG_BOM_URL};
pub use context::{ContextHandler, WebDescriptor, WEB_DESCRIPTOR_FILE};
pub use start::{LaunchPhase, RunningServer};

/// How the application context is built when no custom context is supplied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StartMode {
    /// Programmatic context: API resources plus the companion GUI.
    #[default]
    Servlet,
    /// A packaged webapp located on disk, configured by its own `webapp.yaml`.
    #[serde(alias = "descriptor")]
    ExternalDescriptor,
}

impl fmt::Display for StartMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Servlet => "servlet",
            Self::ExternalDescriptor => "external-descriptor",
        })
    }
}

/// Launcher builder.
pub struct LauncherConfig {
    pub(crate) mgmt: Option<Arc<ManagementContext>>,
    pub(crate) mode: StartMode,
    pub(crate) custom_context: Option<ContextHandler>,
    pub(crate) security_provider: Option<String>,
    pub(crate) filters: Vec<FilterKind>,
    pub(crate) force_scan_catalog: bool,
    pub(crate) catalog_url: Option<String>,
    pub(crate) include_gui: bool,
    pub(crate) disable_high_availability: bool,
    pub(crate) preferred_port: u16,
    pub(crate) gui_candidates: Vec<String>,
    pub(crate) descriptor_candidates: Vec<String>,
    pub(crate) resources: ClasspathResources,
    pub(crate) bundled_gui_resource: String,
    pub(crate) shutdown: Option<ShutdownCoordinator>,
    pub(crate) extra_resources: Vec<Arc<dyn RestApi>>,
    pub(crate) security_registry: SecurityRegistry,
}

/// Entry point name used in docs and the binary.
pub type Launcher = LauncherConfig;

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            mgmt: None,
            mode: StartMode::Servlet,
            custom_context: None,
            security_provider: None,
            filters: default_servlet_filters(),
            force_scan_catalog: false,
            catalog_url: None,
            include_gui: true,
            disable_high_availability: true,
            preferred_port: DEFAULT_PREFERRED_PORT,
            gui_candidates: default_gui_candidates(),
            descriptor_candidates: default_descriptor_candidates(),
            resources: ClasspathResources::empty(),
            bundled_gui_resource: BUNDLED_GUI_RESOURCE.to_string(),
            shutdown: None,
            extra_resources: Vec::new(),
            security_registry: SecurityRegistry::with_builtins(),
        }
    }
}

impl LauncherConfig {
    pub fn launcher() -> Self {
        Self::default()
    }

    pub fn launcher_servlet() -> Self {
        Self::default().mode(StartMode::Servlet)
    }

    pub fn launcher_descriptor() -> Self {
        Self::default().mode(StartMode::ExternalDescriptor)
    }

    /// Management context to launch against; a local one is created when unset.
    pub fn management_context(mut self, mgmt: Arc<ManagementContext>) -> Self {
        self.mgmt = Some(mgmt);
        self
    }

    /// Load the scanning catalog rooted at the executable and working directories.
    pub fn force_use_of_default_catalog_with_classpath(mut self, force: bool) -> Self {
        self.force_scan_catalog = force;
        self
    }

    /// Catalog URL used when scanning is not forced.
    pub fn catalog_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_url = Some(url.into());
        self
    }

    /// Registered name of the provider that overrides any configured one.
    pub fn security_provider(mut self, name: impl Into<String>) -> Self {
        self.security_provider = Some(name.into());
        self
    }

    /// Replace the servlet filters. The API's provider chain is unaffected.
    pub fn filters(mut self, filters: Vec<FilterKind>) -> Self {
        self.filters = filters;
        self
    }

    pub fn mode(mut self, mode: StartMode) -> Self {
        self.mode = mode;
        self
    }

    /// Use `context` instead of building one from the start mode.
    pub fn custom_context(mut self, context: ContextHandler) -> Self {
        self.custom_context = Some(context);
        self
    }

    pub fn with_gui(mut self) -> Self {
        self.include_gui = true;
        self
    }

    pub fn without_gui(mut self) -> Self {
        self.include_gui = false;
        self
    }

    pub fn disable_high_availability(mut self, disable: bool) -> Self {
        self.disable_high_availability = disable;
        self
    }

    /// First port probed by the bind policy.
    pub fn preferred_port(mut self, port: u16) -> Self {
        self.preferred_port = port;
        self
    }

    pub fn gui_candidates<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.gui_candidates = candidates.into_iter().map(Into::into).collect();
        self
    }

    pub fn descriptor_candidates<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.descriptor_candidates = candidates.into_iter().map(Into::into).collect();
        self
    }

    /// Loader for `classpath://` resources such as the bundled GUI.
    pub fn resources(mut self, resources: ClasspathResources) -> Self {
        self.resources = resources;
        self
    }

    pub fn bundled_gui_resource(mut self, url: impl Into<String>) -> Self {
        self.bundled_gui_resource = url.into();
        self
    }

    /// Coordinator that receives the server and the API's shutdown requests.
    pub fn shutdown_coordinator(mut self, coordinator: ShutdownCoordinator) -> Self {
        self.shutdown = Some(coordinator);
        self
    }

    /// Serve an additional REST resource, after the built-in ones.
    pub fn resource(mut self, resource: Arc<dyn RestApi>) -> Self {
        self.extra_resources.push(resource);
        self
    }

    /// Registry providers are looked up in; defaults to the built-ins.
    pub fn security_registry(mut self, registry: SecurityRegistry) -> Self {
        self.security_registry = registry;
        self
    }
}

impl fmt::Debug for LauncherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LauncherConfig")
            .field("mode", &self.mode)
            .field("custom_context", &self.custom_context)
            .field("security_provider", &self.security_provider)
            .field("filters", &self.filters)
            .field("force_scan_catalog", &self.force_scan_catalog)
            .field("catalog_url", &self.catalog_url)
            .field("include_gui", &self.include_gui)
            .field("disable_high_availability", &self.disable_high_availability)
            .field("preferred_port", &self.preferred_port)
            .finish_non_exhaustive()
    }
}

/// Start the programmatic deployment with defaults.
pub fn start_rest_resources_via_servlet() -> Result<RunningServer, LaunchError> {
    LauncherConfig::launcher_servlet().start()
}

/// Start the webapp found among the default descriptor candidates.
pub fn start_rest_resources_via_descriptor() -> Result<RunningServer, LaunchError> {
    LauncherConfig::launcher_descriptor().start()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LauncherConfig::default();
        assert_eq!(config.mode, StartMode::Servlet);
        assert_eq!(config.filters, vec![FilterKind::RequestTagging, FilterKind::Logging]);
        assert!(config.include_gui);
        assert!(config.disable_high_availability);
        assert_eq!(config.preferred_port, 8081);
        assert_eq!(config.bundled_gui_resource, "classpath://gui.tar");
    }

    #[test]
    fn test_builder_methods() {
        let config = LauncherConfig::launcher_descriptor()
            .security_provider("explicit-users")
            .filters(vec![FilterKind::Logging])
            .without_gui()
            .disable_high_availability(false)
            .preferred_port(9000);
        assert_eq!(config.mode, StartMode::ExternalDescriptor);
        assert_eq!(config.security_provider.as_deref(), Some("explicit-users"));
        assert_eq!(config.filters, vec![FilterKind::Logging]);
        assert!(!config.include_gui);
        assert!(!config.disable_high_availability);
        assert_eq!(config.preferred_port, 9000);
    }
}
