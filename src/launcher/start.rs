use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::catalog::CatalogSource;
use super::context::{ContextHandler, WebDescriptor};
use super::{LauncherConfig, StartMode};
use crate::api::{default_resources, ApiContext};
use crate::bind::{BindAddress, BindPolicy};
use crate::content::{find_first_matching_file, ContentLocator, ContentRoot, ResolvedContent};
use crate::error::LaunchError;
use crate::filters::{default_servlet_filters, FilterChainBuilder, FilterContext};
use crate::management::ManagementContext;
use crate::security::{LoginService, SecurityDecision, ANYONE};
use crate::server::{normalize_context_path, HttpServer, LaunchService, ServerHandle, ServiceParts};
use crate::shutdown::ShutdownCoordinator;
use crate::static_files::StaticFiles;

/// Launch lifecycle: `Configuring → Resolving → Starting → Running → Stopped | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LaunchPhase {
    Configuring,
    Resolving,
    Starting,
    Running,
    Stopped,
    Failed,
}

impl fmt::Display for LaunchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Configuring => "configuring",
            Self::Resolving => "resolving",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        })
    }
}

struct PhaseTracker(LaunchPhase);

impl PhaseTracker {
    fn enter(&mut self, next: LaunchPhase) {
        info!(from = %self.0, to = %next, "Launch phase transition");
        self.0 = next;
    }
}

/// The context a launch serves, before the engine exists.
struct Deployment {
    content: Option<ContentRoot>,
    descriptor: WebDescriptor,
    accepts_security: bool,
    summary: String,
}

/// A started server.
///
/// Dropping it stops the engine and removes any temporary content directories.
pub struct RunningServer {
    handle: Option<ServerHandle>,
    bind: BindAddress,
    security: SecurityDecision,
    catalog: CatalogSource,
    content: Option<ContentRoot>,
    summary: String,
    context_path: String,
    mgmt: Arc<ManagementContext>,
    shutdown: Option<ShutdownCoordinator>,
    phase: LaunchPhase,
}

impl LauncherConfig {
    /// Resolve, bind and start. Consumes the configuration.
    ///
    /// # Errors
    ///
    /// Any [`LaunchError`]; nothing is left running when one is returned.
    pub fn start(self) -> Result<RunningServer, LaunchError> {
        let mut phase = PhaseTracker(LaunchPhase::Configuring);
        debug!(config = ?self, "Launch requested");
        match self.launch(&mut phase) {
            Ok(server) => Ok(server),
            Err(e) => {
                phase.enter(LaunchPhase::Failed);
                warn!(error = %e, "Launch failed");
                Err(e)
            }
        }
    }

    fn launch(self, phase: &mut PhaseTracker) -> Result<RunningServer, LaunchError> {
        phase.enter(LaunchPhase::Resolving);

        if let Some(name) = &self.security_provider {
            if name != ANYONE && !self.security_registry.contains(name) {
                return Err(LaunchError::UnknownSecurityProvider(name.clone()));
            }
        }

        let mgmt = self
            .mgmt
            .clone()
            .unwrap_or_else(|| Arc::new(ManagementContext::local()));
        mgmt.note_startup_complete();
        debug!(mgmt = ?mgmt, "Management platform started");

        let deployment = self.select_context()?;

        let config = mgmt.config();
        let security = SecurityDecision::resolve(self.security_provider.as_deref(), config);
        let enforce = if deployment.accepts_security {
            security.apply(config);
            security.is_enforced()
        } else if security.is_enforced() {
            return Err(LaunchError::SecurityUnsupported {
                provider: security.provider.clone().unwrap_or_default(),
            });
        } else {
            debug!("Custom context, no security handler installed");
            false
        };

        let catalog = CatalogSource::select(self.force_scan_catalog, self.catalog_url.as_deref());
        catalog.apply(&mgmt);

        phase.enter(LaunchPhase::Starting);
        let bind = BindPolicy::resolve(
            config,
            mgmt.high_availability(),
            self.disable_high_availability,
            self.preferred_port,
        )?;

        let filter_ctx = FilterContext::new(Arc::clone(&mgmt));
        let servlet_kinds = match deployment.descriptor.filters.as_deref() {
            Some(kinds) => {
                if self.filters != default_servlet_filters() && self.filters != kinds {
                    debug!(
                        configured = ?self.filters,
                        descriptor = ?kinds,
                        "Web descriptor filters replace the configured servlet filters"
                    );
                }
                kinds
            }
            None => self.filters.as_slice(),
        };
        let servlet_filters = FilterChainBuilder::servlet_chain(Some(servlet_kinds)).build(&filter_ctx);
        let provider_filters = FilterChainBuilder::provider_chain(config).build(&filter_ctx);

        let login = LoginService::new(Arc::new(self.security_registry), config.clone(), enforce);

        let mut resources = default_resources();
        resources.extend(self.extra_resources);

        let context_path = normalize_context_path(&deployment.descriptor.context_path);
        let static_files = deployment.content.as_ref().map(|root| {
            StaticFiles::new(root.serve_dir()).with_welcome(deployment.descriptor.welcome.clone())
        });

        let service = LaunchService::new(ServiceParts {
            login,
            servlet_filters,
            provider_filters,
            resources,
            api_context: ApiContext {
                mgmt: Arc::clone(&mgmt),
                shutdown: self.shutdown.clone(),
            },
            static_files,
            context_path: context_path.clone(),
            serve_api: deployment.descriptor.api,
        });

        let addr = bind.socket_addr();
        let handle = HttpServer(service)
            .start(addr)
            .map_err(|e| LaunchError::engine(addr, e))?;
        if let Err(e) = handle.wait_ready() {
            handle.stop();
            return Err(LaunchError::NotReady { addr, source: e });
        }

        if let Some(coordinator) = &self.shutdown {
            coordinator.set_server(addr);
        }

        phase.enter(LaunchPhase::Running);
        info!(summary = %deployment.summary, addr = %addr, "REST server started");
        info!("  http://localhost:{}{}", bind.port, context_path);

        Ok(RunningServer {
            handle: Some(handle),
            bind,
            security,
            catalog,
            content: deployment.content,
            summary: deployment.summary,
            context_path,
            mgmt,
            shutdown: self.shutdown,
            phase: LaunchPhase::Running,
        })
    }

    fn select_context(&self) -> Result<Deployment, LaunchError> {
        if let Some(custom) = &self.custom_context {
            return match custom {
                ContextHandler::WebApp { root, descriptor } => {
                    let content = ContentRoot::from_path(root)?;
                    let descriptor = match descriptor {
                        Some(d) => d.clone(),
                        None => WebDescriptor::load(content.serve_dir())?,
                    };
                    Ok(Deployment {
                        content: Some(content),
                        descriptor,
                        accepts_security: true,
                        summary: format!("from webapp at {}", root.display()),
                    })
                }
                ContextHandler::Custom {
                    static_root,
                    context_path,
                    serve_api,
                } => Ok(Deployment {
                    content: static_root.as_deref().map(ContentRoot::from_path).transpose()?,
                    descriptor: WebDescriptor {
                        context_path: context_path.clone(),
                        api: *serve_api,
                        ..WebDescriptor::default()
                    },
                    accepts_security: false,
                    summary: "from custom context".to_string(),
                }),
            };
        }

        match self.mode {
            StartMode::Servlet => {
                let locator = ContentLocator::new(
                    self.gui_candidates.clone(),
                    self.bundled_gui_resource.clone(),
                    self.resources.clone(),
                );
                let content = locator.resolve_gui(self.include_gui)?;
                Ok(Deployment {
                    content: Some(content),
                    descriptor: WebDescriptor::default(),
                    accepts_security: true,
                    summary: "programmatic REST servlet".to_string(),
                })
            }
            StartMode::ExternalDescriptor => {
                let path = find_first_matching_file(&self.descriptor_candidates).ok_or_else(|| {
                    LaunchError::DescriptorNotFound {
                        searched: self.descriptor_candidates.clone(),
                    }
                })?;
                let content = ContentRoot::from_path(&path)?;
                let descriptor = WebDescriptor::load(content.serve_dir())?;
                Ok(Deployment {
                    content: Some(content),
                    descriptor,
                    accepts_security: true,
                    summary: format!("from webapp at {}", path.display()),
                })
            }
        }
    }
}

impl RunningServer {
    pub fn addr(&self) -> SocketAddr {
        self.bind.socket_addr()
    }

    pub fn port(&self) -> u16 {
        self.bind.port
    }

    pub fn bind_address(&self) -> &BindAddress {
        &self.bind
    }

    pub fn security(&self) -> &SecurityDecision {
        &self.security
    }

    pub fn catalog(&self) -> &CatalogSource {
        &self.catalog
    }

    /// Static content served, if the context has any.
    pub fn content(&self) -> Option<&ResolvedContent> {
        self.content.as_ref().map(ContentRoot::resolved)
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn management(&self) -> &Arc<ManagementContext> {
        &self.mgmt
    }

    pub fn phase(&self) -> LaunchPhase {
        self.phase
    }

    /// Loopback URL of the application root.
    pub fn url(&self) -> String {
        let path = if self.context_path == "/" {
            "/".to_string()
        } else {
            format!("{}/", self.context_path)
        };
        format!("http://localhost:{}{}", self.bind.port, path)
    }

    /// Stop the engine and release temporary content.
    pub fn stop(mut self) {
        self.halt();
    }

    /// Block until the shutdown coordinator is signalled, then stop.
    ///
    /// Without a coordinator this waits for the engine to exit on its own.
    pub fn wait_for_shutdown(mut self) {
        match self.shutdown.clone() {
            Some(coordinator) => {
                coordinator.wait_for_request();
                self.halt();
            }
            None => {
                if let Some(handle) = self.handle.take() {
                    if handle.join().is_err() {
                        warn!(addr = %self.bind, "Server coroutine panicked");
                    }
                }
                self.phase = LaunchPhase::Stopped;
            }
        }
    }

    fn halt(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
            let next = LaunchPhase::Stopped;
            info!(from = %self.phase, to = %next, addr = %self.bind, "Launch phase transition");
            self.phase = next;
        }
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        self.halt();
    }
}

impl fmt::Debug for RunningServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunningServer")
            .field("bind", &self.bind)
            .field("security", &self.security)
            .field("content", &self.content())
            .field("summary", &self.summary)
            .field("phase", &self.phase)
            .finish()
    }
}
