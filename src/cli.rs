//! Command line front end for the `restlaunch` binary.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;

use crate::launcher::{Launcher, StartMode};
use crate::management::{ConfigStore, ManagementContext};
use crate::resources::ClasspathResources;
use crate::runtime_config::RuntimeConfig;
use crate::shutdown::ShutdownCoordinator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Programmatic API with the companion GUI
    Servlet,
    /// Packaged webapp found on disk
    Descriptor,
}

impl From<ModeArg> for StartMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Servlet => StartMode::Servlet,
            ModeArg::Descriptor => StartMode::ExternalDescriptor,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "restlaunch")]
#[command(about = "Launch the REST API server", long_about = None)]
pub struct Cli {
    /// How the application context is built
    #[arg(long, value_enum, default_value = "servlet")]
    pub mode: ModeArg,

    /// YAML properties loaded into the management configuration
    #[arg(short, long)]
    pub properties: Option<PathBuf>,

    /// Security provider overriding the configured one
    #[arg(long)]
    pub security_provider: Option<String>,

    /// Load the scanning catalog
    #[arg(long, default_value_t = false)]
    pub scan_catalog: bool,

    /// Catalog URL, ignored with --scan-catalog
    #[arg(long)]
    pub catalog_url: Option<String>,

    /// Serve the placeholder page instead of looking for the GUI
    #[arg(long, default_value_t = false)]
    pub without_gui: bool,

    /// Keep high availability enabled
    #[arg(long, default_value_t = false)]
    pub enable_ha: bool,

    /// First port to try
    #[arg(long, env = "RESTLAUNCH_PREFERRED_PORT")]
    pub port: Option<u16>,

    /// Directory `classpath://` URLs resolve against; repeatable
    #[arg(long = "resources")]
    pub resources: Vec<PathBuf>,
}

impl Cli {
    /// Launcher configured from the arguments, with environment settings as fallback.
    pub fn launcher(&self, runtime: &RuntimeConfig) -> Result<Launcher> {
        let store = match &self.properties {
            Some(path) => ConfigStore::load_yaml(path)?,
            None => ConfigStore::new(),
        };

        let resource_dirs = if self.resources.is_empty() {
            runtime.resource_dirs.clone()
        } else {
            self.resources.clone()
        };

        let mut launcher = Launcher::launcher()
            .mode(self.mode.into())
            .management_context(Arc::new(ManagementContext::with_config(store)))
            .force_use_of_default_catalog_with_classpath(self.scan_catalog)
            .disable_high_availability(!self.enable_ha)
            .preferred_port(self.port.unwrap_or(runtime.preferred_port))
            .resources(ClasspathResources::new(resource_dirs));
        if let Some(provider) = &self.security_provider {
            launcher = launcher.security_provider(provider.clone());
        }
        if let Some(url) = &self.catalog_url {
            launcher = launcher.catalog_url(url.clone());
        }
        if self.without_gui {
            launcher = launcher.without_gui();
        }
        Ok(launcher)
    }
}

/// Start the server and block until SIGINT, SIGTERM or a shutdown request.
pub fn run_cli(cli: Cli) -> Result<()> {
    let runtime = RuntimeConfig::from_env();
    runtime.apply();

    let shutdown = ShutdownCoordinator::new();
    install_signal_handler(shutdown.clone())?;

    let server = cli
        .launcher(&runtime)?
        .shutdown_coordinator(shutdown)
        .start()
        .context("failed to launch REST server")?;
    info!(url = %server.url(), security = ?server.security().provider, "Ready");
    server.wait_for_shutdown();
    Ok(())
}

#[cfg(unix)]
fn install_signal_handler(shutdown: ShutdownCoordinator) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("failed to register signal handlers")?;
    std::thread::Builder::new()
        .name("restlaunch-signals".into())
        .spawn(move || {
            if let Some(sig) = signals.forever().next() {
                info!(signal = sig, "Shutdown signal received");
                shutdown.request_shutdown();
            }
        })
        .context("failed to spawn signal thread")?;
    Ok(())
}

#[cfg(not(unix))]
fn install_signal_handler(_shutdown: ShutdownCoordinator) -> Result<()> {
    Ok(())
}
