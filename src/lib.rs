//! # restlaunch
//!
//! **restlaunch** bootstraps an embedded HTTP server that serves a REST API next to an
//! optional companion GUI, on the `may` coroutine runtime with `may_minihttp`.
//!
//! ## Overview
//!
//! One call to [`LauncherConfig::start`](launcher::LauncherConfig::start) runs the whole
//! launch:
//!
//! 1. pick the static content to serve, from source checkouts, a bundled archive, or a
//!    generated placeholder page ([`content`])
//! 2. decide which security provider guards the API from the override, the configured
//!    provider and the defaults ([`security`])
//! 3. bind to every interface when security is configured, else to loopback with
//!    authentication switched off, on the first free port from 8081 ([`bind`])
//! 4. wrap the API in its filters ([`filters`]) and start the engine ([`server`])
//!
//! ## Architecture
//!
//! - **[`launcher`]** - builder, start modes, lifecycle and the running server
//! - **[`content`]** - candidate lookup with filename globs, archives, fallback page
//! - **[`security`]** - decision table, provider registry, login service
//! - **[`bind`]** - bind address and port selection
//! - **[`filters`]** - servlet filters and the API provider chain
//! - **[`api`]** - REST resources, including the built-in server resource
//! - **[`management`]** - configuration store, HA manager and catalog settings
//! - **[`server`]** - `may_minihttp` service, request and response types
//! - **[`static_files`]** - traversal-safe static file loading
//! - **[`resources`]** - `classpath://` resource lookup
//! - **[`shutdown`]** - shutdown requests from the API to the server owner
//! - **[`telemetry`]** / **[`runtime_config`]** - logging and environment settings
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use restlaunch::launcher::Launcher;
//! use restlaunch::shutdown::ShutdownCoordinator;
//!
//! let shutdown = ShutdownCoordinator::new();
//! let server = Launcher::launcher_servlet()
//!     .shutdown_coordinator(shutdown.clone())
//!     .start()?;
//! println!("REST API at {}", server.url());
//! server.wait_for_shutdown();
//! # Ok::<(), restlaunch::LaunchError>(())
//! ```

pub mod api;
pub mod bind;
pub mod cli;
pub mod content;
pub mod error;
pub mod filters;
pub mod launcher;
pub mod management;
pub mod resources;
pub mod runtime_config;
pub mod security;
pub mod server;
pub mod shutdown;
pub mod static_files;
pub mod telemetry;

pub use error::LaunchError;
pub use launcher::{
    start_rest_resources_via_descriptor, start_rest_resources_via_servlet, Launcher,
    LauncherConfig, RunningServer, StartMode,
};
pub use security::{SecurityProvider, SecurityRequest};
