//! Launch error taxonomy.
//!
//! Only fatal startup conditions are errors. Missing security configuration and
//! content misses resolve to default behaviour and never surface here.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors raised while resolving or starting a launch.
///
/// These abort the launch; nothing is left running when `start()` returns one.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// External-descriptor mode could not find a webapp to serve.
    #[error("cannot find web descriptor for REST API; looked in: {}", .searched.join(", "))]
    DescriptorNotFound {
        /// Candidate patterns that were probed.
        searched: Vec<String>,
    },

    /// A `webapp.yaml` descriptor exists but cannot be parsed.
    #[error("invalid web descriptor at {path}: {source}")]
    InvalidDescriptor {
        /// Descriptor file.
        path: PathBuf,
        /// Parse failure.
        #[source]
        source: serde_yaml::Error,
    },

    /// Content was selected but could not be read, written or unpacked.
    #[error("content at {path} is unavailable: {source}")]
    ContentUnavailable {
        /// Path being prepared.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The security provider override names nothing in the registry.
    #[error("unknown security provider '{0}'")]
    UnknownSecurityProvider(String),

    /// Security must be enforced but the context cannot install a login service.
    #[error("security provider '{provider}' is configured but the custom context does not accept a security handler")]
    SecurityUnsupported {
        /// Provider that would have been enforced.
        provider: String,
    },

    /// Port probing ran off the end of the port range.
    #[error("no available port at or above {from}")]
    NoAvailablePort {
        /// Preferred port the probe started from.
        from: u16,
    },

    /// The engine could not bind the chosen address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address chosen by the bind policy.
        addr: SocketAddr,
        /// Underlying bind failure.
        #[source]
        source: io::Error,
    },

    /// The engine failed to start for a reason other than binding.
    #[error("failed to start HTTP engine: {0}")]
    EngineStart(#[source] io::Error),

    /// The engine started but never accepted a connection.
    #[error("server at {addr} did not become ready: {source}")]
    NotReady {
        /// Address the server was started on.
        addr: SocketAddr,
        /// Readiness probe failure.
        #[source]
        source: io::Error,
    },
}

impl LaunchError {
    /// Classify an engine start failure.
    pub(crate) fn engine(addr: SocketAddr, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::AddrInUse
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::PermissionDenied => Self::Bind { addr, source },
            _ => Self::EngineStart(source),
        }
    }

    pub(crate) fn content(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::ContentUnavailable {
            path: path.into(),
            source,
        }
    }
}
