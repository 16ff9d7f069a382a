//! Shutdown coordination between the API and whoever owns the running server.
//!
//! The shutdown resource only signals; the owner of the `RunningServer` waits on the
//! coordinator and performs the actual stop.

use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::info;

#[derive(Debug, Default)]
struct State {
    server: Option<SocketAddr>,
    requested: bool,
}

/// Receives the running server and shutdown requests for it.
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct ShutdownCoordinator {
    inner: Arc<(Mutex<State>, Condvar)>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the server this coordinator stops.
    pub fn set_server(&self, addr: SocketAddr) {
        self.inner.0.lock().server = Some(addr);
    }

    pub fn server(&self) -> Option<SocketAddr> {
        self.inner.0.lock().server
    }

    /// Ask the owner to stop the server. Idempotent.
    pub fn request_shutdown(&self) {
        let (lock, cvar) = &*self.inner;
        let mut state = lock.lock();
        if !state.requested {
            info!(server = ?state.server, "Shutdown requested");
            state.requested = true;
        }
        cvar.notify_all();
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.inner.0.lock().requested
    }

    /// Block until a shutdown is requested.
    pub fn wait_for_request(&self) {
        let (lock, cvar) = &*self.inner;
        let mut state = lock.lock();
        while !state.requested {
            cvar.wait(&mut state);
        }
    }
}
