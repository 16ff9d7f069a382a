//! Bind address selection.
//!
//! A deployment with any security configuration listens on every interface. One without
//! stays on loopback, and authentication is switched off by forcing the `anyone`
//! provider into the configuration store.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::LaunchError;
use crate::management::{keys, ConfigStore, HighAvailabilityManager};
use crate::security::ANYONE;

/// First port probed when nothing else is configured.
pub const DEFAULT_PREFERRED_PORT: u16 = 8081;

/// Interface and port the server listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BindAddress {
    pub ip: IpAddr,
    pub port: u16,
    /// Security configuration was present when the address was chosen.
    pub secure: bool,
}

impl BindAddress {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl fmt::Display for BindAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.socket_addr())
    }
}

/// True when the store holds any key under `webconsole.security.`, whatever its value.
pub fn has_security_options(config: &ConfigStore) -> bool {
    config.has_prefix(keys::SECURITY_PREFIX)
}

/// Whether `port` can currently be bound on both loopback and the wildcard interface.
pub fn is_port_available(port: u16) -> bool {
    [Ipv4Addr::LOCALHOST, Ipv4Addr::UNSPECIFIED]
        .into_iter()
        .all(|ip| TcpListener::bind((ip, port)).is_ok())
}

/// Smallest available port at or above `preferred`.
pub fn next_available_port(preferred: u16) -> Result<u16, LaunchError> {
    (preferred..=u16::MAX)
        .find(|port| *port != 0 && is_port_available(*port))
        .ok_or(LaunchError::NoAvailablePort { from: preferred })
}

/// Decides where the server listens.
pub struct BindPolicy;

impl BindPolicy {
    /// Choose the bind address for this launch.
    ///
    /// Runs once, after security has been resolved: the loopback branch writes
    /// `webconsole.security.provider = anyone`. HA coordination is disabled before the
    /// port is chosen when `disable_high_availability` is set.
    pub fn resolve(
        config: &ConfigStore,
        high_availability: &dyn HighAvailabilityManager,
        disable_high_availability: bool,
        preferred_port: u16,
    ) -> Result<BindAddress, LaunchError> {
        let secure = has_security_options(config);
        let ip = if secure {
            debug!("Detected security configured, launching server on all network interfaces");
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            debug!("Detected no security configured, running on loopback; disabling authentication");
            config.put(keys::SECURITY_PROVIDER, ANYONE);
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        };

        if disable_high_availability {
            high_availability.disable();
        }

        let port = next_available_port(preferred_port)?;
        let addr = BindAddress { ip, port, secure };
        info!(addr = %addr, secure, preferred_port, "Bind address chosen");
        Ok(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::management::{HaState, LocalHighAvailability};

    #[test]
    fn test_presence_not_value_makes_secure() {
        let config = ConfigStore::new();
        assert!(!has_security_options(&config));
        config.put("webconsole.security.anything", "");
        assert!(has_security_options(&config));
        config.remove("webconsole.security.anything");
        config.put("webconsole.securityish", "x");
        assert!(!has_security_options(&config));
    }

    #[test]
    fn test_loopback_forces_anyone() {
        let config = ConfigStore::new();
        let ha = LocalHighAvailability::new();
        let addr = BindPolicy::resolve(&config, &ha, true, 38471).unwrap();
        assert_eq!(addr.ip, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert!(!addr.secure);
        assert!(addr.port >= 38471);
        assert_eq!(config.get_raw(keys::SECURITY_PROVIDER).as_deref(), Some(ANYONE));
        assert_eq!(ha.state(), HaState::Disabled);
    }

    #[test]
    fn test_secure_binds_wildcard_and_keeps_provider() {
        let config = ConfigStore::from_properties([(keys::SECURITY_PROVIDER, "explicit-users")]);
        let ha = LocalHighAvailability::new();
        let addr = BindPolicy::resolve(&config, &ha, false, 38491).unwrap();
        assert_eq!(addr.ip, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert!(addr.secure);
        assert_eq!(
            config.get_raw(keys::SECURITY_PROVIDER).as_deref(),
            Some("explicit-users")
        );
        assert_eq!(ha.state(), HaState::Master);
    }
}
