use serde::Serialize;
use tracing::debug;

use super::ANYONE;
use crate::management::{keys, ConfigStore};

/// What the launcher installs in front of the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SecurityInstall {
    /// Explicitly unauthenticated deployment; no security descriptor.
    Open,
    /// Security descriptor installed; the login service enforces the provider.
    Descriptor,
    /// No-op security handler: open, but without the explicit open marker.
    NoOp,
}

/// Where the effective provider came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionOrigin {
    Override,
    Configured,
    Default,
}

/// Outcome of the security decision table for one launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityDecision {
    pub install: SecurityInstall,
    /// Effective provider name; `None` for the no-op default.
    pub provider: Option<String>,
    pub origin: DecisionOrigin,
}

impl SecurityDecision {
    /// Evaluate the decision table. Pure: no store access.
    pub fn decide(override_provider: Option<&str>, configured: Option<&str>) -> Self {
        let anyone_override = override_provider == Some(ANYONE)
            || (override_provider.is_none() && configured == Some(ANYONE));

        if anyone_override {
            return Self {
                install: SecurityInstall::Open,
                provider: Some(ANYONE.to_string()),
                origin: if override_provider.is_some() {
                    DecisionOrigin::Override
                } else {
                    DecisionOrigin::Configured
                },
            };
        }

        match (override_provider, configured) {
            (Some(name), _) => Self {
                install: SecurityInstall::Descriptor,
                provider: Some(name.to_string()),
                origin: DecisionOrigin::Override,
            },
            (None, Some(name)) => Self {
                install: SecurityInstall::Descriptor,
                provider: Some(name.to_string()),
                origin: DecisionOrigin::Configured,
            },
            (None, None) => Self {
                install: SecurityInstall::NoOp,
                provider: None,
                origin: DecisionOrigin::Default,
            },
        }
    }

    /// Read the configured provider from `config` and evaluate the table.
    pub fn resolve(override_provider: Option<&str>, config: &ConfigStore) -> Self {
        let configured = config.get_raw(keys::SECURITY_PROVIDER);
        let decision = Self::decide(override_provider, configured.as_deref());
        debug!(
            override_provider = ?override_provider,
            configured = ?configured,
            install = ?decision.install,
            origin = ?decision.origin,
            "Security decision resolved"
        );
        decision
    }

    /// Persist an installed override so the authentication layer sees it.
    ///
    /// Only a descriptor installed from an override writes anything. The write is
    /// in-memory and is lost on a configuration reload.
    pub fn apply(&self, config: &ConfigStore) {
        if self.install != SecurityInstall::Descriptor || self.origin != DecisionOrigin::Override {
            return;
        }
        if let Some(name) = &self.provider {
            config.put(keys::SECURITY_PROVIDER, name.clone());
        }
    }

    /// True when the login service must authenticate every request.
    pub fn is_enforced(&self) -> bool {
        self.install == SecurityInstall::Descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anyone_override_wins_over_configuration() {
        let d = SecurityDecision::decide(Some(ANYONE), Some("explicit-users"));
        assert_eq!(d.install, SecurityInstall::Open);
        assert_eq!(d.origin, DecisionOrigin::Override);
    }

    #[test]
    fn test_configured_anyone_is_open() {
        let d = SecurityDecision::decide(None, Some(ANYONE));
        assert_eq!(d.install, SecurityInstall::Open);
        assert_eq!(d.origin, DecisionOrigin::Configured);
    }

    #[test]
    fn test_override_beats_configured_anyone() {
        let d = SecurityDecision::decide(Some("explicit-users"), Some(ANYONE));
        assert_eq!(d.install, SecurityInstall::Descriptor);
        assert_eq!(d.provider.as_deref(), Some("explicit-users"));
        assert_eq!(d.origin, DecisionOrigin::Override);
    }

    #[test]
    fn test_configured_provider_installs_descriptor() {
        let d = SecurityDecision::decide(None, Some("explicit-users"));
        assert_eq!(d.install, SecurityInstall::Descriptor);
        assert_eq!(d.origin, DecisionOrigin::Configured);
    }

    #[test]
    fn test_nothing_configured_is_noop() {
        let d = SecurityDecision::decide(None, None);
        assert_eq!(d.install, SecurityInstall::NoOp);
        assert_eq!(d.provider, None);
        assert!(!d.is_enforced());
    }

    #[test]
    fn test_apply_only_writes_overrides() {
        let store = ConfigStore::new();
        SecurityDecision::decide(None, Some("explicit-users")).apply(&store);
        assert!(store.snapshot().is_empty());
        SecurityDecision::decide(Some(ANYONE), None).apply(&store);
        assert!(store.snapshot().is_empty());
        SecurityDecision::decide(Some("blackhole"), None).apply(&store);
        assert_eq!(store.get_raw(keys::SECURITY_PROVIDER).as_deref(), Some("blackhole"));
    }
}
