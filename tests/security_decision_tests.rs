use restlaunch::management::{keys, ConfigStore};
use restlaunch::security::{DecisionOrigin, SecurityDecision, SecurityInstall, ANYONE};

#[test]
fn test_anyone_override_is_open_whatever_is_configured() {
    for configured in [None, Some("explicit-users"), Some(ANYONE)] {
        let d = SecurityDecision::decide(Some(ANYONE), configured);
        assert_eq!(d.install, SecurityInstall::Open);
        assert_eq!(d.provider.as_deref(), Some(ANYONE));
        assert_eq!(d.origin, DecisionOrigin::Override);
    }
}

#[test]
fn test_configured_anyone_is_open() {
    let d = SecurityDecision::decide(None, Some(ANYONE));
    assert_eq!(d.install, SecurityInstall::Open);
    assert_eq!(d.origin, DecisionOrigin::Configured);
}

#[test]
fn test_override_beats_configured_provider() {
    let d = SecurityDecision::decide(Some("explicit-users"), Some("blackhole"));
    assert_eq!(d.install, SecurityInstall::Descriptor);
    assert_eq!(d.provider.as_deref(), Some("explicit-users"));
    assert_eq!(d.origin, DecisionOrigin::Override);
    assert!(d.is_enforced());
}

#[test]
fn test_configured_provider_installs_descriptor() {
    let d = SecurityDecision::decide(None, Some("blackhole"));
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
fn test_only_override_is_persisted() {
    let store = ConfigStore::new();
    store.put(keys::SECURITY_PROVIDER, "blackhole");
    let configured = SecurityDecision::resolve(None, &store);
    configured.apply(&store);
    assert_eq!(store.get_raw(keys::SECURITY_PROVIDER).as_deref(), Some("blackhole"));

    let overridden = SecurityDecision::resolve(Some("explicit-users"), &store);
    overridden.apply(&store);
    assert_eq!(
        store.get_raw(keys::SECURITY_PROVIDER).as_deref(),
        Some("explicit-users")
    );

    let open = ConfigStore::new();
    SecurityDecision::resolve(Some(ANYONE), &open).apply(&open);
    assert!(!open.contains(keys::SECURITY_PROVIDER));
}
