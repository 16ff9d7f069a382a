//! Shared management configuration store.
//!
//! A flat map of dotted keys to string values, shared between the launcher and the
//! authentication layer. Values written at launch (such as a security provider
//! override) live only in memory: a [`ConfigStore::reload`] discards them.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde_yaml::Value as YamlValue;

/// Well-known configuration keys.
pub mod keys {
    /// Every key under this prefix counts as security configuration.
    pub const SECURITY_PREFIX: &str = "webconsole.security.";
    /// Registered name of the security provider guarding the API.
    pub const SECURITY_PROVIDER: &str = "webconsole.security.provider";
    /// Comma separated list of users allowed by the explicit-users provider (`*` for any).
    pub const SECURITY_USERS: &str = "webconsole.security.users";
    /// Catalog the management platform loads at startup.
    pub const CATALOG_URL: &str = "catalog.url";
    /// Comma separated roots scanned when the scanning catalog is in use.
    pub const CATALOG_BASE_CLASSPATH: &str = "catalog.base-classpath";
    /// Feature flag for cross-origin support on the API.
    pub const FEATURE_CORS: &str = "features.cors.enabled";
    /// Allowed CORS origins.
    pub const CORS_ALLOWED_ORIGINS: &str = "cors.allowed-origins";
    /// Allowed CORS request headers.
    pub const CORS_ALLOWED_HEADERS: &str = "cors.allowed-headers";
    /// Allowed CORS methods.
    pub const CORS_ALLOWED_METHODS: &str = "cors.allowed-methods";

    /// Plain-text password key for `user`.
    pub fn user_password(user: &str) -> String {
        format!("webconsole.security.user.{user}.password")
    }

    /// Hex SHA-256 password hash key for `user`.
    pub fn user_sha256(user: &str) -> String {
        format!("webconsole.security.user.{user}.sha256")
    }

    /// Salt prepended to the password before hashing.
    pub fn user_salt(user: &str) -> String {
        format!("webconsole.security.user.{user}.salt")
    }
}

/// Thread-safe, cheaply cloneable key/value store.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    inner: Arc<RwLock<BTreeMap<String, String>>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from key/value pairs.
    pub fn from_properties<I, K, V>(props: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = props
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    /// Load a YAML properties file, flattening nested maps into dotted keys.
    ///
    /// ```yaml
    /// webconsole:
    ///   security:
    ///     provider: explicit-users
    ///     users: [admin, ops]
    /// ```
    ///
    /// yields `webconsole.security.provider = explicit-users` and
    /// `webconsole.security.users = admin,ops`.
    pub fn load_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read properties file {}", path.display()))?;
        let props = parse_yaml_properties(&content)
            .with_context(|| format!("failed to parse properties file {}", path.display()))?;
        Ok(Self::from_properties(props))
    }

    /// Raw value for `key`, if set.
    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.inner.read().get(key).cloned()
    }

    /// Store `value` under `key`, returning the previous value.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.inner.write().insert(key.into(), value.into())
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.inner.write().remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().contains_key(key)
    }

    /// True if any key starts with `prefix`.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.inner
            .read()
            .range(prefix.to_string()..)
            .next()
            .is_some_and(|(k, _)| k.starts_with(prefix))
    }

    /// Boolean value; anything other than `true`/`false` (case-insensitive) yields `default`.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get_raw(key).map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "true" => true,
            Some(v) if v == "false" => false,
            _ => default,
        }
    }

    /// Comma separated list, trimmed, with empty entries dropped.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.get_raw(key)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replace the whole contents, as a properties reload does.
    pub fn reload<I, K, V>(&self, props: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = props
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        *self.inner.write() = map;
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.inner.read().clone()
    }
}

fn parse_yaml_properties(content: &str) -> Result<BTreeMap<String, String>> {
    let root: YamlValue = serde_yaml::from_str(content)?;
    let mut out = BTreeMap::new();
    match root {
        YamlValue::Null => {}
        YamlValue::Mapping(_) => flatten("", &root, &mut out),
        _ => anyhow::bail!("properties file must contain a mapping at the top level"),
    }
    Ok(out)
}

fn flatten(prefix: &str, value: &YamlValue, out: &mut BTreeMap<String, String>) {
    match value {
        YamlValue::Mapping(map) => {
            for (k, v) in map {
                let Some(key) = scalar_to_string(k) else {
                    continue;
                };
                let full = if prefix.is_empty() {
                    key
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&full, v, out);
            }
        }
        YamlValue::Sequence(items) => {
            let joined = items
                .iter()
                .filter_map(scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.insert(prefix.to_string(), joined);
        }
        YamlValue::Tagged(tagged) => flatten(prefix, &tagged.value, out),
        other => {
            if let Some(s) = scalar_to_string(other) {
                out.insert(prefix.to_string(), s);
            }
        }
    }
}

fn scalar_to_string(value: &YamlValue) -> Option<String> {
    match value {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Bool(b) => Some(b.to_string()),
        YamlValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_detection() {
        let store = ConfigStore::from_properties([("catalog.url", "x")]);
        assert!(!store.has_prefix(keys::SECURITY_PREFIX));
        store.put(keys::SECURITY_USERS, "admin");
        assert!(store.has_prefix(keys::SECURITY_PREFIX));
    }

    #[test]
    fn test_reload_discards_runtime_writes() {
        let store = ConfigStore::new();
        store.put(keys::SECURITY_PROVIDER, "explicit-users");
        store.reload([("catalog.url", "classpath://x")]);
        assert_eq!(store.get_raw(keys::SECURITY_PROVIDER), None);
        assert_eq!(store.get_raw("catalog.url").as_deref(), Some("classpath://x"));
    }

    #[test]
    fn test_clones_share_state() {
        let a = ConfigStore::new();
        let b = a.clone();
        a.put("k", "v");
        assert_eq!(b.get_raw("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_flatten_yaml() {
        let props = parse_yaml_properties(
            "webconsole:\n  security:\n    provider: explicit-users\n    users: [admin, ops]\nfeatures:\n  cors:\n    enabled: true\n",
        )
        .unwrap();
        assert_eq!(props["webconsole.security.provider"], "explicit-users");
        assert_eq!(props["webconsole.security.users"], "admin,ops");
        assert_eq!(props["features.cors.enabled"], "true");
    }

    #[test]
    fn test_get_list_and_bool() {
        let store = ConfigStore::from_properties([("l", " a, ,b "), ("t", "TRUE"), ("j", "junk")]);
        assert_eq!(store.get_list("l"), vec!["a".to_string(), "b".to_string()]);
        assert!(store.get_bool("t", false));
        assert!(store.get_bool("j", true));
        assert!(!store.get_bool("missing", false));
    }
}
