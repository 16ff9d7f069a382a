use std::collections::HashMap;

use sha2::{Digest, Sha256};

use super::{Principal, SecurityProvider, SecurityRequest, ANYONE, BLACKHOLE, EXPLICIT_USERS};
use crate::management::{keys, ConfigStore};

/// Lets every request in as an anonymous caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnyoneSecurityProvider;

impl SecurityProvider for AnyoneSecurityProvider {
    fn name(&self) -> &str {
        ANYONE
    }

    fn authenticate(&self, req: &SecurityRequest) -> Option<Principal> {
        // Basic credentials, when sent, still name the caller.
        Some(
            req.basic_credentials()
                .map(|(user, _)| Principal::user(user))
                .unwrap_or_else(Principal::anonymous),
        )
    }
}

/// Rejects every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlackholeSecurityProvider;

impl SecurityProvider for BlackholeSecurityProvider {
    fn name(&self) -> &str {
        BLACKHOLE
    }

    fn authenticate(&self, _req: &SecurityRequest) -> Option<Principal> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Credential {
    Plain(String),
    Sha256 { hex: String, salt: String },
}

impl Credential {
    fn matches(&self, password: &str) -> bool {
        match self {
            Self::Plain(expected) => constant_time_eq(expected.as_bytes(), password.as_bytes()),
            Self::Sha256 { hex, salt } => constant_time_eq(
                sha256_hex(&format!("{salt}{password}")).as_bytes(),
                hex.to_ascii_lowercase().as_bytes(),
            ),
        }
    }
}

/// Byte comparison whose running time depends only on the lengths.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let mut diff = u64::try_from(a.len() ^ b.len()).unwrap_or(u64::MAX);
    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= u64::from(x ^ y);
    }
    diff == 0
}

/// Hex-encoded SHA-256 of `input`.
pub(crate) fn sha256_hex(input: &str) -> String {
    Sha256::digest(input.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// HTTP Basic authentication against users listed in configuration.
///
/// `webconsole.security.users` lists the allowed users; `*` or an absent key allows any
/// user with a credential entry. Each user needs either
/// `webconsole.security.user.<name>.password` or `...sha256` (optionally with `...salt`).
#[derive(Debug, Clone)]
pub struct ExplicitUsersSecurityProvider {
    allow_any_user: bool,
    allowed: Vec<String>,
    credentials: HashMap<String, Credential>,
}

impl ExplicitUsersSecurityProvider {
    pub fn from_config(config: &ConfigStore) -> Self {
        let listed = config.get_list(keys::SECURITY_USERS);
        let allow_any_user = listed.is_empty() || listed.iter().any(|u| u == "*");
        let allowed: Vec<String> = listed.into_iter().filter(|u| u != "*").collect();

        let mut credentials = HashMap::new();
        for key in config.snapshot().into_keys() {
            let Some(user) = key
                .strip_prefix("webconsole.security.user.")
                .and_then(|rest| rest.rsplit_once('.'))
                .map(|(user, _)| user.to_string())
            else {
                continue;
            };
            if credentials.contains_key(&user) {
                continue;
            }
            if let Some(sha) = config.get_raw(&keys::user_sha256(&user)) {
                let salt = config.get_raw(&keys::user_salt(&user)).unwrap_or_default();
                credentials.insert(user, Credential::Sha256 { hex: sha, salt });
            } else if let Some(password) = config.get_raw(&keys::user_password(&user)) {
                credentials.insert(user, Credential::Plain(password));
            }
        }

        Self {
            allow_any_user,
            allowed,
            credentials,
        }
    }

    fn is_allowed(&self, user: &str) -> bool {
        self.allow_any_user || self.allowed.iter().any(|u| u == user)
    }
}

impl SecurityProvider for ExplicitUsersSecurityProvider {
    fn name(&self) -> &str {
        EXPLICIT_USERS
    }

    fn authenticate(&self, req: &SecurityRequest) -> Option<Principal> {
        let (user, password) = req.basic_credentials()?;
        if !self.is_allowed(&user) {
            return None;
        }
        let credential = self.credentials.get(&user)?;
        credential.matches(&password).then(|| Principal::user(user))
    }
}
