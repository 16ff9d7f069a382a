//! # Security Module
//!
//! Authentication for the REST API and the policy that decides whether it is enforced.
//!
//! ## Overview
//!
//! - [`SecurityProvider`] authenticates a single request and yields a [`Principal`]
//! - [`SecurityRegistry`] maps registered provider names to factories, so configuration
//!   refers to providers by name (`anyone`, `explicit-users`, `blackhole`, or anything an
//!   embedding application registers)
//! - [`SecurityDecision`] is the launch-time decision table: override, configured
//!   provider, or default
//! - [`LoginService`] is the `webconsole` realm installed into the server; it looks the
//!   provider up from the shared configuration store on each request
//!
//! ## Decision Table
//!
//! | override   | configured | result                                   |
//! |------------|------------|------------------------------------------|
//! | `anyone`   | any        | open, no security descriptor             |
//! | none       | `anyone`   | open, no security descriptor             |
//! | other      | any        | descriptor installed, override persisted |
//! | none       | other      | descriptor installed                     |
//! | none       | none       | no-op handler                            |
//!
//! ## Example
//!
//! ```rust
//! use restlaunch::management::ConfigStore;
//! use restlaunch::security::{SecurityDecision, SecurityInstall};
//!
//! let store = ConfigStore::new();
//! let decision = SecurityDecision::resolve(Some("explicit-users"), &store);
//! assert_eq!(decision.install, SecurityInstall::Descriptor);
//! decision.apply(&store);
//! assert_eq!(
//!     store.get_raw("webconsole.security.provider").as_deref(),
//!     Some("explicit-users")
//! );
//! ```

use base64::Engine;
use serde::Serialize;

use crate::server::{find_header, HeaderVec};

mod login;
mod policy;
mod providers;
mod registry;

pub use login::{LoginService, WEBCONSOLE_REALM};
pub use policy::{DecisionOrigin, SecurityDecision, SecurityInstall};
pub use providers::{AnyoneSecurityProvider, BlackholeSecurityProvider, ExplicitUsersSecurityProvider};
pub use registry::{ProviderFactory, SecurityRegistry};

/// Registered name of the provider that lets everyone in.
pub const ANYONE: &str = "anyone";
/// Registered name of the HTTP Basic provider backed by configured users.
pub const EXPLICIT_USERS: &str = "explicit-users";
/// Registered name of the provider that rejects everything.
pub const BLACKHOLE: &str = "blackhole";

/// Authenticated (or anonymous) caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user: String,
    pub anonymous: bool,
}

impl Principal {
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            user: name.into(),
            anonymous: false,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            user: "anonymous".to_string(),
            anonymous: true,
        }
    }
}

/// Request context for authentication.
pub struct SecurityRequest<'a> {
    pub headers: &'a HeaderVec,
    pub source: &'a str,
}

impl<'a> SecurityRequest<'a> {
    /// Get a header by name (case-insensitive)
    #[inline]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        find_header(self.headers, name)
    }

    /// Decoded HTTP Basic credentials, if present and well formed.
    pub fn basic_credentials(&self) -> Option<(String, String)> {
        let header = self.get_header("authorization")?;
        let (scheme, encoded) = header.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (user, pass) = decoded.split_once(':')?;
        Some((user.to_string(), pass.to_string()))
    }
}

/// Pluggable authentication backend.
pub trait SecurityProvider: Send + Sync {
    /// Registered name of this provider.
    fn name(&self) -> &str;

    /// Authenticate a request, returning the caller on success.
    fn authenticate(&self, req: &SecurityRequest) -> Option<Principal>;
}
