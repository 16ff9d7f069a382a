use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use super::{Principal, SecurityProvider, SecurityRegistry, SecurityRequest, ANYONE};
use crate::management::{keys, ConfigStore};
use crate::server::{ApiRequest, HandlerResponse};

/// Realm (and login module name) of the API login service.
pub const WEBCONSOLE_REALM: &str = "webconsole";

/// Login service installed into the server.
///
/// When enforcing, the provider named in the shared configuration store is resolved on
/// each request (and cached until the name changes), so values written during launch are
/// what the authentication layer sees.
pub struct LoginService {
    realm: &'static str,
    enforce: bool,
    registry: Arc<SecurityRegistry>,
    config: ConfigStore,
    cached: RwLock<Option<(String, Arc<dyn SecurityProvider>)>>,
}

impl LoginService {
    pub fn new(registry: Arc<SecurityRegistry>, config: ConfigStore, enforce: bool) -> Self {
        info!(realm = WEBCONSOLE_REALM, enforce, "Login service installed");
        Self {
            realm: WEBCONSOLE_REALM,
            enforce,
            registry,
            config,
            cached: RwLock::new(None),
        }
    }

    pub fn realm(&self) -> &str {
        self.realm
    }

    pub fn is_enforcing(&self) -> bool {
        self.enforce
    }

    fn provider(&self) -> Arc<dyn SecurityProvider> {
        let name = self
            .config
            .get_raw(keys::SECURITY_PROVIDER)
            .unwrap_or_else(|| ANYONE.to_string());
        if let Some((cached_name, provider)) = self.cached.read().as_ref() {
            if *cached_name == name {
                return Arc::clone(provider);
            }
        }
        let provider = self.registry.create(&name, &self.config);
        debug!(provider = %name, "Security provider instantiated");
        *self.cached.write() = Some((name, Arc::clone(&provider)));
        provider
    }

    /// Authenticate `req`, returning a 401 challenge on failure.
    pub fn login(&self, req: &ApiRequest) -> Result<Principal, HandlerResponse> {
        if !self.enforce {
            return Ok(Principal::anonymous());
        }
        let provider = self.provider();
        let sec_req = SecurityRequest {
            headers: &req.headers,
            source: req.source_address(),
        };
        match provider.authenticate(&sec_req) {
            Some(principal) => Ok(principal),
            None => {
                debug!(
                    provider = %provider.name(),
                    path = %req.path,
                    "Authentication failed"
                );
                let mut res = HandlerResponse::error(401, "Unauthorized");
                res.set_header(
                    "WWW-Authenticate",
                    format!("Basic realm=\"{}\"", self.realm),
                );
                Err(res)
            }
        }
    }
}

impl std::fmt::Debug for LoginService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginService")
            .field("realm", &self.realm)
            .field("enforce", &self.enforce)
            .finish()
    }
}
