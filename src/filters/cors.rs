use std::time::Duration;

use http::Method;

use super::Filter;
use crate::management::{keys, ConfigStore};
use crate::server::{ApiRequest, HandlerResponse};

/// Cross-origin support for the API.
///
/// Answers preflight `OPTIONS` requests directly and adds the allow headers to every
/// response.
pub struct CorsFilter {
    allowed_origins: Vec<String>,
    allowed_headers: Vec<String>,
    allowed_methods: Vec<Method>,
}

impl CorsFilter {
    pub fn new(
        allowed_origins: Vec<String>,
        allowed_headers: Vec<String>,
        allowed_methods: Vec<Method>,
    ) -> Self {
        Self {
            allowed_origins,
            allowed_headers,
            allowed_methods,
        }
    }

    /// Read `cors.allowed-*` from the store, defaulting each list that is unset.
    pub fn from_config(config: &ConfigStore) -> Self {
        let defaults = Self::default();
        let origins = config.get_list(keys::CORS_ALLOWED_ORIGINS);
        let headers = config.get_list(keys::CORS_ALLOWED_HEADERS);
        let methods: Vec<Method> = config
            .get_list(keys::CORS_ALLOWED_METHODS)
            .iter()
            .filter_map(|m| Method::from_bytes(m.to_ascii_uppercase().as_bytes()).ok())
            .collect();
        Self {
            allowed_origins: if origins.is_empty() { defaults.allowed_origins } else { origins },
            allowed_headers: if headers.is_empty() { defaults.allowed_headers } else { headers },
            allowed_methods: if methods.is_empty() { defaults.allowed_methods } else { methods },
        }
    }
}

impl CorsFilter {
    fn allowed_origin(&self, origin: Option<&str>) -> Option<String> {
        let origin = origin?.trim();
        self.allowed_origins
            .iter()
            .find(|o| o.eq_ignore_ascii_case(origin))
            .cloned()
    }
}

impl Default for CorsFilter {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".into()],
            allowed_headers: vec!["Content-Type".into(), "Authorization".into()],
            allowed_methods: vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ],
        }
    }
}

impl Filter for CorsFilter {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn before(&self, req: &mut ApiRequest) -> Option<HandlerResponse> {
        (req.method == Method::OPTIONS).then(|| HandlerResponse::empty(204))
    }

    fn after(&self, req: &mut ApiRequest, res: &mut HandlerResponse, _latency: Duration) {
        if self.allowed_origins.iter().any(|o| o == "*") {
            res.set_header("Access-Control-Allow-Origin", "*");
        } else {
            // One origin per response: echo the caller's when it is allowed.
            res.set_header("Vary", "Origin");
            match self.allowed_origin(req.get_header("origin")) {
                Some(origin) => res.set_header("Access-Control-Allow-Origin", origin),
                None => return,
            }
        }
        res.set_header("Access-Control-Allow-Headers", self.allowed_headers.join(", "));
        let methods = self
            .allowed_methods
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        res.set_header("Access-Control-Allow-Methods", methods);
    }
}
