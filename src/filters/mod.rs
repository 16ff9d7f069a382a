//! # Filters Module
//!
//! Request filters wrapped around the REST API and the static content.
//!
//! Two lists are kept apart:
//!
//! - the **servlet filters** wrap every request the server handles (default
//!   `[RequestTagging, Logging]`, replaceable by the caller)
//! - the **provider chain** wraps only API requests (`/v1/...`) and always carries the
//!   platform baseline, with CORS appended when the feature is enabled
//!
//! Each list is an ordered [`FilterChain`] of [`FilterKind`] descriptors. Insertion order
//! is execution order: `before` hooks run front to back, `after` hooks back to front.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::management::ManagementContext;
use crate::server::{ApiRequest, HandlerResponse};

mod chain;
mod cors;
mod csrf;
mod entitlement;
mod ha_hot_check;
mod logging;
mod no_cache;
mod tagging;

pub use chain::{default_servlet_filters, FilterChain, FilterChainBuilder};
pub use cors::CorsFilter;
pub use csrf::{CsrfTokenFilter, CSRF_TOKEN_NAME};
pub use entitlement::EntitlementContextFilter;
pub use ha_hot_check::{HaHotCheckFilter, ALLOW_NON_MASTER_HEADER};
pub use logging::LoggingFilter;
pub use no_cache::NoCacheFilter;
pub use tagging::RequestTaggingFilter;

/// A request filter.
///
/// `before` may short-circuit with a response; the remaining filters and the wrapped
/// handler are then skipped, but `after` still runs for every filter already entered.
pub trait Filter: Send + Sync {
    fn name(&self) -> &'static str;

    fn before(&self, _req: &mut ApiRequest) -> Option<HandlerResponse> {
        None
    }

    fn after(&self, _req: &mut ApiRequest, _res: &mut HandlerResponse, _latency: Duration) {}
}

/// Filter descriptor as it appears in launcher configuration and `webapp.yaml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterKind {
    RequestTagging,
    Logging,
    NoCache,
    HaHotCheck,
    EntitlementContext,
    CsrfToken,
    Cors,
}

impl FilterKind {
    pub const ALL: [FilterKind; 7] = [
        Self::RequestTagging,
        Self::Logging,
        Self::NoCache,
        Self::HaHotCheck,
        Self::EntitlementContext,
        Self::CsrfToken,
        Self::Cors,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RequestTagging => "request-tagging",
            Self::Logging => "logging",
            Self::NoCache => "no-cache",
            Self::HaHotCheck => "ha-hot-check",
            Self::EntitlementContext => "entitlement-context",
            Self::CsrfToken => "csrf-token",
            Self::Cors => "cors",
        }
    }

    /// Build the filter this descriptor names.
    pub fn instantiate(&self, ctx: &FilterContext) -> Arc<dyn Filter> {
        match self {
            Self::RequestTagging => Arc::new(RequestTaggingFilter),
            Self::Logging => Arc::new(LoggingFilter),
            Self::NoCache => Arc::new(NoCacheFilter),
            Self::HaHotCheck => Arc::new(HaHotCheckFilter::new(Arc::clone(&ctx.mgmt))),
            Self::EntitlementContext => Arc::new(EntitlementContextFilter),
            Self::CsrfToken => Arc::new(CsrfTokenFilter::new(Arc::clone(&ctx.csrf_token))),
            Self::Cors => Arc::new(CorsFilter::from_config(ctx.mgmt.config())),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown filter name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter '{0}'")]
pub struct UnknownFilter(pub String);

impl FromStr for FilterKind {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownFilter(wanted.to_string()))
    }
}

/// Shared state filters are built from.
#[derive(Debug, Clone)]
pub struct FilterContext {
    pub mgmt: Arc<ManagementContext>,
    /// CSRF token issued by this server.
    pub csrf_token: Arc<str>,
}

impl FilterContext {
    /// Context with a freshly generated CSRF token.
    pub fn new(mgmt: Arc<ManagementContext>) -> Self {
        Self {
            mgmt,
            csrf_token: Arc::from(Ulid::new().to_string()),
        }
    }
}

/// Per-request view of who is calling, for API resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitlementContext {
    pub user: String,
    pub source_ip: String,
    pub request_uri: String,
    pub request_id: Option<String>,
}

/// Instantiated filters, ready to wrap a handler.
#[derive(Clone, Default)]
pub struct FilterStack {
    filters: Vec<Arc<dyn Filter>>,
}

impl FilterStack {
    pub fn new(filters: Vec<Arc<dyn Filter>>) -> Self {
        Self { filters }
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Run `inner` inside the filters.
    pub fn run<F>(&self, req: &mut ApiRequest, inner: F) -> HandlerResponse
    where
        F: FnOnce(&mut ApiRequest) -> HandlerResponse,
    {
        let start = Instant::now();
        let mut entered = 0;
        let mut short_circuit = None;
        for filter in &self.filters {
            entered += 1;
            if let Some(res) = filter.before(req) {
                short_circuit = Some(res);
                break;
            }
        }

        let mut res = match short_circuit {
            Some(res) => res,
            None => inner(req),
        };

        let latency = start.elapsed();
        for filter in self.filters[..entered].iter().rev() {
            filter.after(req, &mut res, latency);
        }
        res
    }
}

impl fmt::Debug for FilterStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use parking_lot::Mutex;

    struct Recording {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        block: bool,
    }

    impl Filter for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        fn before(&self, _req: &mut ApiRequest) -> Option<HandlerResponse> {
            self.log.lock().push(format!("before:{}", self.name));
            self.block.then(|| HandlerResponse::empty(403))
        }

        fn after(&self, _req: &mut ApiRequest, _res: &mut HandlerResponse, _latency: Duration) {
            self.log.lock().push(format!("after:{}", self.name));
        }
    }

    fn recording(name: &'static str, log: &Arc<Mutex<Vec<String>>>, block: bool) -> Arc<dyn Filter> {
        Arc::new(Recording {
            name,
            log: Arc::clone(log),
            block,
        })
    }

    #[test]
    fn test_filters_nest_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let stack = FilterStack::new(vec![recording("a", &log, false), recording("b", &log, false)]);
        let mut req = ApiRequest::new(Method::GET, "/v1/x");
        let res = stack.run(&mut req, |_| {
            HandlerResponse::empty(200)
        });
        assert_eq!(res.status, 200);
        assert_eq!(
            *log.lock(),
            vec!["before:a", "before:b", "after:b", "after:a"]
        );
    }

    #[test]
    fn test_short_circuit_skips_inner_and_later_filters() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let stack = FilterStack::new(vec![
            recording("a", &log, true),
            recording("b", &log, false),
        ]);
        let mut req = ApiRequest::new(Method::GET, "/v1/x");
        let mut called = false;
        let res = stack.run(&mut req, |_| {
            called = true;
            HandlerResponse::empty(200)
        });
        assert_eq!(res.status, 403);
        assert!(!called);
        assert_eq!(*log.lock(), vec!["before:a", "after:a"]);
    }

    #[test]
    fn test_filter_kind_names() {
        for kind in FilterKind::ALL {
            assert_eq!(kind.as_str().parse::<FilterKind>(), Ok(kind));
        }
        assert_eq!(
            "Request-Tagging".parse::<FilterKind>(),
            Ok(FilterKind::RequestTagging)
        );
        assert!("gzip".parse::<FilterKind>().is_err());
        let yaml: Vec<FilterKind> = serde_yaml::from_str("[csrf-token, ha-hot-check]").unwrap();
        assert_eq!(yaml, vec![FilterKind::CsrfToken, FilterKind::HaHotCheck]);
    }
}
