use std::sync::Arc;
use std::time::Duration;

use http::Method;
use tracing::debug;

use super::Filter;
use crate::server::{ApiRequest, HandlerResponse};

/// Cookie and header name carrying the CSRF token.
pub const CSRF_TOKEN_NAME: &str = "X-CSRF-TOKEN";

/// Double-submit CSRF protection.
///
/// Responses to requests without the token cookie issue it. A mutating request that
/// presents the cookie must echo its value in the `X-CSRF-TOKEN` header. Requests
/// without the cookie (scripted clients) pass.
pub struct CsrfTokenFilter {
    token: Arc<str>,
    set_cookie: String,
}

impl CsrfTokenFilter {
    pub fn new(token: Arc<str>) -> Self {
        let set_cookie = format!("{CSRF_TOKEN_NAME}={token}; Path=/; SameSite=Strict");
        Self { token, set_cookie }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    fn is_mutating(method: &Method) -> bool {
        [Method::POST, Method::PUT, Method::DELETE, Method::PATCH].contains(method)
    }
}

impl Filter for CsrfTokenFilter {
    fn name(&self) -> &'static str {
        "csrf-token"
    }

    fn before(&self, req: &mut ApiRequest) -> Option<HandlerResponse> {
        if !Self::is_mutating(&req.method) {
            return None;
        }
        let cookie = req.get_cookie(CSRF_TOKEN_NAME)?;
        if req.get_header(CSRF_TOKEN_NAME) == Some(cookie) {
            return None;
        }
        debug!(method = %req.method, path = %req.path, "CSRF token missing or mismatched");
        Some(HandlerResponse::error(
            403,
            "Request must include the X-CSRF-TOKEN header matching its cookie",
        ))
    }

    fn after(&self, req: &mut ApiRequest, res: &mut HandlerResponse, _latency: Duration) {
        if req.get_cookie(CSRF_TOKEN_NAME).is_none() {
            res.set_header("Set-Cookie", self.set_cookie.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> CsrfTokenFilter {
        CsrfTokenFilter::new(Arc::from("tok"))
    }

    #[test]
    fn test_cookie_issued_when_absent() {
        let mut req = ApiRequest::new(Method::GET, "/v1/server/up");
        let mut res = HandlerResponse::empty(200);
        filter().after(&mut req, &mut res, Duration::ZERO);
        assert_eq!(
            res.get_header("Set-Cookie"),
            Some("X-CSRF-TOKEN=tok; Path=/; SameSite=Strict")
        );
    }

    #[test]
    fn test_mutation_with_cookie_requires_header() {
        let f = filter();
        let mut bad = ApiRequest::new(Method::POST, "/v1/server/shutdown")
            .with_header("Cookie", "X-CSRF-TOKEN=tok");
        assert_eq!(f.before(&mut bad).map(|r| r.status), Some(403));

        let mut good = ApiRequest::new(Method::POST, "/v1/server/shutdown")
            .with_header("Cookie", "X-CSRF-TOKEN=tok")
            .with_header("X-CSRF-TOKEN", "tok");
        assert!(f.before(&mut good).is_none());

        let mut scripted = ApiRequest::new(Method::POST, "/v1/server/shutdown");
        assert!(f.before(&mut scripted).is_none());
    }
}
