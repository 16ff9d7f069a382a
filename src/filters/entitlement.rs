use std::time::Duration;

use super::{EntitlementContext, Filter};
use crate::server::{ApiRequest, HandlerResponse};

/// Publishes the caller's entitlement context to resources for the duration of a request.
pub struct EntitlementContextFilter;

impl Filter for EntitlementContextFilter {
    fn name(&self) -> &'static str {
        "entitlement-context"
    }

    fn before(&self, req: &mut ApiRequest) -> Option<HandlerResponse> {
        let user = req
            .principal
            .as_ref()
            .map(|p| p.user.clone())
            .unwrap_or_else(|| "anonymous".to_string());
        let request_uri = if req.query.is_empty() {
            req.path.clone()
        } else {
            format!("{}?{}", req.path, req.query)
        };
        req.entitlement = Some(EntitlementContext {
            user,
            source_ip: req.source_address().to_string(),
            request_uri,
            request_id: req.request_id.map(|id| id.to_string()),
        });
        None
    }

    fn after(&self, req: &mut ApiRequest, _res: &mut HandlerResponse, _latency: Duration) {
        req.entitlement = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::Principal;
    use http::Method;

    #[test]
    fn test_context_set_and_cleared() {
        let mut req = ApiRequest::new(Method::GET, "/v1/server/user?x=1")
            .with_header("X-Forwarded-For", "10.1.2.3");
        req.principal = Some(Principal::user("admin"));

        EntitlementContextFilter.before(&mut req);
        let ctx = req.entitlement.clone().unwrap();
        assert_eq!(ctx.user, "admin");
        assert_eq!(ctx.source_ip, "10.1.2.3");
        assert_eq!(ctx.request_uri, "/v1/server/user?x=1");

        let mut res = HandlerResponse::empty(200);
        EntitlementContextFilter.after(&mut req, &mut res, Duration::ZERO);
        assert!(req.entitlement.is_none());
    }
}
