use std::sync::Arc;

use http::Method;
use restlaunch::filters::{FilterChainBuilder, FilterContext, FilterKind};
use restlaunch::management::{keys, ConfigStore, ManagementContext};
use restlaunch::server::{ApiRequest, HandlerResponse};

#[test]
fn test_provider_chain_baseline_order() {
    let chain = FilterChainBuilder::provider_chain(&ConfigStore::new());
    assert_eq!(
        chain.kinds(),
        &[
            FilterKind::RequestTagging,
            FilterKind::NoCache,
            FilterKind::HaHotCheck,
            FilterKind::EntitlementContext,
            FilterKind::CsrfToken,
        ]
    );
}

#[test]
fn test_cors_feature_appends_cors_last() {
    let config = ConfigStore::new();
    config.put(keys::FEATURE_CORS, "true");
    let chain = FilterChainBuilder::provider_chain(&config);
    assert_eq!(chain.len(), 6);
    assert_eq!(chain.kinds().last(), Some(&FilterKind::Cors));
}

#[test]
fn test_servlet_override_does_not_touch_provider_chain() {
    let servlet = FilterChainBuilder::servlet_chain(Some(&[FilterKind::Logging]));
    assert_eq!(servlet.kinds(), &[FilterKind::Logging]);
    let empty = FilterChainBuilder::servlet_chain(Some(&[]));
    assert!(empty.is_empty());
    assert_eq!(FilterChainBuilder::provider_chain(&ConfigStore::new()).len(), 5);
}

#[test]
fn test_built_stack_tags_and_disables_caching() {
    let mgmt = Arc::new(ManagementContext::local());
    let ctx = FilterContext::new(mgmt);
    let stack = FilterChainBuilder::provider_chain(&ConfigStore::new()).build(&ctx);
    assert_eq!(stack.len(), 5);

    let mut req = ApiRequest::new(Method::GET, "/v1/server/up");
    let res = stack.run(&mut req, |req| {
        assert!(req.request_id.is_some());
        HandlerResponse::json(200, serde_json::json!(true))
    });
    assert_eq!(res.status, 200);
    assert!(res.has_header("cache-control"));
}
