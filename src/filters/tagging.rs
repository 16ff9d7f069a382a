use ulid::Ulid;

use super::Filter;
use crate::server::{ApiRequest, HandlerResponse};

/// Assigns each request a ULID, once.
pub struct RequestTaggingFilter;

impl Filter for RequestTaggingFilter {
    fn name(&self) -> &'static str {
        "request-tagging"
    }

    fn before(&self, req: &mut ApiRequest) -> Option<HandlerResponse> {
        // Both lists may contain this filter; the outer tag wins.
        if req.request_id.is_none() {
            req.request_id = Some(Ulid::new());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_tag_is_stable_across_passes() {
        let mut req = ApiRequest::new(Method::GET, "/");
        RequestTaggingFilter.before(&mut req);
        let first = req.request_id;
        assert!(first.is_some());
        RequestTaggingFilter.before(&mut req);
        assert_eq!(req.request_id, first);
    }
}
