use std::time::Duration;

use http::Method;

use super::Filter;
use crate::server::{ApiRequest, HandlerResponse};

/// Marks `GET` responses as uncacheable unless the resource set its own policy.
pub struct NoCacheFilter;

impl Filter for NoCacheFilter {
    fn name(&self) -> &'static str {
        "no-cache"
    }

    fn after(&self, req: &mut ApiRequest, res: &mut HandlerResponse, _latency: Duration) {
        if req.method != Method::GET || res.has_header("Cache-Control") {
            return;
        }
        res.set_header("Cache-Control", "no-cache, no-store");
        res.set_header("Pragma", "no-cache");
        res.set_header("Expires", "0");
    }
}
