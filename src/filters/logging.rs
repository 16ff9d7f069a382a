use std::time::Duration;

use tracing::{info, warn};

use super::Filter;
use crate::server::{ApiRequest, HandlerResponse};

/// One structured log line per request.
pub struct LoggingFilter;

impl Filter for LoggingFilter {
    fn name(&self) -> &'static str {
        "logging"
    }

    fn after(&self, req: &mut ApiRequest, res: &mut HandlerResponse, latency: Duration) {
        let request_id = req.request_id.map(|id| id.to_string()).unwrap_or_default();
        let user = req
            .principal
            .as_ref()
            .map(|p| p.user.as_str())
            .unwrap_or("-");
        let latency_ms = latency.as_millis() as u64;
        if res.status >= 500 {
            warn!(
                method = %req.method,
                path = %req.path,
                status = res.status,
                latency_ms,
                request_id = %request_id,
                user = %user,
                "Request failed"
            );
        } else {
            info!(
                method = %req.method,
                path = %req.path,
                status = res.status,
                latency_ms,
                request_id = %request_id,
                user = %user,
                "Request completed"
            );
        }
    }
}
