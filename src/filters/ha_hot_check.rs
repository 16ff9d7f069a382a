use std::sync::Arc;

use http::Method;
use tracing::debug;

use super::Filter;
use crate::management::{HaState, ManagementContext};
use crate::server::{ApiRequest, HandlerResponse};

/// Header letting a caller reach a non-master node anyway.
pub const ALLOW_NON_MASTER_HEADER: &str = "X-Allow-Non-Master-Access";

const SERVER_RESOURCE_PREFIX: &str = "/v1/server/";

/// Keeps API traffic away from nodes that are not the HA master.
///
/// Masters (and nodes with HA disabled) serve everything. A hot standby serves reads.
/// Server status endpoints stay reachable on every node so operators can see why a node
/// refuses traffic.
pub struct HaHotCheckFilter {
    mgmt: Arc<ManagementContext>,
}

impl HaHotCheckFilter {
    pub fn new(mgmt: Arc<ManagementContext>) -> Self {
        Self { mgmt }
    }

    fn is_exempt(req: &ApiRequest) -> bool {
        req.path.starts_with(SERVER_RESOURCE_PREFIX)
            || req
                .get_header(ALLOW_NON_MASTER_HEADER)
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }
}

impl Filter for HaHotCheckFilter {
    fn name(&self) -> &'static str {
        "ha-hot-check"
    }

    fn before(&self, req: &mut ApiRequest) -> Option<HandlerResponse> {
        let state = self.mgmt.high_availability().state();
        if state.is_master_like() || Self::is_exempt(req) {
            return None;
        }
        if state == HaState::HotStandby && (req.method == Method::GET || req.method == Method::HEAD) {
            return None;
        }
        debug!(ha_state = %state, method = %req.method, path = %req.path, "Request refused by HA check");
        if !self.mgmt.is_startup_complete() {
            return Some(HandlerResponse::error(
                503,
                "Server is not available until startup completes",
            ));
        }
        Some(HandlerResponse::error(
            403,
            format!("Request is not permitted while the server is in {state} state"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::management::{ConfigStore, LocalHighAvailability};

    fn filter(state: HaState, started: bool) -> HaHotCheckFilter {
        let mgmt = ManagementContext::new(
            ConfigStore::new(),
            Arc::new(LocalHighAvailability::with_state(state)),
        );
        if started {
            mgmt.note_startup_complete();
        }
        HaHotCheckFilter::new(Arc::new(mgmt))
    }

    #[test]
    fn test_master_and_disabled_pass() {
        for state in [HaState::Master, HaState::Disabled] {
            let mut req = ApiRequest::new(Method::POST, "/v1/applications");
            assert!(filter(state, true).before(&mut req).is_none());
        }
    }

    #[test]
    fn test_hot_standby_serves_reads_only() {
        let f = filter(HaState::HotStandby, true);
        let mut get = ApiRequest::new(Method::GET, "/v1/applications");
        assert!(f.before(&mut get).is_none());
        let mut post = ApiRequest::new(Method::POST, "/v1/applications");
        assert_eq!(f.before(&mut post).map(|r| r.status), Some(403));
    }

    #[test]
    fn test_standby_exemptions() {
        let f = filter(HaState::Standby, true);
        let mut server = ApiRequest::new(Method::GET, "/v1/server/ha/state");
        assert!(f.before(&mut server).is_none());
        let mut forced = ApiRequest::new(Method::POST, "/v1/applications")
            .with_header(ALLOW_NON_MASTER_HEADER, "true");
        assert!(f.before(&mut forced).is_none());
    }

    #[test]
    fn test_not_started_is_unavailable() {
        let f = filter(HaState::Initializing, false);
        let mut req = ApiRequest::new(Method::GET, "/v1/applications");
        assert_eq!(f.before(&mut req).map(|r| r.status), Some(503));
    }
}
