use http::Method;
use serde_json::json;

use super::{ApiContext, RestApi};
use crate::management::{keys, HaState};
use crate::server::{ApiRequest, HandlerResponse};

const PREFIX: &str = "/v1/server";

/// Server status and control.
///
/// | Method | Path                        | Body                             |
/// |--------|-----------------------------|----------------------------------|
/// | GET    | `/v1/server/up`             | startup complete                 |
/// | GET    | `/v1/server/healthy`        | up and not failed                |
/// | GET    | `/v1/server/ha/state`       | HA state                         |
/// | GET    | `/v1/server/user`           | calling user                     |
/// | GET    | `/v1/server/config/{key}`   | configuration value              |
/// | POST   | `/v1/server/shutdown`       | requests shutdown, `204`         |
pub struct ServerResource;

impl ServerResource {
    fn get(req: &ApiRequest, ctx: &ApiContext, route: &str) -> HandlerResponse {
        let mgmt = &ctx.mgmt;
        match route {
            "/up" => HandlerResponse::json(200, json!(mgmt.is_startup_complete())),
            "/healthy" => {
                let healthy = mgmt.is_startup_complete()
                    && mgmt.high_availability().state() != HaState::Failed;
                HandlerResponse::json(200, json!(healthy))
            }
            "/ha/state" => {
                HandlerResponse::json(200, json!(mgmt.high_availability().state()))
            }
            "/user" => {
                let user = req
                    .entitlement
                    .as_ref()
                    .map(|e| e.user.clone())
                    .or_else(|| req.principal.as_ref().map(|p| p.user.clone()));
                HandlerResponse::json(200, json!(user))
            }
            _ => match route.strip_prefix("/config/") {
                Some(key) if key.starts_with(keys::SECURITY_PREFIX) => {
                    HandlerResponse::error(403, "Security configuration cannot be read")
                }
                Some(key) if !key.is_empty() => match mgmt.config().get_raw(key) {
                    Some(value) => HandlerResponse::json(200, json!(value)),
                    None => HandlerResponse::error(404, format!("No configuration for {key}")),
                },
                _ => not_found(req),
            },
        }
    }

    fn shutdown(ctx: &ApiContext) -> HandlerResponse {
        match &ctx.shutdown {
            Some(coordinator) => {
                coordinator.request_shutdown();
                HandlerResponse::empty(204)
            }
            None => HandlerResponse::error(503, "Shutdown is not available in this deployment"),
        }
    }
}

fn not_found(req: &ApiRequest) -> HandlerResponse {
    HandlerResponse::json(
        404,
        json!({ "error": "Not Found", "method": req.method.as_str(), "path": req.path }),
    )
}

impl RestApi for ServerResource {
    fn name(&self) -> &str {
        "server"
    }

    fn handle(&self, req: &ApiRequest, ctx: &ApiContext) -> Option<HandlerResponse> {
        let route = req.path.strip_prefix(PREFIX)?;
        if !route.is_empty() && !route.starts_with('/') {
            return None;
        }
        let res = if route == "/shutdown" {
            if req.method == Method::POST {
                Self::shutdown(ctx)
            } else {
                HandlerResponse::error(405, "Method Not Allowed")
            }
        } else if req.method == Method::GET || req.method == Method::HEAD {
            Self::get(req, ctx, route)
        } else {
            HandlerResponse::error(405, "Method Not Allowed")
        };
        Some(res)
    }
}
