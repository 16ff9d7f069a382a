use std::io;
use std::sync::Arc;

use http::Method;
use may_minihttp::{HttpService, Request, Response};
use serde_json::json;
use tracing::{debug, warn};

use super::request::{parse_request, ApiRequest};
use super::response::{write_response, HandlerResponse};
use crate::api::{ApiContext, RestApi, API_PREFIX};
use crate::filters::FilterStack;
use crate::security::LoginService;
use crate::static_files::StaticFiles;

/// Everything the service needs, assembled by the launcher.
pub struct ServiceParts {
    pub login: LoginService,
    /// Wraps every request.
    pub servlet_filters: FilterStack,
    /// Wraps API requests, inside the servlet filters.
    pub provider_filters: FilterStack,
    pub resources: Vec<Arc<dyn RestApi>>,
    pub api_context: ApiContext,
    pub static_files: Option<StaticFiles>,
    /// Mount point of the whole application, `/` by default.
    pub context_path: String,
    /// When false only static content is served.
    pub serve_api: bool,
}

/// The `HttpService` run by the engine: login, filters, API resources and static content.
#[derive(Clone)]
pub struct LaunchService {
    inner: Arc<ServiceParts>,
}

impl LaunchService {
    pub fn new(mut parts: ServiceParts) -> Self {
        parts.context_path = normalize_context_path(&parts.context_path);
        Self {
            inner: Arc::new(parts),
        }
    }

    pub fn context_path(&self) -> &str {
        &self.inner.context_path
    }

    /// Handle a parsed request end to end.
    pub fn handle(&self, mut req: ApiRequest) -> HandlerResponse {
        let parts = &self.inner;
        match strip_context_path(&parts.context_path, &req.path) {
            Some(inner) => req.path = inner,
            None => return not_found(&req),
        }

        match parts.login.login(&req) {
            Ok(principal) => req.principal = Some(principal),
            Err(challenge) => return challenge,
        }

        parts
            .servlet_filters
            .run(&mut req, |req| self.route(req))
    }

    fn route(&self, req: &mut ApiRequest) -> HandlerResponse {
        let parts = &self.inner;
        if parts.serve_api && req.path.starts_with(API_PREFIX) {
            return parts
                .provider_filters
                .run(req, |req| self.dispatch(req));
        }
        if req.method == Method::GET || req.method == Method::HEAD {
            if let Some(files) = &parts.static_files {
                match files.load(&req.path) {
                    Ok((bytes, content_type)) => {
                        return HandlerResponse::bytes(200, content_type, bytes);
                    }
                    Err(e) => debug!(path = %req.path, error = %e, "Static content miss"),
                }
            }
        }
        not_found(req)
    }

    fn dispatch(&self, req: &mut ApiRequest) -> HandlerResponse {
        let parts = &self.inner;
        for resource in &parts.resources {
            if let Some(res) = resource.handle(req, &parts.api_context) {
                if res.status >= 500 {
                    warn!(resource = %resource.name(), path = %req.path, status = res.status, "Resource failed");
                }
                return res;
            }
        }
        not_found(req)
    }
}

impl HttpService for LaunchService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let response = match parse_request(req) {
            Some(parsed) => self.handle(parsed),
            None => HandlerResponse::error(400, "Malformed request"),
        };
        write_response(res, response);
        Ok(())
    }
}

fn not_found(req: &ApiRequest) -> HandlerResponse {
    HandlerResponse::json(
        404,
        json!({ "error": "Not Found", "method": req.method.as_str(), "path": req.path }),
    )
}

/// `""`, `"/"` → `"/"`; `"api/"` → `"/api"`.
pub(crate) fn normalize_context_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn strip_context_path(context_path: &str, path: &str) -> Option<String> {
    if context_path == "/" {
        return Some(path.to_string());
    }
    let rest = path.strip_prefix(context_path)?;
    if rest.is_empty() {
        Some("/".to_string())
    } else if rest.starts_with('/') {
        Some(rest.to_string())
    } else {
        None
    }
}
