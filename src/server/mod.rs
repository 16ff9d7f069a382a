//! HTTP serving on the `may_minihttp` engine.

mod http_server;
mod request;
mod response;
mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{find_header, parse_cookies, parse_request, ApiRequest, HeaderVec, MAX_INLINE_HEADERS};
pub use response::{write_response, HandlerResponse};
pub use service::{LaunchService, ServiceParts};
pub(crate) use service::normalize_context_path;
