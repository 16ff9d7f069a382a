//! REST resources served under `/v1/`.
//!
//! Routing inside the REST layer is deliberately minimal: each [`RestApi`] claims the
//! requests it understands and the service tries them in registration order.

use std::sync::Arc;

use crate::management::ManagementContext;
use crate::server::{ApiRequest, HandlerResponse};
use crate::shutdown::ShutdownCoordinator;

mod server;

pub use server::ServerResource;

/// Path prefix of every API request.
pub const API_PREFIX: &str = "/v1/";

/// Dependencies made available to every resource.
#[derive(Debug, Clone)]
pub struct ApiContext {
    pub mgmt: Arc<ManagementContext>,
    pub shutdown: Option<ShutdownCoordinator>,
}

/// A REST resource.
pub trait RestApi: Send + Sync {
    fn name(&self) -> &str;

    /// Handle `req`, or return `None` if the path is not this resource's.
    fn handle(&self, req: &ApiRequest, ctx: &ApiContext) -> Option<HandlerResponse>;
}

/// Resources installed when the caller adds none of its own.
pub fn default_resources() -> Vec<Arc<dyn RestApi>> {
    vec![Arc::new(ServerResource)]
}
