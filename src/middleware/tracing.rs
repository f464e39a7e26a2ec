use http::StatusCode;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::Middleware;
use crate::dispatcher::{DispatchError, RESOURCE_ATTRIBUTE};
use crate::emulated::{status_reason, CALL_ID_ATTRIBUTE};
use crate::surface::ServerRequest;

fn attr<'a>(request: &'a dyn ServerRequest, name: &str) -> &'a str {
    request
        .attribute(name)
        .and_then(|v| v.as_str())
        .unwrap_or("-")
}

/// Logs every resource invocation with its status and latency
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn before(&self, request: &dyn ServerRequest) -> Option<DispatchError> {
        debug!(
            call_id = %attr(request, CALL_ID_ATTRIBUTE),
            method = %request.method(),
            path = %request.path(),
            resource = %attr(request, RESOURCE_ATTRIBUTE),
            "Resource invocation start"
        );
        None
    }

    fn after(&self, request: &dyn ServerRequest, status: StatusCode, latency: Duration) {
        let latency_ms = latency.as_millis() as u64;
        if status.is_client_error() || status.is_server_error() {
            warn!(
                call_id = %attr(request, CALL_ID_ATTRIBUTE),
                path = %request.path(),
                status = status.as_u16(),
                reason = status_reason(status),
                latency_ms = latency_ms,
                "Resource invocation failed"
            );
        } else {
            info!(
                call_id = %attr(request, CALL_ID_ATTRIBUTE),
                path = %request.path(),
                status = status.as_u16(),
                latency_ms = latency_ms,
                "Resource invocation complete"
            );
        }
    }
}
