use http::StatusCode;
use std::time::Duration;

use crate::dispatcher::DispatchError;
use crate::surface::ServerRequest;

/// Observes or short-circuits resource invocations.
///
/// `before` runs after routing, once path parameters are in the attribute
/// store. Returning an error skips the resource and every later `before`.
/// `after` runs for every middleware with the final status, including
/// short-circuited calls.
pub trait Middleware: Send + Sync {
    fn before(&self, _request: &dyn ServerRequest) -> Option<DispatchError> {
        None
    }

    fn after(&self, _request: &dyn ServerRequest, _status: StatusCode, _latency: Duration) {}
}
