//! Hooks run by [`ResourceDispatcher`](crate::dispatcher::ResourceDispatcher)
//! around each resource invocation.

mod core;
mod tracing;

pub use core::Middleware;
pub use tracing::TracingMiddleware;
