//! # Dispatcher Module
//!
//! The in-process request dispatch engine a bridged call is routed through.
//!
//! ## Overview
//!
//! A [`Dispatcher`] exposes a single synchronous operation,
//! [`service`](Dispatcher::service), that receives a request and a response
//! through the capability surface in [`crate::surface`]. The bridge never
//! inspects how a dispatcher resolves the path; it only supplies the emulated
//! request/response pair and reads the captured body afterwards.
//!
//! Dispatchers are long-lived and shared. They are published by name in a
//! [`DispatcherRegistry`] once they have started, and bridges look them up
//! through a [`DispatcherHandle`]. A dispatcher must tolerate concurrent calls
//! to `service`; the bridge adds no locking of its own.
//!
//! ## Reference engine
//!
//! [`ResourceDispatcher`] is a small resource router: `(Method, path template)`
//! pairs map to resource functions, `{param}` segments are captured into the
//! request's attribute store, and the body reader is selected by the request's
//! content type.
//!
//! ```rust
//! use brrtbridge::dispatcher::{DispatcherRegistry, ResourceDispatcher};
//! use http::Method;
//! use std::io::Write;
//! use std::sync::Arc;
//!
//! let mut resources = ResourceDispatcher::new();
//! resources
//!     .register(Method::POST, "/ping", |_req, res| {
//!         res.output_stream().write_all(b"pong")?;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let registry = Arc::new(DispatcherRegistry::new());
//! registry.bind("resources", Arc::new(resources)).unwrap();
//! assert!(registry.resolve("resources").is_bound());
//! ```
//!
//! ## Error Handling
//!
//! - Unknown paths return [`DispatchError::NotFound`]
//! - Known paths with the wrong verb return [`DispatchError::MethodNotAllowed`]
//! - Bodies in a media type no resource reads return
//!   [`DispatchError::UnsupportedMediaType`]
//! - Panics inside a resource are not caught here; the bridge isolates them

mod registry;
mod resource;

pub use registry::{Binding, DispatcherHandle, DispatcherRegistry, RegistryError};
pub use resource::{
    path_param, ParamVec, ResourceDispatcher, ResourceFn, MAX_INLINE_PARAMS, PATH_PARAM_PREFIX,
    RESOURCE_ATTRIBUTE,
};

use http::{Method, StatusCode};
use std::fmt;
use std::io;

use crate::surface::{ServerRequest, ServerResponse};

/// A request dispatch engine driven through the capability surface
pub trait Dispatcher: Send + Sync {
    /// Route and execute one request, writing the result to `response`.
    ///
    /// Returning `Ok` with an error status set on the response is also a
    /// failed dispatch from the bridge's point of view.
    fn service(
        &self,
        request: &mut dyn ServerRequest,
        response: &mut dyn ServerResponse,
    ) -> Result<(), DispatchError>;
}

impl<F> Dispatcher for F
where
    F: Fn(&mut dyn ServerRequest, &mut dyn ServerResponse) -> Result<(), DispatchError>
        + Send
        + Sync,
{
    fn service(
        &self,
        request: &mut dyn ServerRequest,
        response: &mut dyn ServerResponse,
    ) -> Result<(), DispatchError> {
        self(request, response)
    }
}

/// Failure raised from inside a dispatcher
#[derive(Debug)]
pub enum DispatchError {
    /// No resource matches the path
    NotFound { path: String },
    /// A resource matches the path but not the method
    MethodNotAllowed { method: Method, path: String },
    /// The body's content type has no reader on the matched resource
    UnsupportedMediaType { content_type: Option<String> },
    /// The body could not be read as the resource's input type
    BadRequest { reason: String },
    /// The resource itself failed
    Handler { status: StatusCode, message: String },
    /// Reading the request or writing the response failed
    Io(io::Error),
}

impl DispatchError {
    /// HTTP status a server would answer with for this error
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::NotFound { .. } => StatusCode::NOT_FOUND,
            DispatchError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            DispatchError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            DispatchError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            DispatchError::Handler { status, .. } => *status,
            DispatchError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Resource failure with an explicit status
    #[must_use]
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        DispatchError::Handler {
            status,
            message: message.into(),
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::NotFound { path } => write!(f, "no resource matches path '{path}'"),
            DispatchError::MethodNotAllowed { method, path } => {
                write!(f, "method {method} not allowed for '{path}'")
            }
            DispatchError::UnsupportedMediaType { content_type } => write!(
                f,
                "unsupported media type '{}'",
                content_type.as_deref().unwrap_or("<none>")
            ),
            DispatchError::BadRequest { reason } => write!(f, "bad request body: {reason}"),
            DispatchError::Handler { status, message } => {
                write!(f, "resource failed with {}: {message}", status.as_u16())
            }
            DispatchError::Io(e) => write!(f, "dispatch I/O error: {e}"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DispatchError {
    fn from(e: io::Error) -> Self {
        DispatchError::Io(e)
    }
}
