//! # Dispatch Bridge
//!
//! [`DispatchBridge`] turns one unary RPC call into one in-process dispatcher
//! invocation and back.
//!
//! ## Call lifecycle
//!
//! Each call walks the [`CallState`] machine exactly once:
//!
//! 1. **Building** - resolve the dispatcher path for the method, encode the
//!    request message, build a fresh [`EmulatedRequest`](crate::emulated::EmulatedRequest)
//!    and [`EmulatedResponse`](crate::emulated::EmulatedResponse)
//! 2. **Dispatching** - resolve the dispatcher by name and run its `service`
//!    operation on the calling thread; errors and panics are caught here
//! 3. **Decoding** - drain the captured body and decode the reply
//! 4. **Completed** or **Failed**
//!
//! A failure in any state skips the rest and ends in `Failed`. The dispatcher
//! is never invoked when building fails.
//!
//! ## Output
//!
//! [`forward`](DispatchBridge::forward) reports through a
//! [`ReplySink`](crate::observer::ReplySink): either one reply followed by
//! completion, or one error. [`invoke`](DispatchBridge::invoke) returns the
//! same outcome as a `Result`.
//!
//! ## Concurrency
//!
//! Calls block the calling thread for their full duration and share nothing
//! except the dispatcher itself. A bridge is `Send + Sync` and can be shared
//! across threads behind an `Arc`.

mod core;

pub use core::{CallState, DispatchBridge, MAX_ERROR_BODY_CHARS};
