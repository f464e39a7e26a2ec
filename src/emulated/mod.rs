//! # Emulated Request/Response
//!
//! In-memory objects that satisfy the dispatcher capability surface
//! ([`ServerRequest`](crate::surface::ServerRequest) /
//! [`ServerResponse`](crate::surface::ServerResponse)) without any transport.
//!
//! Both are created fresh for every bridged call and dropped when the call
//! ends. Nothing in them is shared between calls: the attribute store, the
//! request body and the response sink all belong to a single invocation.
//!
//! - [`EmulatedRequest`] - always `POST`, no headers, body backed by the
//!   serialized request message
//! - [`EmulatedResponse`] - reports itself committed, accumulates every byte
//!   the dispatcher writes into one append-only buffer

mod request;
mod response;

pub use request::{AttributeVec, EmulatedRequest, CALL_ID_ATTRIBUTE, MAX_INLINE_ATTRIBUTES};
pub use response::{status_reason, CapturedResponse, EmulatedResponse, ResponseSink};
