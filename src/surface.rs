//! # Dispatcher Capability Surface
//!
//! The request and response contract a [`Dispatcher`](crate::dispatcher::Dispatcher)
//! relies on. It is deliberately small: the bridge only supports dispatchers whose
//! required surface is a subset of these operations.
//!
//! ## Required capabilities
//!
//! | Request | Response |
//! |---|---|
//! | [`method`](ServerRequest::method) | [`is_committed`](ServerResponse::is_committed) |
//! | [`content_type`](ServerRequest::content_type) | [`output_stream`](ServerResponse::output_stream) |
//! | [`path`](ServerRequest::path) / [`request_url`](ServerRequest::request_url) | |
//! | [`headers`](ServerRequest::headers) | |
//! | [`input_stream`](ServerRequest::input_stream) | |
//! | [`attribute`](ServerRequest::attribute) / [`set_attribute`](ServerRequest::set_attribute) | |
//!
//! ## Optional capabilities
//!
//! Everything else has a default implementation returning an empty or absent
//! value, so a dispatcher probing optional metadata never fails on an
//! in-memory request.

use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde_json::Value;
use std::io::{self, Read, Write};
use std::net::SocketAddr;

/// Server-side view of a request, as seen by a dispatcher
pub trait ServerRequest {
    /// HTTP method of the request
    fn method(&self) -> &Method;

    /// Declared content type of the body, if any
    fn content_type(&self) -> Option<&str>;

    /// Target path, always starting with `/`
    fn path(&self) -> &str;

    /// Absolute URL of the request
    fn request_url(&self) -> &str;

    /// Request headers; may be empty
    fn headers(&self) -> &HeaderMap;

    /// Readable body stream positioned at the start of the body.
    ///
    /// Each call returns a fresh reader over the whole body.
    fn input_stream(&self) -> Box<dyn Read + '_>;

    /// Look up a per-request attribute
    fn attribute(&self, name: &str) -> Option<&Value>;

    /// Set a per-request attribute, replacing any previous value
    fn set_attribute(&mut self, name: &str, value: Value);

    fn remove_attribute(&mut self, _name: &str) -> Option<Value> {
        None
    }

    fn attribute_names(&self) -> Vec<&str> {
        Vec::new()
    }

    /// First value of the named header, if present and valid UTF-8
    fn header(&self, name: &str) -> Option<&str> {
        self.headers().get(name).and_then(|v| v.to_str().ok())
    }

    fn content_length(&self) -> Option<u64> {
        None
    }

    fn query_string(&self) -> Option<&str> {
        None
    }

    fn character_encoding(&self) -> Option<&str> {
        None
    }

    fn remote_addr(&self) -> Option<SocketAddr> {
        None
    }
}

/// Server-side view of a response, as seen by a dispatcher
pub trait ServerResponse {
    /// Whether the response has been committed to the client
    fn is_committed(&self) -> bool;

    /// Writable body sink; everything written becomes the response body
    fn output_stream(&mut self) -> &mut dyn Write;

    fn set_status(&mut self, _status: StatusCode) {}

    fn status(&self) -> StatusCode {
        StatusCode::OK
    }

    fn set_header(&mut self, _name: HeaderName, _value: HeaderValue) {}

    fn set_content_type(&mut self, _content_type: &str) {}

    fn flush_buffer(&mut self) -> io::Result<()> {
        Ok(())
    }
}
