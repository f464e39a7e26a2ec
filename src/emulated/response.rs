use bytes::{Bytes, BytesMut};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use std::io::{self, Write};

use crate::surface::ServerResponse;

/// Reason phrase for a status, used in log lines
#[must_use]
pub fn status_reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown")
}

/// Append-only in-memory body sink
#[derive(Debug, Default)]
pub struct ResponseSink {
    buf: BytesMut,
}

impl ResponseSink {
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Write for ResponseSink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Everything a dispatcher left behind on an [`EmulatedResponse`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CapturedResponse {
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}

/// In-memory response handed to a dispatcher for one bridged call
#[derive(Debug)]
pub struct EmulatedResponse {
    status: StatusCode,
    headers: HeaderMap,
    sink: ResponseSink,
}

impl Default for EmulatedResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl EmulatedResponse {
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            sink: ResponseSink::default(),
        }
    }

    /// Bytes written so far
    #[must_use]
    pub fn written(&self) -> usize {
        self.sink.len()
    }

    /// Consume the response and hand back the captured body.
    ///
    /// Taking `self` by value means the body can only be read once, after the
    /// dispatcher has released its borrow.
    #[must_use]
    pub fn drain(self) -> CapturedResponse {
        CapturedResponse {
            status: self.status,
            headers: self.headers,
            body: self.sink.buf.freeze(),
        }
    }
}

impl ServerResponse for EmulatedResponse {
    fn is_committed(&self) -> bool {
        true
    }

    fn output_stream(&mut self) -> &mut dyn Write {
        &mut self.sink
    }

    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn status(&self) -> StatusCode {
        self.status
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    fn set_content_type(&mut self, content_type: &str) {
        if let Ok(value) = HeaderValue::from_str(content_type) {
            self.headers.insert(CONTENT_TYPE, value);
        }
    }
}
