use bytes::Bytes;
use http::{HeaderMap, Method};
use serde_json::Value;
use smallvec::SmallVec;
use std::io::{Cursor, Read};

use crate::config::ResolvedRoute;
use crate::ids::CallId;
use crate::surface::ServerRequest;

/// Attribute key under which the call id is stored
pub const CALL_ID_ATTRIBUTE: &str = "brrtbridge.call_id";

/// Maximum attributes stored inline before heap allocation.
/// Dispatchers typically set a handful per request.
pub const MAX_INLINE_ATTRIBUTES: usize = 8;

/// Per-call attribute storage; linear lookup, last write replaces
pub type AttributeVec = SmallVec<[(String, Value); MAX_INLINE_ATTRIBUTES]>;

/// In-memory request handed to a dispatcher for one bridged call
#[derive(Debug)]
pub struct EmulatedRequest {
    call_id: CallId,
    method: Method,
    path: String,
    url: String,
    content_type: &'static str,
    headers: HeaderMap,
    body: Bytes,
    attributes: AttributeVec,
}

impl EmulatedRequest {
    /// Build the request for `route` carrying `body` as its payload.
    ///
    /// The body is used as-is: its length is exactly the encoded message length.
    #[must_use]
    pub fn new(
        call_id: CallId,
        route: &ResolvedRoute,
        content_type: &'static str,
        body: Bytes,
    ) -> Self {
        let mut attributes = AttributeVec::new();
        attributes.push((
            CALL_ID_ATTRIBUTE.to_string(),
            Value::String(call_id.to_string()),
        ));
        Self {
            call_id,
            method: Method::POST,
            path: route.path.clone(),
            url: route.url.clone(),
            content_type,
            headers: HeaderMap::new(),
            body,
            attributes,
        }
    }

    #[must_use]
    pub fn call_id(&self) -> CallId {
        self.call_id
    }

    /// Raw body bytes
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

impl ServerRequest for EmulatedRequest {
    fn method(&self) -> &Method {
        &self.method
    }

    fn content_type(&self) -> Option<&str> {
        Some(self.content_type)
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn request_url(&self) -> &str {
        &self.url
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn input_stream(&self) -> Box<dyn Read + '_> {
        Box::new(Cursor::new(self.body.as_ref()))
    }

    fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    fn set_attribute(&mut self, name: &str, value: Value) {
        if let Some(slot) = self.attributes.iter_mut().find(|(k, _)| k == name) {
            slot.1 = value;
        } else {
            self.attributes.push((name.to_string(), value));
        }
    }

    fn remove_attribute(&mut self, name: &str) -> Option<Value> {
        let idx = self.attributes.iter().position(|(k, _)| k == name)?;
        Some(self.attributes.remove(idx).1)
    }

    fn attribute_names(&self) -> Vec<&str> {
        self.attributes.iter().map(|(k, _)| k.as_str()).collect()
    }

    fn content_length(&self) -> Option<u64> {
        Some(self.body.len() as u64)
    }
}
