use http::{Method, StatusCode};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use std::io::Read;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::{DispatchError, Dispatcher};
use crate::codec::{media_type, JsonCodec, MessageCodec, ProstCodec};
use crate::middleware::Middleware;
use crate::surface::{ServerRequest, ServerResponse};

/// Attribute holding the matched path template
pub const RESOURCE_ATTRIBUTE: &str = "brrtbridge.resource";

/// Attribute prefix for captured `{param}` segments
pub const PATH_PARAM_PREFIX: &str = "brrtbridge.path.";

/// Path parameters stored inline before heap allocation
pub const MAX_INLINE_PARAMS: usize = 8;

/// Captured path parameters in template order
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// A raw resource function
pub type ResourceFn = Arc<
    dyn Fn(&mut dyn ServerRequest, &mut dyn ServerResponse) -> Result<(), DispatchError>
        + Send
        + Sync,
>;

/// Value of a captured path parameter, read back from the attribute store
#[must_use]
pub fn path_param<'a>(request: &'a dyn ServerRequest, name: &str) -> Option<&'a str> {
    request
        .attribute(&format!("{PATH_PARAM_PREFIX}{name}"))
        .and_then(Value::as_str)
}

struct Resource {
    method: Method,
    template: Arc<str>,
    consumes: Option<&'static str>,
    regex: Regex,
    param_names: Vec<Arc<str>>,
    handler: ResourceFn,
}

impl Resource {
    fn captures(&self, path: &str) -> Option<ParamVec> {
        let caps = self.regex.captures(path)?;
        let mut params = ParamVec::new();
        for (i, name) in self.param_names.iter().enumerate() {
            if let Some(m) = caps.get(i + 1) {
                params.push((Arc::clone(name), m.as_str().to_string()));
            }
        }
        Some(params)
    }

    fn reads(&self, content_type: Option<&str>) -> bool {
        match (self.consumes, content_type) {
            (None, _) => true,
            (Some(expected), Some(declared)) => media_type_matches(expected, declared),
            (Some(_), None) => false,
        }
    }
}

/// `application/grpc` matches `application/grpc` and `application/grpc+proto`
fn media_type_matches(expected: &str, declared: &str) -> bool {
    let declared = media_type(declared);
    if declared.eq_ignore_ascii_case(expected) {
        return true;
    }
    declared
        .get(..expected.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(expected))
        && declared[expected.len()..].starts_with('+')
}

/// Compile `/items/{id}` into `^/items/([^/]+)$`, escaping literal segments
fn template_to_regex(template: &str) -> Result<(Regex, Vec<Arc<str>>), regex::Error> {
    if template == "/" {
        return Ok((Regex::new(r"^/$")?, Vec::new()));
    }

    let mut pattern = String::with_capacity(template.len() + 5);
    pattern.push('^');
    let mut param_names = Vec::with_capacity(template.matches('{').count());

    for segment in template.split('/') {
        if segment.starts_with('{') && segment.ends_with('}') && segment.len() > 2 {
            pattern.push_str("/([^/]+)");
            param_names.push(Arc::from(&segment[1..segment.len() - 1]));
        } else if !segment.is_empty() {
            pattern.push('/');
            pattern.push_str(&regex::escape(segment));
        }
    }

    pattern.push('$');
    Ok((Regex::new(&pattern)?, param_names))
}

/// Reference dispatch engine routing `(Method, path)` to resources.
///
/// Resources are matched in registration order. Typed resources read the body
/// with a [`MessageCodec`] chosen by the request's content type.
#[derive(Default)]
pub struct ResourceDispatcher {
    resources: Vec<Resource>,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl std::fmt::Debug for ResourceDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceDispatcher")
            .field("routes", &self.routes())
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

impl ResourceDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a raw resource reading any content type.
    ///
    /// A resource with the same method, template and media type is replaced.
    pub fn register<F>(
        &mut self,
        method: Method,
        template: &str,
        handler: F,
    ) -> Result<(), regex::Error>
    where
        F: Fn(&mut dyn ServerRequest, &mut dyn ServerResponse) -> Result<(), DispatchError>
            + Send
            + Sync
            + 'static,
    {
        self.insert(method, template, None, Arc::new(handler))
    }

    fn insert(
        &mut self,
        method: Method,
        template: &str,
        consumes: Option<&'static str>,
        handler: ResourceFn,
    ) -> Result<(), regex::Error> {
        let (regex, param_names) = template_to_regex(template)?;
        let resource = Resource {
            method: method.clone(),
            template: Arc::from(template),
            consumes,
            regex,
            param_names,
            handler,
        };

        let total_resources = self.resources.len();
        if let Some(existing) = self.resources.iter_mut().find(|r| {
            r.method == resource.method
                && r.template == resource.template
                && r.consumes == resource.consumes
        }) {
            warn!(
                method = %method,
                template = %template,
                consumes = consumes.unwrap_or("*"),
                total_resources = total_resources,
                "Replaced existing resource"
            );
            *existing = resource;
            return Ok(());
        }

        self.resources.push(resource);
        info!(
            method = %method,
            template = %template,
            consumes = consumes.unwrap_or("*"),
            total_resources = self.resources.len(),
            "Resource registered"
        );
        Ok(())
    }

    /// Register a `POST` resource reading and writing bodies with `codec`.
    ///
    /// The resource only reads bodies declared with the codec's media type.
    /// Several codecs can serve the same template side by side.
    pub fn register_codec<Req, Resp, C, F>(
        &mut self,
        template: &str,
        codec: C,
        handler: F,
    ) -> Result<(), regex::Error>
    where
        Req: 'static,
        Resp: 'static,
        C: MessageCodec<Req> + MessageCodec<Resp> + 'static,
        F: Fn(Req, &dyn ServerRequest) -> Result<Resp, DispatchError> + Send + Sync + 'static,
    {
        let consumes = <C as MessageCodec<Req>>::content_type(&codec);
        let resource: ResourceFn = Arc::new(
            move |request: &mut dyn ServerRequest,
                  response: &mut dyn ServerResponse|
                  -> Result<(), DispatchError> {
                let mut body = Vec::with_capacity(
                    request
                        .content_length()
                        .and_then(|len| usize::try_from(len).ok())
                        .unwrap_or_default(),
                );
                request.input_stream().read_to_end(&mut body)?;
                let input = <C as MessageCodec<Req>>::decode(&codec, &body).map_err(|e| {
                    DispatchError::BadRequest {
                        reason: e.to_string(),
                    }
                })?;

                let output = handler(input, &*request)?;
                let bytes = <C as MessageCodec<Resp>>::encode(&codec, &output).map_err(|e| {
                    DispatchError::handler(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
                })?;

                response.set_status(StatusCode::OK);
                response.set_content_type(<C as MessageCodec<Resp>>::content_type(&codec));
                response.output_stream().write_all(&bytes)?;
                Ok(())
            },
        );
        self.insert(Method::POST, template, Some(consumes), resource)
    }

    /// Register a protobuf resource over `application/grpc`
    pub fn register_message<Req, Resp, F>(
        &mut self,
        template: &str,
        handler: F,
    ) -> Result<(), regex::Error>
    where
        Req: prost::Message + Default + 'static,
        Resp: prost::Message + Default + 'static,
        F: Fn(Req, &dyn ServerRequest) -> Result<Resp, DispatchError> + Send + Sync + 'static,
    {
        self.register_codec(template, ProstCodec::new(), handler)
    }

    /// Register a JSON resource over `application/json`
    pub fn register_json<Req, Resp, F>(
        &mut self,
        template: &str,
        handler: F,
    ) -> Result<(), regex::Error>
    where
        Req: Serialize + DeserializeOwned + 'static,
        Resp: Serialize + DeserializeOwned + 'static,
        F: Fn(Req, &dyn ServerRequest) -> Result<Resp, DispatchError> + Send + Sync + 'static,
    {
        self.register_codec(template, JsonCodec, handler)
    }

    /// Add middleware; runs in insertion order
    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        self.middlewares.push(mw);
    }

    /// Registered `(method, template)` pairs in match order
    #[must_use]
    pub fn routes(&self) -> Vec<(Method, String)> {
        let mut routes: Vec<(Method, String)> = Vec::with_capacity(self.resources.len());
        for r in &self.resources {
            if !routes.iter().any(|(m, t)| *m == r.method && **t == *r.template) {
                routes.push((r.method.clone(), r.template.to_string()));
            }
        }
        routes
    }

    fn route(
        &self,
        method: &Method,
        path: &str,
        content_type: Option<&str>,
    ) -> Result<(&Resource, ParamVec), DispatchError> {
        let mut path_matched = false;
        let mut method_matched = false;
        for resource in &self.resources {
            let Some(params) = resource.captures(path) else {
                continue;
            };
            path_matched = true;
            if resource.method != *method {
                continue;
            }
            method_matched = true;
            if resource.reads(content_type) {
                return Ok((resource, params));
            }
        }

        if method_matched {
            Err(DispatchError::UnsupportedMediaType {
                content_type: content_type.map(str::to_string),
            })
        } else if path_matched {
            Err(DispatchError::MethodNotAllowed {
                method: method.clone(),
                path: path.to_string(),
            })
        } else {
            Err(DispatchError::NotFound {
                path: path.to_string(),
            })
        }
    }
}

impl Dispatcher for ResourceDispatcher {
    fn service(
        &self,
        request: &mut dyn ServerRequest,
        response: &mut dyn ServerResponse,
    ) -> Result<(), DispatchError> {
        let routed = self.route(request.method(), request.path(), request.content_type());
        let (resource, params) = match routed {
            Ok(found) => found,
            Err(e) => {
                debug!(
                    method = %request.method(),
                    path = %request.path(),
                    available_resources = self.resources.len(),
                    error = %e,
                    "Resource lookup failed"
                );
                return Err(e);
            }
        };

        request.set_attribute(RESOURCE_ATTRIBUTE, Value::String(resource.template.to_string()));
        for (name, value) in &params {
            request.set_attribute(
                &format!("{PATH_PARAM_PREFIX}{name}"),
                Value::String(value.clone()),
            );
        }

        let start = Instant::now();
        let mut early: Option<DispatchError> = None;
        for mw in &self.middlewares {
            if early.is_none() {
                early = mw.before(&*request);
                if early.is_some() {
                    debug!(
                        path = %request.path(),
                        middleware_name = std::any::type_name_of_val(mw.as_ref()),
                        "Middleware short-circuited resource"
                    );
                }
            }
        }

        let result = match early {
            Some(e) => Err(e),
            None => (resource.handler)(request, response),
        };

        let status = match &result {
            Ok(()) => response.status(),
            Err(e) => e.status(),
        };
        let latency = start.elapsed();
        for mw in &self.middlewares {
            mw.after(&*request, status, latency);
        }
        result
    }
}
