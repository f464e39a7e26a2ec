//! # HelloWorld Greeter
//!
//! The `helloworld.Greeter` service wired end to end through the bridge:
//!
//! - [`HelloRequest`] / [`HelloReply`] - the service's messages, encodable as
//!   protobuf (`prost`) or JSON (`serde`)
//! - [`GreeterBridge`] - the RPC side; `say_hello` forwards each call through a
//!   [`DispatchBridge`]
//! - [`register_greeter_resources`] - the dispatcher side; installs the
//!   `/helloworld.Greeter/sayHello` resource
//!
//! ```rust
//! use brrtbridge::config::BridgeConfig;
//! use brrtbridge::dispatcher::{DispatcherRegistry, ResourceDispatcher};
//! use brrtbridge::greeter::{register_greeter_resources, GreeterBridge, HelloRequest, SAY_HELLO};
//! use std::sync::Arc;
//!
//! let mut resources = ResourceDispatcher::new();
//! register_greeter_resources(&mut resources).unwrap();
//! let registry = Arc::new(DispatcherRegistry::new());
//! registry.bind("resources", Arc::new(resources)).unwrap();
//!
//! let config = BridgeConfig::builder()
//!     .dispatcher("resources")
//!     .method(SAY_HELLO)
//!     .build()
//!     .unwrap();
//! let greeter = GreeterBridge::new(config, registry);
//!
//! let reply = greeter
//!     .say_hello(tonic::Request::new(HelloRequest { name: "Ada".into() }))
//!     .unwrap();
//! assert_eq!(reply.get_ref().message, "well hello Ada");
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tonic::metadata::MetadataValue;
use tracing::debug;

use crate::bridge::DispatchBridge;
use crate::codec::{Framing, MessageCodec, ProstCodec};
use crate::config::BridgeConfig;
use crate::dispatcher::{DispatchError, DispatcherRegistry, ResourceDispatcher};
use crate::emulated::CALL_ID_ATTRIBUTE;
use crate::ids::CallId;
use crate::observer::UnaryReply;
use crate::surface::ServerRequest;

pub const SERVICE_NAME: &str = "helloworld.Greeter";

/// RPC method identifier of `SayHello`
pub const SAY_HELLO: &str = "helloworld.Greeter/SayHello";

/// Dispatcher path serving `SayHello`
pub const SAY_HELLO_PATH: &str = "/helloworld.Greeter/sayHello";

pub const GREETING_PREFIX: &str = "well hello ";

/// Request/response metadata key carrying the call id
pub const CALL_ID_METADATA: &str = "x-call-id";

#[derive(Clone, PartialEq, Eq, Hash, prost::Message, Serialize, Deserialize)]
pub struct HelloRequest {
    #[prost(string, tag = "1")]
    pub name: String,
}

#[derive(Clone, PartialEq, Eq, Hash, prost::Message, Serialize, Deserialize)]
pub struct HelloReply {
    #[prost(string, tag = "1")]
    pub message: String,
}

/// Greeting for `name`
#[must_use]
pub fn greeting(name: &str) -> String {
    format!("{GREETING_PREFIX}{name}")
}

fn say_hello_resource(
    request: HelloRequest,
    ctx: &dyn ServerRequest,
) -> Result<HelloReply, DispatchError> {
    debug!(
        call_id = ctx
            .attribute(CALL_ID_ATTRIBUTE)
            .and_then(|v| v.as_str())
            .unwrap_or("-"),
        name_len = request.name.len(),
        "sayHello resource invoked"
    );
    Ok(HelloReply {
        message: greeting(&request.name),
    })
}

/// Install the `sayHello` resource for protobuf (raw bodies) and JSON bodies
pub fn register_greeter_resources(dispatcher: &mut ResourceDispatcher) -> Result<(), regex::Error> {
    register_greeter_resources_with(dispatcher, Framing::Raw)
}

/// Install the `sayHello` resource, reading protobuf bodies with `framing`
pub fn register_greeter_resources_with(
    dispatcher: &mut ResourceDispatcher,
    framing: Framing,
) -> Result<(), regex::Error> {
    dispatcher.register_codec(
        SAY_HELLO_PATH,
        ProstCodec::with_framing(framing),
        say_hello_resource,
    )?;
    dispatcher.register_json(SAY_HELLO_PATH, say_hello_resource)
}

/// RPC-side `helloworld.Greeter` implementation backed by a dispatcher
#[derive(Debug, Clone)]
pub struct GreeterBridge<C = ProstCodec> {
    bridge: DispatchBridge<C>,
}

impl GreeterBridge<ProstCodec> {
    #[must_use]
    pub fn new(config: BridgeConfig, registry: Arc<DispatcherRegistry>) -> Self {
        Self {
            bridge: DispatchBridge::new(config, registry),
        }
    }
}

impl<C> GreeterBridge<C>
where
    C: MessageCodec<HelloRequest> + MessageCodec<HelloReply>,
{
    #[must_use]
    pub fn from_bridge(bridge: DispatchBridge<C>) -> Self {
        Self { bridge }
    }

    #[must_use]
    pub fn bridge(&self) -> &DispatchBridge<C> {
        &self.bridge
    }

    /// Unary `SayHello`.
    ///
    /// An `x-call-id` request metadata entry holding a ULID is reused as the
    /// call id; the call id is echoed in the response metadata.
    pub fn say_hello(
        &self,
        request: tonic::Request<HelloRequest>,
    ) -> Result<tonic::Response<HelloReply>, tonic::Status> {
        let call_id = CallId::from_metadata_or_new(
            request
                .metadata()
                .get(CALL_ID_METADATA)
                .and_then(|v| v.to_str().ok()),
        );
        let message = request.into_inner();

        let mut reply = UnaryReply::new();
        self.bridge
            .forward_with_id(call_id, SAY_HELLO, &message, &mut reply);

        let mut response = reply.into_tonic()?;
        if let Ok(value) = MetadataValue::try_from(call_id.to_string()) {
            response.metadata_mut().insert(CALL_ID_METADATA, value);
        }
        Ok(response)
    }
}
