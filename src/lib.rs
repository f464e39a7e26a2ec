//! # brrtbridge
//!
//! **brrtbridge** forwards unary RPC calls through an in-process HTTP-style
//! request dispatcher. A handler written once against a server-side
//! request/response abstraction can serve RPC clients without a second
//! implementation and without any network hop between the two.
//!
//! ## Overview
//!
//! For every call the bridge serializes the typed request message, wraps the
//! bytes in an in-memory [`EmulatedRequest`](emulated::EmulatedRequest), hands
//! it to a registered [`Dispatcher`](dispatcher::Dispatcher) together with an
//! [`EmulatedResponse`](emulated::EmulatedResponse), then decodes whatever the
//! dispatcher wrote into the typed reply.
//!
//! ## Architecture
//!
//! - **[`codec`]** - message <-> bytes (`prost` protobuf, serde JSON, optional gRPC framing)
//! - **[`surface`]** - the request/response capability contract dispatchers rely on
//! - **[`emulated`]** - in-memory request and response implementing that contract
//! - **[`path`]** - RPC method identifier -> dispatcher path translation rules
//! - **[`config`]** - validated, immutable bridge configuration (builder and YAML/TOML files)
//! - **[`dispatcher`]** - the dispatcher trait, the name registry, and a reference resource router
//! - **[`middleware`]** - hooks around resource invocations
//! - **[`bridge`]** - the per-call state machine
//! - **[`observer`]** - the unary output channel and gRPC status mapping
//! - **[`greeter`]** - the `helloworld.Greeter` service wired through the bridge
//! - **[`logging`]** - `tracing-subscriber` setup for binaries
//!
//! ### Call Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Rpc as RPC method
//!     participant Bridge as DispatchBridge
//!     participant Config as BridgeConfig
//!     participant Codec as MessageCodec
//!     participant Registry as DispatcherRegistry
//!     participant Dispatcher
//!     participant Sink as ReplySink
//!
//!     Rpc->>Bridge: forward(method, request, sink)
//!     Bridge->>Config: resolve(method)
//!     Config-->>Bridge: path + URL
//!     Bridge->>Codec: encode(request)
//!     Bridge->>Bridge: EmulatedRequest / EmulatedResponse
//!     Bridge->>Registry: resolve(dispatcher name)
//!     alt Unbound
//!         Bridge-->>Sink: on_error(DispatcherUnavailable)
//!     end
//!     Bridge->>Dispatcher: service(request, response)
//!     alt Error, panic or error status
//!         Bridge-->>Sink: on_error(DispatchInvocation)
//!     end
//!     Bridge->>Codec: decode(captured body)
//!     alt Malformed reply
//!         Bridge-->>Sink: on_error(Codec)
//!     end
//!     Bridge-->>Sink: on_next(reply)
//!     Bridge-->>Sink: on_completed()
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use brrtbridge::bridge::DispatchBridge;
//! use brrtbridge::config::BridgeConfig;
//! use brrtbridge::dispatcher::{DispatcherRegistry, ResourceDispatcher};
//! use brrtbridge::greeter::{register_greeter_resources, HelloReply, HelloRequest, SAY_HELLO};
//! use std::sync::Arc;
//!
//! // Host the resources and publish the dispatcher under a name
//! let mut resources = ResourceDispatcher::new();
//! register_greeter_resources(&mut resources)?;
//! let registry = Arc::new(DispatcherRegistry::new());
//! registry.bind("resources", Arc::new(resources))?;
//!
//! // Configure and build the bridge
//! let config = BridgeConfig::builder()
//!     .dispatcher("resources")
//!     .method(SAY_HELLO)
//!     .build()?;
//! let bridge = DispatchBridge::new(config, registry);
//!
//! let reply: HelloReply = bridge.invoke(SAY_HELLO, &HelloRequest { name: "Ada".into() })?;
//! assert_eq!(reply.message, "well hello Ada");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Model
//!
//! Every failure is reported once as a [`BridgeError`]:
//!
//! | Kind | When |
//! |---|---|
//! | `Configuration` | no path rule matches, invalid base URL, missing dispatcher name |
//! | `DispatcherUnavailable` | nothing is bound under the configured name |
//! | `Codec` | request encoding or reply decoding failed |
//! | `DispatchInvocation` | the dispatcher returned an error, panicked, or set an error status |
//!
//! `BridgeError` converts into `tonic::Status` for RPC callers.

pub mod bridge;
pub mod cli;
pub mod codec;
pub mod config;
pub mod dispatcher;
pub mod emulated;
pub mod error;
pub mod greeter;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod observer;
pub mod path;
pub mod surface;

pub use bridge::{CallState, DispatchBridge};
pub use config::{BridgeConfig, BridgeConfigBuilder, BridgeConfigFile, ConfigError};
pub use error::{BridgeError, ErrorKind};
pub use observer::{ReplySink, UnaryReply};
