use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::codec::{MessageCodec, ProstCodec};
use crate::config::BridgeConfig;
use crate::dispatcher::{Binding, DispatcherHandle, DispatcherRegistry};
use crate::emulated::{status_reason, EmulatedRequest, EmulatedResponse};
use crate::error::{BridgeError, ErrorKind, InvocationFailure};
use crate::ids::CallId;
use crate::observer::ReplySink;

/// Longest prefix of an error response body kept in the error message
pub const MAX_ERROR_BODY_CHARS: usize = 256;

/// Per-call state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Building,
    Dispatching,
    Decoding,
    Completed,
    Failed,
}

impl CallState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CallState::Building => "building",
            CallState::Dispatching => "dispatching",
            CallState::Decoding => "decoding",
            CallState::Completed => "completed",
            CallState::Failed => "failed",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, CallState::Completed | CallState::Failed)
    }
}

/// Tracks one call's state and carries its log context
struct CallTrace<'a> {
    call_id: CallId,
    method: &'a str,
    dispatcher: &'a str,
    path: Option<String>,
    state: CallState,
    started: Instant,
}

impl<'a> CallTrace<'a> {
    fn new(call_id: CallId, method: &'a str, dispatcher: &'a str) -> Self {
        debug!(
            call_id = %call_id,
            method = %method,
            dispatcher = %dispatcher,
            state = CallState::Building.as_str(),
            "Bridged call start"
        );
        Self {
            call_id,
            method,
            dispatcher,
            path: None,
            state: CallState::Building,
            started: Instant::now(),
        }
    }

    fn path(&self) -> &str {
        self.path.as_deref().unwrap_or("-")
    }

    fn enter(&mut self, next: CallState) {
        debug!(
            call_id = %self.call_id,
            method = %self.method,
            path = %self.path(),
            from = self.state.as_str(),
            state = next.as_str(),
            "Call state transition"
        );
        self.state = next;
    }

    fn fail(&mut self, err: BridgeError) -> BridgeError {
        let failed_in = self.state;
        self.state = CallState::Failed;
        let latency_ms = self.started.elapsed().as_millis() as u64;
        match err.kind() {
            ErrorKind::Configuration => error!(
                call_id = %self.call_id,
                method = %self.method,
                dispatcher = %self.dispatcher,
                failed_in = failed_in.as_str(),
                error = %err,
                "Bridged call failed - routing misconfigured"
            ),
            ErrorKind::DispatcherUnavailable => warn!(
                call_id = %self.call_id,
                method = %self.method,
                dispatcher = %self.dispatcher,
                error = %err,
                "Bridged call failed - dispatcher unavailable"
            ),
            ErrorKind::Codec => warn!(
                call_id = %self.call_id,
                method = %self.method,
                path = %self.path(),
                failed_in = failed_in.as_str(),
                latency_ms = latency_ms,
                error = %err,
                "Bridged call failed - codec error"
            ),
            ErrorKind::DispatchInvocation => error!(
                call_id = %self.call_id,
                method = %self.method,
                path = %self.path(),
                dispatcher = %self.dispatcher,
                status = err.status().map(|s| s.as_u16()),
                latency_ms = latency_ms,
                error = %err,
                "Bridged call failed - dispatcher invocation"
            ),
        }
        err
    }

    fn complete(&mut self, reply_bytes: usize) {
        self.state = CallState::Completed;
        info!(
            call_id = %self.call_id,
            method = %self.method,
            path = %self.path(),
            dispatcher = %self.dispatcher,
            reply_bytes = reply_bytes,
            latency_ms = self.started.elapsed().as_millis() as u64,
            "Bridged call complete"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn error_body_excerpt(body: &[u8]) -> String {
    String::from_utf8_lossy(body)
        .chars()
        .take(MAX_ERROR_BODY_CHARS)
        .collect()
}

/// Forwards unary calls through a named in-process dispatcher.
///
/// The codec `C` encodes requests and decodes replies; its content type is
/// what the emulated request declares.
#[derive(Debug, Clone)]
pub struct DispatchBridge<C = ProstCodec> {
    config: BridgeConfig,
    handle: DispatcherHandle,
    codec: C,
}

impl DispatchBridge<ProstCodec> {
    /// Bridge using raw protobuf bodies
    #[must_use]
    pub fn new(config: BridgeConfig, registry: Arc<DispatcherRegistry>) -> Self {
        Self::with_codec(config, registry, ProstCodec::new())
    }
}

impl<C> DispatchBridge<C> {
    #[must_use]
    pub fn with_codec(config: BridgeConfig, registry: Arc<DispatcherRegistry>, codec: C) -> Self {
        let handle = DispatcherHandle::new(registry, config.dispatcher_name());
        Self {
            config,
            handle,
            codec,
        }
    }

    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    #[must_use]
    pub fn handle(&self) -> &DispatcherHandle {
        &self.handle
    }

    #[must_use]
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Run one call and return its outcome
    pub fn invoke<Req, Resp>(&self, method_id: &str, request: &Req) -> Result<Resp, BridgeError>
    where
        C: MessageCodec<Req> + MessageCodec<Resp>,
    {
        self.invoke_with_id(CallId::new(), method_id, request)
    }

    /// Run one call under a caller-supplied call id
    pub fn invoke_with_id<Req, Resp>(
        &self,
        call_id: CallId,
        method_id: &str,
        request: &Req,
    ) -> Result<Resp, BridgeError>
    where
        C: MessageCodec<Req> + MessageCodec<Resp>,
    {
        let mut trace = CallTrace::new(call_id, method_id, self.handle.name());

        let route = self
            .config
            .resolve(method_id)
            .map_err(|e| trace.fail(e.into()))?;
        trace.path = Some(route.path.clone());

        let body = <C as MessageCodec<Req>>::encode(&self.codec, request)
            .map_err(|e| trace.fail(e.into()))?;
        let content_type = <C as MessageCodec<Req>>::content_type(&self.codec);
        let mut emulated_request = EmulatedRequest::new(call_id, route, content_type, body);
        let mut emulated_response = EmulatedResponse::new();

        trace.enter(CallState::Dispatching);
        let dispatcher = match self.handle.resolve() {
            Binding::Bound(dispatcher) => dispatcher,
            Binding::Unbound => {
                return Err(trace.fail(BridgeError::DispatcherUnavailable {
                    dispatcher: self.handle.name().to_string(),
                }))
            }
        };

        let invocation = |failure| BridgeError::DispatchInvocation {
            dispatcher: self.handle.name().to_string(),
            failure,
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            dispatcher.service(&mut emulated_request, &mut emulated_response)
        }));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(trace.fail(invocation(InvocationFailure::Error(e)))),
            Err(payload) => {
                return Err(trace.fail(invocation(InvocationFailure::Panic {
                    message: panic_message(&*payload),
                })))
            }
        }

        let captured = emulated_response.drain();
        if captured.status.is_client_error() || captured.status.is_server_error() {
            debug!(
                call_id = %call_id,
                status = captured.status.as_u16(),
                reason = status_reason(captured.status),
                body_len = captured.body.len(),
                "Dispatcher set an error status"
            );
            return Err(trace.fail(invocation(InvocationFailure::Status {
                status: captured.status,
                message: error_body_excerpt(&captured.body),
            })));
        }

        trace.enter(CallState::Decoding);
        let reply = <C as MessageCodec<Resp>>::decode(&self.codec, &captured.body)
            .map_err(|e| trace.fail(e.into()))?;
        trace.complete(captured.body.len());
        Ok(reply)
    }

    /// Run one call and report it to `sink`: one reply then completion, or one error
    pub fn forward<Req, Resp, S>(&self, method_id: &str, request: &Req, sink: &mut S)
    where
        C: MessageCodec<Req> + MessageCodec<Resp>,
        S: ReplySink<Resp> + ?Sized,
    {
        self.forward_with_id(CallId::new(), method_id, request, sink);
    }

    pub fn forward_with_id<Req, Resp, S>(
        &self,
        call_id: CallId,
        method_id: &str,
        request: &Req,
        sink: &mut S,
    ) where
        C: MessageCodec<Req> + MessageCodec<Resp>,
        S: ReplySink<Resp> + ?Sized,
    {
        match self.invoke_with_id(call_id, method_id, request) {
            Ok(reply) => {
                sink.on_next(reply);
                sink.on_completed();
            }
            Err(err) => sink.on_error(err),
        }
    }
}
