//! # Output Channel
//!
//! A bridged call reports its outcome through a [`ReplySink`], the same shape
//! as a unary RPC stream observer: one `on_next` followed by `on_completed`, or
//! one `on_error`. The bridge guarantees that sequence; [`UnaryReply`] is the
//! collecting sink that enforces it on the receiving side and counts anything
//! that breaks it.

use std::fmt;
use tracing::warn;

use crate::error::{BridgeError, InvocationFailure};

/// Receives the outcome of one unary call
pub trait ReplySink<T> {
    /// Deliver the reply message
    fn on_next(&mut self, reply: T);

    /// Signal failure; no reply was or will be delivered
    fn on_error(&mut self, error: BridgeError);

    /// Signal normal completion after the reply
    fn on_completed(&mut self);
}

enum State<T> {
    Pending,
    Replied(T),
    Completed(T),
    Failed(BridgeError),
}

/// Collects exactly one outcome of a unary call.
///
/// Signals that arrive out of order or after a terminal signal are ignored,
/// logged and counted in [`violations`](Self::violations).
pub struct UnaryReply<T> {
    state: State<T>,
    violations: usize,
}

impl<T> Default for UnaryReply<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for UnaryReply<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            State::Pending => "pending",
            State::Replied(_) => "replied",
            State::Completed(_) => "completed",
            State::Failed(_) => "failed",
        };
        f.debug_struct("UnaryReply")
            .field("state", &state)
            .field("violations", &self.violations)
            .finish()
    }
}

impl<T> UnaryReply<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::Pending,
            violations: 0,
        }
    }

    /// Whether a terminal signal (completion or error) has arrived
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        matches!(self.state, State::Completed(_) | State::Failed(_))
    }

    /// Number of ignored out-of-protocol signals
    #[must_use]
    pub fn violations(&self) -> usize {
        self.violations
    }

    fn violation(&mut self, signal: &'static str) {
        self.violations += 1;
        warn!(
            signal = signal,
            violations = self.violations,
            "Unary reply protocol violation - signal ignored"
        );
    }

    /// The collected outcome, or `None` if the call never terminated.
    ///
    /// A reply that was never followed by completion is not an outcome.
    #[must_use]
    pub fn into_result(self) -> Option<Result<T, BridgeError>> {
        match self.state {
            State::Completed(reply) => Some(Ok(reply)),
            State::Failed(err) => Some(Err(err)),
            State::Pending | State::Replied(_) => None,
        }
    }

    /// The collected outcome as a tonic response.
    ///
    /// A call that never terminated becomes `INTERNAL`.
    pub fn into_tonic(self) -> Result<tonic::Response<T>, tonic::Status> {
        match self.into_result() {
            Some(Ok(reply)) => Ok(tonic::Response::new(reply)),
            Some(Err(err)) => Err(err.into()),
            None => Err(tonic::Status::internal("call produced no outcome")),
        }
    }
}

impl<T> ReplySink<T> for UnaryReply<T> {
    fn on_next(&mut self, reply: T) {
        match self.state {
            State::Pending => self.state = State::Replied(reply),
            _ => self.violation("on_next"),
        }
    }

    fn on_error(&mut self, error: BridgeError) {
        match self.state {
            State::Pending => self.state = State::Failed(error),
            _ => self.violation("on_error"),
        }
    }

    fn on_completed(&mut self) {
        match std::mem::replace(&mut self.state, State::Pending) {
            State::Replied(reply) => self.state = State::Completed(reply),
            other => {
                self.state = other;
                self.violation("on_completed");
            }
        }
    }
}

/// gRPC code for an HTTP status reported by a dispatcher
#[must_use]
pub fn code_for_http_status(status: http::StatusCode) -> tonic::Code {
    match status.as_u16() {
        400 => tonic::Code::InvalidArgument,
        401 => tonic::Code::Unauthenticated,
        403 => tonic::Code::PermissionDenied,
        404 => tonic::Code::Unimplemented,
        429 | 502 | 503 | 504 => tonic::Code::Unavailable,
        _ => tonic::Code::Unknown,
    }
}

impl From<BridgeError> for tonic::Status {
    fn from(err: BridgeError) -> Self {
        let code = match &err {
            BridgeError::Configuration(_) => tonic::Code::FailedPrecondition,
            BridgeError::DispatcherUnavailable { .. } => tonic::Code::Unavailable,
            BridgeError::Codec(_) => tonic::Code::Internal,
            BridgeError::DispatchInvocation {
                failure: InvocationFailure::Panic { .. },
                ..
            } => tonic::Code::Internal,
            BridgeError::DispatchInvocation { failure, .. } => failure
                .status()
                .map_or(tonic::Code::Unknown, code_for_http_status),
        };
        tonic::Status::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecError;
    use crate::config::ConfigError;
    use crate::dispatcher::DispatchError;
    use http::StatusCode;

    fn invocation(failure: InvocationFailure) -> BridgeError {
        BridgeError::DispatchInvocation {
            dispatcher: "engine".into(),
            failure,
        }
    }

    #[test]
    fn test_reply_then_completion() {
        let mut sink = UnaryReply::new();
        sink.on_next(7u32);
        assert!(!sink.is_terminated());
        sink.on_completed();
        assert!(sink.is_terminated());
        assert_eq!(sink.violations(), 0);
        assert_eq!(sink.into_result().unwrap().unwrap(), 7);
    }

    #[test]
    fn test_error_is_terminal() {
        let mut sink = UnaryReply::<u32>::new();
        sink.on_error(ConfigError::NoPathRules.into());
        sink.on_next(1);
        sink.on_completed();
        sink.on_error(CodecError::CompressedFrame.into());
        assert_eq!(sink.violations(), 3);
        let err = sink.into_result().unwrap().unwrap_err();
        assert!(matches!(err, BridgeError::Configuration(_)));
    }

    #[test]
    fn test_second_reply_is_ignored() {
        let mut sink = UnaryReply::new();
        sink.on_next("first");
        sink.on_next("second");
        sink.on_completed();
        assert_eq!(sink.violations(), 1);
        assert_eq!(sink.into_result().unwrap().unwrap(), "first");
    }

    #[test]
    fn test_no_outcome() {
        let mut sink = UnaryReply::<u32>::new();
        sink.on_completed();
        assert_eq!(sink.violations(), 1);
        let status = sink.into_tonic().unwrap_err();
        assert_eq!(status.code(), tonic::Code::Internal);

        let mut sink = UnaryReply::new();
        sink.on_next(1u8);
        assert!(sink.into_result().is_none());
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (BridgeError::from(ConfigError::NoPathRules), tonic::Code::FailedPrecondition),
            (
                BridgeError::DispatcherUnavailable {
                    dispatcher: "engine".into(),
                },
                tonic::Code::Unavailable,
            ),
            (BridgeError::from(CodecError::CompressedFrame), tonic::Code::Internal),
            (
                invocation(InvocationFailure::Error(DispatchError::NotFound {
                    path: "/x".into(),
                })),
                tonic::Code::Unimplemented,
            ),
            (
                invocation(InvocationFailure::Status {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    message: String::new(),
                }),
                tonic::Code::Unavailable,
            ),
            (
                invocation(InvocationFailure::Status {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: String::new(),
                }),
                tonic::Code::Unknown,
            ),
            (
                invocation(InvocationFailure::Panic {
                    message: "boom".into(),
                }),
                tonic::Code::Internal,
            ),
        ];
        for (err, code) in cases {
            assert_eq!(tonic::Status::from(err).code(), code);
        }
    }
}
