//! Errors reported by a bridged call.
//!
//! Every failure a call can hit is folded into one [`BridgeError`] before it
//! reaches the output channel. [`ErrorKind`] is the coarse classification used
//! for matching and logging.

use http::StatusCode;
use std::fmt;

use crate::codec::CodecError;
use crate::config::ConfigError;
use crate::dispatcher::DispatchError;

/// Coarse classification of a [`BridgeError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Routing or startup misconfiguration
    Configuration,
    /// The dispatcher is not bound under the configured name
    DispatcherUnavailable,
    /// Encoding the request or decoding the reply failed
    Codec,
    /// The dispatcher failed while servicing the call
    DispatchInvocation,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::DispatcherUnavailable => "dispatcher_unavailable",
            ErrorKind::Codec => "codec",
            ErrorKind::DispatchInvocation => "dispatch_invocation",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a dispatcher invocation went wrong
#[derive(Debug)]
pub enum InvocationFailure {
    /// `service` returned an error
    Error(DispatchError),
    /// `service` returned normally but set an error status
    Status { status: StatusCode, message: String },
    /// `service` panicked
    Panic { message: String },
}

impl InvocationFailure {
    /// HTTP status associated with the failure; panics have none
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            InvocationFailure::Error(e) => Some(e.status()),
            InvocationFailure::Status { status, .. } => Some(*status),
            InvocationFailure::Panic { .. } => None,
        }
    }
}

impl fmt::Display for InvocationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationFailure::Error(e) => write!(f, "{e}"),
            InvocationFailure::Status { status, message } if message.is_empty() => {
                write!(f, "dispatcher responded with status {}", status.as_u16())
            }
            InvocationFailure::Status { status, message } => write!(
                f,
                "dispatcher responded with status {}: {message}",
                status.as_u16()
            ),
            InvocationFailure::Panic { message } => write!(f, "dispatcher panicked: {message}"),
        }
    }
}

/// A failed bridged call
#[derive(Debug)]
pub enum BridgeError {
    Configuration(ConfigError),
    DispatcherUnavailable { dispatcher: String },
    Codec(CodecError),
    DispatchInvocation {
        dispatcher: String,
        failure: InvocationFailure,
    },
}

impl BridgeError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::Configuration(_) => ErrorKind::Configuration,
            BridgeError::DispatcherUnavailable { .. } => ErrorKind::DispatcherUnavailable,
            BridgeError::Codec(_) => ErrorKind::Codec,
            BridgeError::DispatchInvocation { .. } => ErrorKind::DispatchInvocation,
        }
    }

    /// HTTP status reported by the dispatcher, if the failure carries one
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            BridgeError::DispatchInvocation { failure, .. } => failure.status(),
            _ => None,
        }
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::Configuration(e) => write!(f, "{e}"),
            BridgeError::DispatcherUnavailable { dispatcher } => {
                write!(f, "dispatcher '{dispatcher}' is not bound")
            }
            BridgeError::Codec(e) => write!(f, "codec error: {e}"),
            BridgeError::DispatchInvocation {
                dispatcher,
                failure,
            } => write!(f, "dispatcher '{dispatcher}' failed: {failure}"),
        }
    }
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BridgeError::Configuration(e) => Some(e),
            BridgeError::Codec(e) => Some(e),
            BridgeError::DispatchInvocation {
                failure: InvocationFailure::Error(e),
                ..
            } => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for BridgeError {
    fn from(e: ConfigError) -> Self {
        BridgeError::Configuration(e)
    }
}

impl From<CodecError> for BridgeError {
    fn from(e: CodecError) -> Self {
        BridgeError::Codec(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            BridgeError::from(ConfigError::NoPathRules).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            BridgeError::from(CodecError::CompressedFrame).kind(),
            ErrorKind::Codec
        );
        let err = BridgeError::DispatcherUnavailable {
            dispatcher: "engine".into(),
        };
        assert_eq!(err.kind(), ErrorKind::DispatcherUnavailable);
        assert_eq!(err.to_string(), "dispatcher 'engine' is not bound");
    }

    #[test]
    fn test_invocation_status() {
        let err = BridgeError::DispatchInvocation {
            dispatcher: "engine".into(),
            failure: InvocationFailure::Error(DispatchError::NotFound { path: "/x".into() }),
        };
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert!(std::error::Error::source(&err).is_some());

        let err = BridgeError::DispatchInvocation {
            dispatcher: "engine".into(),
            failure: InvocationFailure::Panic {
                message: "boom".into(),
            },
        };
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "dispatcher 'engine' failed: dispatcher panicked: boom");
    }
}
