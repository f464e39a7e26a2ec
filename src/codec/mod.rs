//! # Codec Module
//!
//! Converts typed messages to and from the raw bytes carried in an emulated
//! request or response body. Codecs are transport independent: they never see
//! a socket, only byte buffers.
//!
//! Two codecs ship with the crate:
//!
//! - [`ProstCodec`] - protobuf binary encoding, declared as `application/grpc`
//! - [`JsonCodec`] - serde JSON encoding, declared as `application/json`
//!
//! The codec's content-type marker is what the emulated request reports to the
//! dispatcher, which uses it to pick the matching body reader on its side.
//!
//! ## Framing
//!
//! Bodies are raw by default: the request body is exactly the serialized
//! message with no prefix. [`Framing::LengthPrefixed`] enables the gRPC
//! five-byte message prefix (compression flag + big-endian length) for
//! dispatchers that expect wire-framed payloads.

mod binary;
mod json;

pub use binary::ProstCodec;
pub use json::JsonCodec;

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content-type marker for protobuf-encoded message bodies
pub const GRPC_CONTENT_TYPE: &str = "application/grpc";

/// Content-type marker for JSON-encoded message bodies
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Size of the gRPC message prefix: 1 flag byte + 4 length bytes
pub const FRAME_HEADER_LEN: usize = 5;

/// Serialize and deserialize messages of type `M`.
///
/// Decoding never returns a partial message: either the whole buffer is a
/// well-formed encoding of `M` or the call fails with [`CodecError`].
pub trait MessageCodec<M>: Send + Sync {
    /// Media type this codec declares for its payloads
    fn content_type(&self) -> &'static str;

    /// Whether a body declared with `content_type` can be read by this codec.
    ///
    /// Media type parameters (`; charset=...`) are ignored.
    fn accepts(&self, content_type: &str) -> bool {
        media_type(content_type).eq_ignore_ascii_case(self.content_type())
    }

    fn encode(&self, message: &M) -> Result<Bytes, CodecError>;

    fn decode(&self, bytes: &[u8]) -> Result<M, CodecError>;
}

/// Strip parameters from a content-type value: `application/json; charset=utf-8` -> `application/json`
#[must_use]
pub fn media_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .map(str::trim)
        .unwrap_or_default()
}

/// How a serialized message is laid out inside a body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    /// Body is exactly the serialized message
    #[default]
    Raw,
    /// Body is prefixed with a compression flag and a big-endian u32 length
    LengthPrefixed,
}

impl Framing {
    /// Bytes this framing adds in front of a payload
    #[must_use]
    pub fn header_len(self) -> usize {
        match self {
            Framing::Raw => 0,
            Framing::LengthPrefixed => FRAME_HEADER_LEN,
        }
    }

    /// Write the frame header for a payload of `len` bytes into `buf`.
    pub(crate) fn write_header(self, len: usize, buf: &mut BytesMut) -> Result<(), CodecError> {
        if self == Framing::Raw {
            return Ok(());
        }
        let len = u32::try_from(len).map_err(|_| CodecError::FrameTooLarge { len })?;
        buf.put_u8(0);
        buf.put_u32(len);
        Ok(())
    }

    /// Return the payload carried by `bytes`, validating the frame header if any.
    pub fn unframe(self, bytes: &[u8]) -> Result<&[u8], CodecError> {
        match self {
            Framing::Raw => Ok(bytes),
            Framing::LengthPrefixed => {
                let Some((header, payload)) = bytes.split_at_checked(FRAME_HEADER_LEN) else {
                    return Err(CodecError::TruncatedFrame { len: bytes.len() });
                };
                if header[0] != 0 {
                    return Err(CodecError::CompressedFrame);
                }
                let declared =
                    u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;
                if declared != payload.len() {
                    return Err(CodecError::FrameLength {
                        declared,
                        actual: payload.len(),
                    });
                }
                Ok(payload)
            }
        }
    }
}

/// Errors produced while encoding or decoding a message body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The message could not be serialized
    Encode {
        type_name: &'static str,
        reason: String,
    },
    /// The bytes are not a well-formed encoding of the target type
    Decode {
        type_name: &'static str,
        reason: String,
    },
    /// A length-prefixed body is shorter than the frame header
    TruncatedFrame { len: usize },
    /// The frame header's length does not match the payload
    FrameLength { declared: usize, actual: usize },
    /// The frame is flagged as compressed; compression is not supported
    CompressedFrame,
    /// Payload does not fit a u32 frame length
    FrameTooLarge { len: usize },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Encode { type_name, reason } => {
                write!(f, "failed to encode {type_name}: {reason}")
            }
            CodecError::Decode { type_name, reason } => {
                write!(f, "failed to decode {type_name}: {reason}")
            }
            CodecError::TruncatedFrame { len } => write!(
                f,
                "truncated frame: {len} bytes is shorter than the {FRAME_HEADER_LEN}-byte header"
            ),
            CodecError::FrameLength { declared, actual } => write!(
                f,
                "frame length mismatch: header declares {declared} bytes, body carries {actual}"
            ),
            CodecError::CompressedFrame => write!(f, "compressed frames are not supported"),
            CodecError::FrameTooLarge { len } => {
                write!(f, "payload of {len} bytes exceeds the maximum frame length")
            }
        }
    }
}

impl std::error::Error for CodecError {}
