use bytes::{Bytes, BytesMut};
use prost::Message;

use super::{media_type, CodecError, Framing, MessageCodec, GRPC_CONTENT_TYPE};

/// Protobuf binary codec for any `prost` message.
///
/// Declares `application/grpc` and also reads `application/grpc+proto` bodies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProstCodec {
    framing: Framing,
}

impl ProstCodec {
    /// Codec producing raw, unframed bodies
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_framing(framing: Framing) -> Self {
        Self { framing }
    }

    #[must_use]
    pub fn framing(&self) -> Framing {
        self.framing
    }
}

impl<M> MessageCodec<M> for ProstCodec
where
    M: Message + Default,
{
    fn content_type(&self) -> &'static str {
        GRPC_CONTENT_TYPE
    }

    fn accepts(&self, content_type: &str) -> bool {
        let media = media_type(content_type);
        media.eq_ignore_ascii_case(GRPC_CONTENT_TYPE)
            || media.eq_ignore_ascii_case("application/grpc+proto")
    }

    fn encode(&self, message: &M) -> Result<Bytes, CodecError> {
        let len = message.encoded_len();
        let mut buf = BytesMut::with_capacity(self.framing.header_len() + len);
        self.framing.write_header(len, &mut buf)?;
        message.encode(&mut buf).map_err(|e| CodecError::Encode {
            type_name: std::any::type_name::<M>(),
            reason: e.to_string(),
        })?;
        Ok(buf.freeze())
    }

    fn decode(&self, bytes: &[u8]) -> Result<M, CodecError> {
        let payload = self.framing.unframe(bytes)?;
        M::decode(payload).map_err(|e| CodecError::Decode {
            type_name: std::any::type_name::<M>(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, prost::Message)]
    struct Probe {
        #[prost(string, tag = "1")]
        name: String,
        #[prost(uint32, tag = "2")]
        count: u32,
    }

    #[test]
    fn test_raw_encoding_has_no_prefix() {
        let codec = ProstCodec::new();
        let msg = Probe {
            name: "Ada".into(),
            count: 3,
        };
        let bytes = MessageCodec::<Probe>::encode(&codec, &msg).unwrap();
        assert_eq!(bytes.len(), msg.encoded_len());
        assert_eq!(bytes.to_vec(), msg.encode_to_vec());
    }

    #[test]
    fn test_length_prefixed_roundtrip() {
        let codec = ProstCodec::with_framing(Framing::LengthPrefixed);
        let msg = Probe {
            name: "Grace".into(),
            count: 7,
        };
        let bytes = MessageCodec::<Probe>::encode(&codec, &msg).unwrap();
        assert_eq!(bytes.len(), msg.encoded_len() + 5);
        assert_eq!(bytes[0], 0);
        let back: Probe = codec.decode(&bytes).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_malformed_bytes_fail_to_decode() {
        let codec = ProstCodec::new();
        let err = MessageCodec::<Probe>::decode(&codec, &[0x0A, 0xFF, 0xFF, 0xFF]).unwrap_err();
        assert!(matches!(err, CodecError::Decode { .. }));
    }

    #[test]
    fn test_accepts_grpc_variants() {
        let codec = ProstCodec::new();
        assert!(MessageCodec::<Probe>::accepts(&codec, "application/grpc"));
        assert!(MessageCodec::<Probe>::accepts(&codec, "application/grpc+proto"));
        assert!(!MessageCodec::<Probe>::accepts(&codec, "application/json"));
    }
}
