use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{CodecError, MessageCodec, JSON_CONTENT_TYPE};

/// JSON codec for serde types.
///
/// Useful when the dispatcher's resources speak JSON rather than protobuf;
/// the same message types can derive both `prost::Message` and serde.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonCodec;

impl<M> MessageCodec<M> for JsonCodec
where
    M: Serialize + DeserializeOwned,
{
    fn content_type(&self) -> &'static str {
        JSON_CONTENT_TYPE
    }

    fn encode(&self, message: &M) -> Result<Bytes, CodecError> {
        serde_json::to_vec(message)
            .map(Bytes::from)
            .map_err(|e| CodecError::Encode {
                type_name: std::any::type_name::<M>(),
                reason: e.to_string(),
            })
    }

    fn decode(&self, bytes: &[u8]) -> Result<M, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode {
            type_name: std::any::type_name::<M>(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Greeting {
        message: String,
    }

    #[test]
    fn test_json_roundtrip() {
        let msg = Greeting {
            message: "hi".into(),
        };
        let bytes = JsonCodec.encode(&msg).unwrap();
        assert_eq!(&bytes[..], br#"{"message":"hi"}"#);
        let back: Greeting = JsonCodec.decode(&bytes).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_truncated_json_is_decode_error() {
        let err = MessageCodec::<Greeting>::decode(&JsonCodec, br#"{"message":"#).unwrap_err();
        assert!(matches!(err, CodecError::Decode { .. }));
    }

    #[test]
    fn test_accepts_charset_parameter() {
        assert!(MessageCodec::<Greeting>::accepts(
            &JsonCodec,
            "application/json; charset=utf-8"
        ));
    }
}
