//! Protocol Codec
//!
//! Encodes and decodes [`ProtocolMessage`] as a compact JSON envelope.
//! Decoding is strict about required fields (a missing specification is an
//! error) and lenient about optional ones (a missing correlation id decodes
//! to the "no correlation" sentinel).

use super::messages::ProtocolMessage;

/// Codec failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CodecError {
    /// The payload is not a valid protocol message.
    #[error("malformed protocol message: {message}")]
    Malformed {
        /// Error details.
        message: String,
    },
}

/// Encode a message to bytes.
///
/// # Errors
///
/// Returns an error when the message cannot be serialized.
pub fn encode(message: &ProtocolMessage) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(message).map_err(|e| CodecError::Malformed {
        message: e.to_string(),
    })
}

/// Decode a message from bytes.
///
/// # Errors
///
/// Returns an error for unknown kinds, missing required fields, or invalid
/// payloads. Absent optional fields decode to their defaults and never
/// fail.
pub fn decode(bytes: &[u8]) -> Result<ProtocolMessage, CodecError> {
    serde_json::from_slice(bytes).map_err(|e| CodecError::Malformed {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::super::messages::{NO_CORRELATION, ResultCode};
    use super::*;
    use crate::domain::ids::ExternalIdBundle;
    use crate::domain::message::FieldMessage;
    use crate::domain::specification::LiveDataSpecification;

    fn spec() -> LiveDataSpecification {
        LiveDataSpecification::new("std", ExternalIdBundle::of("TICKER", "AAPL"))
    }

    fn round_trip(message: &ProtocolMessage) -> ProtocolMessage {
        decode(&encode(message).unwrap()).unwrap()
    }

    #[test]
    fn round_trips_every_kind() {
        let messages = vec![
            ProtocolMessage::ConnectionRequest {
                correlation_id: 7,
                user: "trader1".to_string(),
                password: Some("secret".to_string()),
            },
            ProtocolMessage::ConnectionResponse {
                correlation_id: 7,
                result: ResultCode::Success,
                message: None,
                available_servers: vec!["primary".to_string(), "backup".to_string()],
            },
            ProtocolMessage::SnapshotRequest {
                correlation_id: 8,
                specification: spec(),
            },
            ProtocolMessage::SnapshotResponse {
                correlation_id: 8,
                result: ResultCode::Success,
                message: None,
                subscription_id: "TICKER~AAPL".to_string(),
                normalization_scheme: "std".to_string(),
                snapshot: FieldMessage::new().with("BID", 100.5),
            },
            ProtocolMessage::SubscriptionResponse {
                correlation_id: 9,
                result: ResultCode::NotPresent,
                message: Some("unknown rule set".to_string()),
                subscription_id: "TICKER~AAPL".to_string(),
                normalization_scheme: "bogus".to_string(),
                topic: String::new(),
                snapshot: FieldMessage::new(),
            },
            ProtocolMessage::Unsubscribe {
                correlation_id: 10,
                specification: spec(),
            },
            ProtocolMessage::LiveDataUpdate {
                topic: "livedata.AAPL.std".to_string(),
                fields: FieldMessage::new().with("BID", 100.5).with("ASK", 100.7),
            },
        ];

        for message in messages {
            let decoded = round_trip(&message);
            assert_eq!(decoded, message);
            assert_eq!(decoded.kind(), message.kind());
        }
    }

    #[test]
    fn missing_correlation_id_decodes_to_sentinel() {
        let json = br#"{"kind":"CONNECTION_REQUEST","user":"trader1"}"#;
        let decoded = decode(json).unwrap();

        assert_eq!(decoded.correlation_id(), Some(NO_CORRELATION));
        assert!(matches!(
            decoded,
            ProtocolMessage::ConnectionRequest { password: None, .. }
        ));
    }

    #[test]
    fn live_data_update_carries_no_correlation_id() {
        let message = ProtocolMessage::LiveDataUpdate {
            topic: "t".to_string(),
            fields: FieldMessage::new(),
        };

        assert!(message.correlation_id().is_none());
        let json = String::from_utf8(encode(&message).unwrap()).unwrap();
        assert!(!json.contains("correlation_id"));
    }

    #[test]
    fn missing_required_field_is_an_error() {
        // SNAPSHOT_REQUEST without its specification.
        let json = br#"{"kind":"SNAPSHOT_REQUEST","correlation_id":3}"#;
        assert!(matches!(decode(json), Err(CodecError::Malformed { .. })));
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let json = br#"{"kind":"HEARTBEAT"}"#;
        assert!(matches!(decode(json), Err(CodecError::Malformed { .. })));
    }

    #[test]
    fn kind_tag_is_explicit_in_the_wire_form() {
        let message = ProtocolMessage::SnapshotRequest {
            correlation_id: 1,
            specification: spec(),
        };
        let json = String::from_utf8(encode(&message).unwrap()).unwrap();
        assert!(json.contains(r#""kind":"SNAPSHOT_REQUEST""#));
    }

    #[test]
    fn absent_optional_lists_decode_to_defaults() {
        let json = br#"{"kind":"CONNECTION_RESPONSE","result":"SUCCESS"}"#;
        let decoded = decode(json).unwrap();

        match decoded {
            ProtocolMessage::ConnectionResponse {
                correlation_id,
                result,
                message,
                available_servers,
            } => {
                assert_eq!(correlation_id, NO_CORRELATION);
                assert_eq!(result, ResultCode::Success);
                assert!(message.is_none());
                assert!(available_servers.is_empty());
            }
            other => panic!("unexpected kind: {}", other.kind()),
        }
    }
}
