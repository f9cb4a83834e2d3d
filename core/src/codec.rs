//! Serialization boundary between the publisher and the subscriber.
//!
//! The codec is a pure transformation: it turns a [`TodoDraft`] into bytes
//! and back, and nothing else. Decoding checks structure only (required
//! fields, field types, no unknown fields); domain validation happens
//! downstream in the persistence service.
//!
//! The interchange format is JSON so payloads round-trip every draft field
//! and stay inspectable on the topic.

use crate::todo::TodoDraft;
use thiserror::Error;

/// Errors at the serialization boundary.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The draft could not be represented in the interchange format.
    #[error("failed to encode command: {0}")]
    Encode(String),

    /// The bytes are not well-formed or do not match the expected shape.
    #[error("failed to decode command: {0}")]
    Decode(String),
}

/// Encode a draft to its wire representation.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if the draft contains a value that cannot
/// be represented as JSON. This does not happen for the flat record types
/// used here, but the contract handles it.
pub fn encode(draft: &TodoDraft) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(draft).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Decode a draft from its wire representation.
///
/// Decoding is total apart from structural failures: a successful decode
/// always yields a fully populated draft, never a partial one.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] if the bytes are not valid JSON, a
/// required field is missing, a field has the wrong type, or an unknown
/// field is present.
pub fn decode(bytes: &[u8]) -> Result<TodoDraft, CodecError> {
    serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn round_trip_preserves_all_fields() {
        let draft = TodoDraft {
            title: "buy milk".to_string(),
            description: Some("two liters".to_string()),
            done: false,
        };

        let bytes = encode(&draft).unwrap();
        let decoded = decode(&bytes).unwrap();

        assert_eq!(decoded, draft);
    }

    #[test]
    fn decode_rejects_invalid_json() {
        let result = decode(b"{not json");
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }

    #[test]
    fn decode_rejects_missing_title() {
        let result = decode(br#"{"done":true}"#);
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }

    #[test]
    fn decode_rejects_wrong_field_type() {
        let result = decode(br#"{"title":"x","done":"yes"}"#);
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }

    #[test]
    fn decode_rejects_empty_input() {
        let result = decode(b"");
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }

    proptest! {
        #[test]
        fn round_trip_law(
            title in ".*",
            description in proptest::option::of(".*"),
            done in any::<bool>(),
        ) {
            let draft = TodoDraft { title, description, done };
            let decoded = decode(&encode(&draft).unwrap()).unwrap();
            prop_assert_eq!(decoded, draft);
        }

        #[test]
        fn decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            // Arbitrary bytes either decode to a full draft or fail cleanly.
            let _ = decode(&bytes);
        }
    }
}
