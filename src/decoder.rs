//! Inbound frame decoding.
//!
//! Every inbound frame is expected to be `{"type": "<name>", "data": {...}}`.
//! Decoding fails open: a malformed frame or an unrecognized type name is
//! classified (so the router can log it) and dropped; it never reaches the
//! bus and never affects connection state.

use serde::Deserialize;
use serde_json::Value;

use crate::models::{BroadcastEvent, EventKind};

/// Why an inbound frame was dropped.
#[derive(Debug)]
pub enum DecodeError {
    /// The frame is not valid JSON, lacks a `type` field, or its payload
    /// does not match the shape registered for its type.
    Malformed(String),
    /// The `type` name is outside the closed event registry. Not a protocol
    /// error, since newer servers may broadcast kinds this client predates.
    UnknownType(String),
}

#[derive(Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Option<Value>,
}

/// Decode one inbound text frame into a typed broadcast event.
///
/// A missing `data` field is treated as an empty payload object before the
/// typed decode runs; the payload shape registered for the type then
/// decides whether the frame is usable.
pub fn decode_frame(text: &str) -> Result<BroadcastEvent, DecodeError> {
    let raw: RawFrame = serde_json::from_str(text)
        .map_err(|e| DecodeError::Malformed(e.to_string()))?;

    if EventKind::from_wire_name(&raw.kind).is_none() {
        return Err(DecodeError::UnknownType(raw.kind));
    }

    let data = raw.data.unwrap_or_else(|| Value::Object(Default::default()));
    let frame = serde_json::json!({ "type": raw.kind, "data": data });
    serde_json::from_value(frame).map_err(|e| DecodeError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderCategory;

    #[test]
    fn test_decodes_item_served_frame() {
        let event = decode_frame(
            r#"{"type":"itemServed","data":{"orderId":"X","itemCode":"T-01-001-1","isServed":true}}"#,
        )
        .unwrap();
        match event {
            BroadcastEvent::ItemServed {
                order_id,
                item_code,
                is_served,
                ..
            } => {
                assert_eq!(order_id, "X");
                assert_eq!(item_code.as_deref(), Some("T-01-001-1"));
                assert!(is_served);
            },
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_decodes_delete_order_with_reason() {
        let event = decode_frame(
            r#"{"type":"deleteOrder","data":{"orderId":"Y","reason":"customer cancelled"}}"#,
        )
        .unwrap();
        match event {
            BroadcastEvent::DeleteOrder { order_id, reason, .. } => {
                assert_eq!(order_id, "Y");
                assert_eq!(reason.as_deref(), Some("customer cancelled"));
            },
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_decodes_full_payload() {
        let event = decode_frame(
            r#"{"type":"newOrder","data":{"orderId":"7","orderCode":"T-02-004","category":"takeout"}}"#,
        )
        .unwrap();
        match event {
            BroadcastEvent::NewOrder {
                order_id,
                order_code,
                category,
            } => {
                assert_eq!(order_id, "7");
                assert_eq!(order_code.as_deref(), Some("T-02-004"));
                assert_eq!(category, Some(OrderCategory::Takeout));
            },
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type_is_classified_not_malformed() {
        match decode_frame(r#"{"type":"tableMoved","data":{}}"#) {
            Err(DecodeError::UnknownType(name)) => assert_eq!(name, "tableMoved"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        assert!(matches!(
            decode_frame("not a frame"),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_type_field_is_malformed() {
        assert!(matches!(
            decode_frame(r#"{"data":{"orderId":"1"}}"#),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_data_defaults_to_empty_object() {
        // The default empty payload still has to satisfy the typed shape;
        // orderId is required, so this is dropped as malformed rather than
        // crashing on the absent data field.
        assert!(matches!(
            decode_frame(r#"{"type":"newOrder"}"#),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_payload_type_mismatch_is_malformed() {
        assert!(matches!(
            decode_frame(r#"{"type":"itemServed","data":{"orderId":"X","isServed":"yes"}}"#),
            Err(DecodeError::Malformed(_))
        ));
        assert!(matches!(
            decode_frame(r#"{"type":"newOrder","data":5}"#),
            Err(DecodeError::Malformed(_))
        ));
    }
}
