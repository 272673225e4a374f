//! Inbound frame classification.
//!
//! Every inbound WebSocket text frame is either a response to an in-flight
//! request (it carries an integer `id`) or a notification (no `id`). The
//! classifier is strict about identifiers: a non-integer `id` is a decode
//! error, never a silent match against an unrelated request.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::RequestId;

use super::request::{Response, RpcFault};

// ============================================================================
// Frame
// ============================================================================

/// A classified inbound frame.
#[derive(Debug, Clone)]
pub enum Frame {
    /// Response to an in-flight request.
    Response(Response),

    /// Server push message without a correlation id.
    ///
    /// Routed to the client event subscription, never to a pending request.
    Notification {
        /// Method name of the push message.
        method: String,
        /// Message payload.
        params: Value,
    },
}

// ============================================================================
// Decoding
// ============================================================================

/// Decodes a WebSocket text frame into a [`Frame`].
///
/// # Errors
///
/// Returns [`Error::Decode`] when the payload is not valid JSON, when a
/// response `id` is not an exact unsigned integer, or when the frame is
/// neither a response nor a notification.
pub fn decode_frame(text: &str) -> Result<Frame> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| Error::decode(format!("invalid JSON: {e}")))?;

    let Value::Object(ref object) = value else {
        return Err(Error::decode("frame is not a JSON object"));
    };

    let method = object
        .get("method")
        .and_then(Value::as_str)
        .map(str::to_string);

    match object.get("id") {
        // Correlated response. The id must be an exact unsigned integer;
        // serde_json keeps integers exact, so floats and strings fail here.
        Some(id_value) => {
            let id = id_value
                .as_u64()
                .ok_or_else(|| Error::decode(format!("non-integer response id: {id_value}")))?;

            let outcome = match (object.get("result"), object.get("error")) {
                (_, Some(error)) => {
                    let fault: RpcFault = serde_json::from_value(error.clone())
                        .map_err(|e| Error::decode(format!("malformed error object: {e}")))?;
                    Err(fault)
                }
                (Some(result), None) => Ok(result.clone()),
                (None, None) => {
                    return Err(Error::decode("response has neither result nor error"));
                }
            };

            Ok(Frame::Response(Response {
                id: RequestId::new(id),
                method,
                outcome,
            }))
        }

        // No id: notification.
        None => {
            let method = method.ok_or_else(|| Error::decode("notification without method"))?;
            let params = object.get("params").cloned().unwrap_or(Value::Null);
            Ok(Frame::Notification { method, params })
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_decode_success_response() {
        let text = r#"{
            "jsonrpc": "2.0",
            "method": "queryNetwork/tip",
            "result": { "slot": 1000, "hash": "abc" },
            "id": 1
        }"#;

        match decode_frame(text).expect("decode") {
            Frame::Response(response) => {
                assert_eq!(response.id, RequestId::new(1));
                assert!(response.is_success());
                let value = response.into_result().expect("result");
                assert_eq!(value["slot"], 1000);
                assert_eq!(value["hash"], "abc");
            }
            Frame::Notification { .. } => panic!("expected response"),
        }
    }

    #[test]
    fn test_decode_error_response() {
        let text = r#"{
            "jsonrpc": "2.0",
            "method": "findIntersection",
            "error": { "code": 1000, "message": "No intersection found" },
            "id": 7
        }"#;

        match decode_frame(text).expect("decode") {
            Frame::Response(response) => {
                assert_eq!(response.id, RequestId::new(7));
                assert!(!response.is_success());
                assert!(matches!(
                    response.into_result(),
                    Err(Error::IntersectionNotFound)
                ));
            }
            Frame::Notification { .. } => panic!("expected response"),
        }
    }

    #[test]
    fn test_decode_notification() {
        let text = r#"{
            "jsonrpc": "2.0",
            "method": "nodeStatusChanged",
            "params": { "status": "syncing" }
        }"#;

        match decode_frame(text).expect("decode") {
            Frame::Notification { method, params } => {
                assert_eq!(method, "nodeStatusChanged");
                assert_eq!(params["status"], "syncing");
            }
            Frame::Response(_) => panic!("expected notification"),
        }
    }

    #[test]
    fn test_reject_float_id() {
        let text = r#"{ "jsonrpc": "2.0", "result": {}, "id": 1.5 }"#;
        assert!(matches!(decode_frame(text), Err(Error::Decode { .. })));
    }

    #[test]
    fn test_reject_response_without_result_or_error() {
        let text = r#"{ "jsonrpc": "2.0", "method": "nextBlock", "id": 3 }"#;
        assert!(matches!(decode_frame(text), Err(Error::Decode { .. })));
    }

    #[test]
    fn test_reject_non_json() {
        assert!(matches!(
            decode_frame("not json at all"),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn test_reject_non_object() {
        assert!(matches!(decode_frame("[1,2,3]"), Err(Error::Decode { .. })));
    }

    #[test]
    fn test_round_trip_encoding() {
        let request = crate::protocol::Request::new(
            RequestId::new(9),
            "queryLedgerState/tip",
            json!({}),
        );
        let encoded = request.encode().expect("encode");

        // Server echoes the id back with a result; the decoded payload is
        // exactly what the server sent.
        let reply = format!(
            r#"{{"jsonrpc":"2.0","method":"queryLedgerState/tip","result":{{"slot":42}},"id":{}}}"#,
            RequestId::new(9)
        );
        assert!(encoded.contains(r#""id":9"#));
        match decode_frame(&reply).expect("decode") {
            Frame::Response(response) => {
                assert_eq!(response.id, RequestId::new(9));
                assert_eq!(response.into_result().expect("result"), json!({"slot": 42}));
            }
            Frame::Notification { .. } => panic!("expected response"),
        }
    }

    proptest! {
        // Slot numbers survive the codec exactly for the full u64 range.
        #[test]
        fn prop_slot_integers_preserved(slot in any::<u64>(), id in 1u64..u64::MAX) {
            let text = format!(
                r#"{{"jsonrpc":"2.0","result":{{"slot":{slot}}},"id":{id}}}"#
            );

            match decode_frame(&text).expect("decode") {
                Frame::Response(response) => {
                    let value = response.into_result().expect("result");
                    prop_assert_eq!(value["slot"].as_u64(), Some(slot));
                }
                Frame::Notification { .. } => prop_assert!(false, "expected response"),
            }
        }
    }
}
