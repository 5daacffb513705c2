//! Line codec for the tooling protocol
//!
//! One JSON object per line in both directions. These helpers wrap
//! serde_json with the error mapping the transports expect: an
//! outbound request that cannot be encoded is a transport failure (the
//! call never reached the wire), while an inbound line that cannot be
//! decoded is the *server's* problem and gets reported to the read
//! loop so it can log and drop the line.
//!
//! The newline itself is appended by the writer, not the codec, so the
//! encoded string is a complete message minus framing.

use crate::error::{Error, Result};
use crate::types::{RpcRequest, RpcResponse};

/// Encode a request as a single JSON line (without the trailing newline)
///
/// # Errors
///
/// Returns `Error::Transport` if the request cannot be serialized.
/// Params are plain JSON values by the time they get here, so this
/// only fires on pathological input such as non-string map keys.
pub fn encode_request(req: &RpcRequest) -> Result<String> {
    serde_json::to_string(req)
        .map_err(|e| Error::Transport(format!("failed to encode request: {}", e)))
}

/// Decode one inbound line as a response
///
/// # Errors
///
/// Returns the serde error message so the read loop can log what the
/// server actually sent. Callers drop the line either way; a bad line
/// must never fail an unrelated pending call.
pub fn decode_response(line: &str) -> std::result::Result<RpcResponse, String> {
    serde_json::from_str(line).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Id;

    #[test]
    fn test_encode_decode_round_trip() {
        let req = RpcRequest::new(
            "set_shader",
            Some(serde_json::json!({"code": "x", "noSnapshot": true})),
            Id::Number(1),
        );
        let encoded = encode_request(&req).unwrap();
        assert!(!encoded.contains('\n'));

        let response_line = r#"{"id":1,"result":{"status":"ok"}}"#;
        let decoded = decode_response(response_line).unwrap();
        assert_eq!(decoded.id, Id::Number(1));
        assert!(decoded.is_success());
    }

    #[test]
    fn test_decode_error_envelope() {
        let line = r#"{"id":5,"error":{"code":-32000,"message":"compile failed"}}"#;
        let decoded = decode_response(line).unwrap();
        assert!(decoded.is_error());
        assert_eq!(decoded.error.unwrap().code, -32000);
    }

    #[test]
    fn test_decode_garbage_line() {
        assert!(decode_response("not json at all").is_err());
        assert!(decode_response("").is_err());
    }

    #[test]
    fn test_decode_response_without_result_or_error() {
        // Structurally valid but semantically empty; decoding succeeds
        // and the read loop decides what to do with it.
        let decoded = decode_response(r#"{"id":9}"#).unwrap();
        assert!(!decoded.is_success());
        assert!(!decoded.is_error());
    }
}
