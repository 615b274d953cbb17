//! Wire framing: `<keyword>[ <json>]<0x04>` in both directions.
//!
//! Messages are delimited on the byte stream by a single end-of-transmission
//! byte (0x04); there is no length prefix. The keyword runs up to the first
//! space, everything after it is one JSON value. Payloads may themselves
//! contain spaces, so decoding splits on the *first* space only.

use serde_json::Value;

use crate::error::CodecError;

/// End-of-transmission byte delimiting messages on the stream.
pub const TERMINATOR: u8 = 0x04;

/// One decoded wire message.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// Command or response keyword (`login`, `results`, `ok`, `error`, …).
    pub keyword: String,
    /// JSON payload; [`Value::Null`] when the message carried none.
    pub payload: Value,
}

impl Message {
    /// Build a message from a keyword and payload.
    #[must_use]
    pub fn new(keyword: impl Into<String>, payload: Value) -> Self {
        Self {
            keyword: keyword.into(),
            payload,
        }
    }
}

/// Encode a command and its arguments into one framed message.
///
/// A null `args` encodes as a bare keyword. JSON text cannot contain the
/// terminator byte, so the frame boundary is unambiguous.
#[must_use]
pub fn encode(command: &str, args: &Value) -> Vec<u8> {
    let mut frame = command.as_bytes().to_vec();
    if !args.is_null() {
        frame.push(b' ');
        frame.extend_from_slice(args.to_string().as_bytes());
    }
    frame.push(TERMINATOR);
    frame
}

/// Decode one framed message.
///
/// Strips a trailing terminator if present. A message without a payload
/// decodes to [`Value::Null`]; the absent-payload and null-payload forms
/// are the same on the wire, which is what makes `decode(encode(k, a))`
/// round-trip.
pub fn decode(bytes: &[u8]) -> Result<Message, CodecError> {
    let bytes = bytes.strip_suffix(&[TERMINATOR]).unwrap_or(bytes);
    let text = std::str::from_utf8(bytes)?;
    match text.split_once(' ') {
        Some((keyword, payload)) => {
            let payload = serde_json::from_str(payload).map_err(|source| CodecError::Payload {
                keyword: keyword.to_owned(),
                source,
            })?;
            Ok(Message::new(keyword, payload))
        }
        None => Ok(Message::new(text, Value::Null)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn encode_bare_keyword() {
        assert_eq!(encode("dbstats", &Value::Null), b"dbstats\x04");
    }

    #[test]
    fn encode_appends_payload_after_single_space() {
        let frame = encode("login", &json!({"protocol": 1}));
        assert_eq!(frame, b"login {\"protocol\":1}\x04");
    }

    #[test]
    fn terminator_never_occurs_before_end_of_frame() {
        let frame = encode(
            "set ulist 17",
            &json!({"notes": "multi word notes, with punctuation"}),
        );
        let inner = &frame[..frame.len() - 1];
        assert!(!inner.contains(&TERMINATOR));
        assert_eq!(*frame.last().unwrap(), TERMINATOR);
    }

    #[test]
    fn round_trip_with_args() {
        let args = json!({"id": 17, "title": "some game", "tags": [1, 2, 3]});
        let msg = decode(&encode("results", &args)).unwrap();
        assert_eq!(msg, Message::new("results", args));
    }

    #[test]
    fn round_trip_without_args() {
        let msg = decode(&encode("ok", &Value::Null)).unwrap();
        assert_eq!(msg, Message::new("ok", Value::Null));
    }

    #[test]
    fn keyword_only_decodes_to_null_payload() {
        let msg = decode(b"ok\x04").unwrap();
        assert_eq!(msg.keyword, "ok");
        assert!(msg.payload.is_null());
    }

    #[test]
    fn decode_without_terminator() {
        let msg = decode(b"ok").unwrap();
        assert_eq!(msg.keyword, "ok");
    }

    #[test]
    fn splits_on_first_space_only() {
        let msg = decode(b"results {\"title\":\"a b c\",\"more\":false}\x04").unwrap();
        assert_eq!(msg.keyword, "results");
        assert_eq!(msg.payload["title"], "a b c");
        assert_eq!(msg.payload["more"], false);
    }

    #[test]
    fn multibyte_payload_round_trips() {
        let args = json!({"original": "素晴らしき日々"});
        let msg = decode(&encode("results", &args)).unwrap();
        assert_eq!(msg.payload["original"], "素晴らしき日々");
    }

    #[test]
    fn malformed_payload_is_an_error_not_a_panic() {
        let err = decode(b"results {broken\x04").unwrap_err();
        match err {
            CodecError::Payload { keyword, .. } => assert_eq!(keyword, "results"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let err = decode(b"results \xff\xfe\x04").unwrap_err();
        assert!(matches!(err, CodecError::Utf8(_)));
    }
}
