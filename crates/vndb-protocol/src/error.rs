//! Error types for framing and session lifecycle.
//!
//! Two domains, kept separate because they fail differently:
//!
//! - [`CodecError`]: a single malformed message. Recoverable: it surfaces
//!   on the waiter whose response failed to parse, and the session keeps
//!   running.
//! - [`SessionError`]: connection and lifecycle failures. Handshake errors
//!   are returned to the caller of `connect`; session-fatal errors are
//!   delivered to every outstanding waiter and recorded so later dispatch
//!   calls report the same fault.

use thiserror::Error;

/// Errors produced while decoding a wire message.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The message bytes are not valid UTF-8.
    #[error("message is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The payload after the keyword is not valid JSON.
    #[error("malformed `{keyword}` payload: {source}")]
    Payload {
        /// Keyword of the message whose payload failed to parse.
        keyword: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors produced by session creation, dispatch, and teardown.
#[derive(Debug, Error)]
pub enum SessionError {
    /// TCP connect, TLS, or transport I/O failure.
    #[error("connection failed: {0}")]
    Io(#[from] std::io::Error),

    /// The configured host is not a valid TLS server name.
    #[error("invalid TLS server name `{host}`")]
    ServerName {
        /// The rejected host string.
        host: String,
    },

    /// The login handshake did not produce a well-formed response.
    #[error("login handshake failed: {reason}")]
    Handshake {
        /// What went wrong reading or decoding the login response.
        reason: String,
    },

    /// A response could not be decoded. Delivered only to the waiter whose
    /// response was malformed; the session stays up.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A response arrived with no request outstanding. The request/response
    /// streams can no longer be matched, so the session shuts down.
    #[error("protocol desynchronized: response arrived with no request outstanding")]
    Desynchronized,

    /// The transport failed or the server hung up with requests in flight.
    #[error("connection lost: {reason}")]
    ConnectionLost {
        /// Description of the transport failure.
        reason: String,
    },

    /// The session was closed. Reported both to waiters drained by an
    /// orderly close and to dispatch calls made afterward.
    #[error("session closed")]
    Closed,

    /// A global session is already registered.
    #[error("a global session is already running")]
    AlreadyRunning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_error_mentions_keyword() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = CodecError::Payload {
            keyword: "results".into(),
            source,
        };
        assert!(err.to_string().contains("results"));
    }

    #[test]
    fn codec_error_converts_to_session_error() {
        let source = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
        let err: SessionError = CodecError::Payload {
            keyword: "dbstats".into(),
            source,
        }
        .into();
        assert!(matches!(err, SessionError::Codec(_)));
    }

    #[test]
    fn display_formats() {
        assert_eq!(SessionError::Closed.to_string(), "session closed");
        assert_eq!(
            SessionError::AlreadyRunning.to_string(),
            "a global session is already running"
        );
        let lost = SessionError::ConnectionLost {
            reason: "broken pipe".into(),
        };
        assert!(lost.to_string().contains("broken pipe"));
    }
}
