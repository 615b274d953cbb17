//! Errors for the typed command layer.

use thiserror::Error;
use vndb_protocol::SessionError;

/// Errors produced by [`Client`](crate::Client) commands.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Session-level failure: connection, handshake, dispatch, or framing.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The server answered the command with an `error` response.
    #[error("server error `{id}`: {msg}")]
    Server {
        /// Machine-readable error identifier (`parse`, `filter`, `throttled`, …).
        id: String,
        /// Human-readable message from the server.
        msg: String,
    },

    /// The response keyword did not match the command that was sent.
    #[error("unexpected `{keyword}` response to `{command}`")]
    Unexpected {
        /// The command that was dispatched.
        command: String,
        /// The keyword the server answered with.
        keyword: String,
    },

    /// A well-formed response whose payload did not have the expected shape.
    #[error("malformed `{keyword}` payload: {source}")]
    Payload {
        /// Keyword of the response being interpreted.
        keyword: String,
        /// The underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },
}
