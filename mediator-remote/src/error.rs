//! Error taxonomy of the remote layer.

use thiserror::Error;

/// Result alias for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors produced while talking to a remote server.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The remote endpoint could not be reached or spawned.
    #[error("cannot connect to remote server '{server}'")]
    Connect {
        /// Name of the remote server.
        server: String,
        /// Underlying i/o failure.
        #[source]
        source: std::io::Error,
    },

    /// The initialize handshake failed or returned an unusable result.
    #[error("handshake with remote server '{server}' failed: {detail}")]
    Handshake {
        /// Name of the remote server.
        server: String,
        /// What went wrong during the handshake.
        detail: String,
    },

    /// A frame could not be encoded or a reply could not be decoded.
    #[error("protocol error with remote server '{server}': {detail}")]
    Protocol {
        /// Name of the remote server.
        server: String,
        /// What was wrong with the frame.
        detail: String,
    },

    /// The remote server answered with a JSON-RPC error.
    #[error("remote server '{server}' returned error {code}: {message}")]
    Rpc {
        /// Name of the remote server.
        server: String,
        /// JSON-RPC error code.
        code: i64,
        /// Error message from the server.
        message: String,
    },

    /// The remote call did not complete within the configured timeout.
    #[error("call to '{method}' on remote server '{server}' timed out")]
    Timeout {
        /// Name of the remote server.
        server: String,
        /// Method that timed out.
        method: String,
    },

    /// The connection closed while replies were still outstanding.
    #[error("connection to remote server '{server}' closed")]
    Closed {
        /// Name of the remote server.
        server: String,
    },
}
