//! Error types for the sidechain RPC client.

use thiserror::Error;

/// Errors that can occur while talking to a sidechain daemon.
#[derive(Error, Debug)]
pub enum RpcError {
    /// The HTTP request itself failed (connection refused, timeout, ...).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The daemon answered with a JSON-RPC error object.
    #[error("node error {code}: {message}")]
    Node {
        /// Daemon-assigned error code.
        code: i64,
        /// Human-readable message from the daemon.
        message: String,
    },

    /// The response body could not be interpreted as a JSON-RPC response,
    /// or the `result` payload did not have the expected shape.
    #[error("malformed RPC response for `{method}`: {reason}")]
    Malformed {
        /// The RPC method whose response failed to decode.
        method: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// The endpoint URL could not be parsed or carries no usable host.
    #[error("invalid RPC endpoint URL: {0}")]
    InvalidUrl(String),
}

/// Convenience result type for RPC operations.
pub type Result<T> = std::result::Result<T, RpcError>;
