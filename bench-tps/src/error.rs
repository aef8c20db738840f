//! Error types for the benchmark harness.
//!
//! Every error is fatal to the run: the harness is a test tool, and a
//! failure means an assumption was wrong. Nothing here is retried or
//! downgraded to a warning; errors propagate to `main` and terminate the
//! process with context intact.

use {sidechain_rpc_client::RpcError, thiserror::Error};

/// Errors that abort a harness run.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// Transport/protocol failure or node-reported error from any call.
    #[error("RPC failure: {0}")]
    Rpc(#[from] RpcError),

    /// Required input detail unavailable, or a signing step was rejected.
    #[error("signing failed: {0}")]
    Signing(String),

    /// The block template/sign/combine/submit sequence failed, leaving
    /// chain state ambiguous.
    #[error("block confirmation failed: {0}")]
    Confirmation(String),

    /// A node configuration file was missing or unusable.
    #[error("invalid node configuration: {0}")]
    Config(String),

    /// The daemon process could not be started, readied, or stopped.
    #[error("daemon supervision failed: {0}")]
    Daemon(String),

    /// A scenario post-condition did not hold on the node's UTXO set.
    #[error("scenario verification failed: {0}")]
    Verification(String),
}

/// Convenience result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;
