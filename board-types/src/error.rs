//! Error types shared by the gateway and the orchestrator.

use thiserror::Error;

/// A remote call that did not succeed.
///
/// Transport- and backend-level failures are flattened to strings so the
/// error can be cloned into settlement outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The request could not be sent or the connection broke.
    #[error("request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Status {
        /// HTTP-style status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// The request body could not be encoded.
    #[error("invalid request: {0}")]
    Encode(String),

    /// The response could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),

    /// The backend rejected the operation.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The addressed row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Local storage error (file-backed gateways).
    #[error("I/O error: {0}")]
    Io(String),
}

/// Why a remote call settled as a failure from the orchestrator's view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The backend or transport rejected the call.
    #[error("remote failure: {0}")]
    Failure(#[from] GatewayError),

    /// The call succeeded but returned no row.
    #[error("remote returned no row")]
    NullResult,
}
