//! Unified error type for the kintone client.

use std::time::Duration;

use kintone_protocol::ProtocolError;
use kintone_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// `#[from]` on the wrapped variants lets `?` convert transport and
/// protocol failures automatically.
#[derive(Debug, thiserror::Error)]
pub enum KintoneError {
    /// The request never completed (connection, I/O).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A body could not be encoded or a reply could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The service refused the request with its JSON error body.
    #[error("kintone error {code} (HTTP {status}): {message} [id: {id}]")]
    Api {
        status: u16,
        code: String,
        message: String,
        id: String,
    },

    /// A non-2xx reply whose body was not a service error (proxies, load
    /// balancers, maintenance pages).
    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// No reply within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl KintoneError {
    /// The service error code (`"GAIA_RE01"`, `"CB_VA01"`, ...) for
    /// [`KintoneError::Api`].
    pub fn code(&self) -> Option<&str> {
        match self {
            KintoneError::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}
