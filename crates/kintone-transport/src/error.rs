/// Errors that can occur while moving a request to the service and back.
///
/// Transports backed by a real HTTP client map their own failures onto
/// these variants.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection could not be established or was dropped mid-request.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Reading or writing the socket failed.
    #[error("I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The client rejected the request before sending it (bad URL, header
    /// value, TLS setup, ...).
    #[error("request failed: {0}")]
    Request(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts() {
        let err: TransportError = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow").into();
        assert!(matches!(err, TransportError::Io(_)));
        assert_eq!(err.to_string(), "I/O failed: slow");
    }
}
