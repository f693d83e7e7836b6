//! Transport-level errors and their normalization into call failures.

use wirekit_core::{CallError, StatusCode};

/// Errors surfaced by a [`crate::GrpcTransport`] implementation.
///
/// The runtime never lets these escape to callers; they are normalized into
/// the `Failure` variant of the response union.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The call exceeded its deadline at the transport boundary.
    #[error("call timed out")]
    Timeout,

    /// Any other network-level fault, with the underlying cause flattened
    /// to text.
    #[error("network error: {0}")]
    Network(String),
}

impl From<TransportError> for CallError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => {
                CallError::new(StatusCode::DeadlineExceeded, "call timed out")
            }
            TransportError::Network(cause) => CallError::new(StatusCode::Unknown, cause),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_maps_to_deadline_exceeded() {
        let err: CallError = TransportError::Timeout.into();
        assert_eq!(err.status, StatusCode::DeadlineExceeded);
    }

    #[test]
    fn test_network_maps_to_unknown() {
        let err: CallError = TransportError::Network("connection refused".into()).into();
        assert_eq!(err.status, StatusCode::Unknown);
        assert_eq!(err.message, "connection refused");
    }
}
