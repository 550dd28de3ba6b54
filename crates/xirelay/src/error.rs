//! Unified error type for xirelay.

use std::path::PathBuf;

use xirelay_protocol::ProtocolError;
use xirelay_session::AccountError;
use xirelay_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// A transport-level error (resolve, connect, bind, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A malformed frame.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The account flow failed.
    #[error(transparent)]
    Account(#[from] AccountError),

    /// A relay task panicked or was cancelled.
    #[error("relay task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// The configuration file could not be read or parsed.
    #[error("invalid configuration in {path}: {reason}")]
    Config { path: PathBuf, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let relay_err: RelayError = err.into();
        assert!(matches!(relay_err, RelayError::Transport(_)));
        assert!(relay_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::UnknownOpcode(0xEE);
        let relay_err: RelayError = err.into();
        assert!(matches!(relay_err, RelayError::Protocol(_)));
    }

    #[test]
    fn test_from_account_error() {
        let relay_err: RelayError = AccountError::InputClosed.into();
        assert!(matches!(relay_err, RelayError::Account(_)));
        assert_eq!(relay_err.to_string(), "input closed");
    }

    #[test]
    fn test_config_error_names_path() {
        let err = RelayError::Config {
            path: PathBuf::from("relay.toml"),
            reason: "expected a table".into(),
        };
        assert!(err.to_string().contains("relay.toml"));
    }
}
