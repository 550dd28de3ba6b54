//! Error types for the session layer.

use xirelay_protocol::ProtocolError;
use xirelay_transport::TransportError;

/// Errors that can end an account session.
///
/// A server-declared failure (`ERROR_LOGIN`, `ERROR_SQFAILED`, ...) is *not*
/// an error here: the state machine turns it into a menu transition or an
/// [`ExitReason`](crate::ExitReason).
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Resolving, connecting, sending, or receiving failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server sent something that is not a valid frame.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The input collaborator has no more input (end of file).
    #[error("input closed")]
    InputClosed,

    /// Reading input failed.
    #[error("failed to read input: {0}")]
    Input(#[source] std::io::Error),

    /// A menu selection or other user input was rejected.
    ///
    /// Always handled by re-prompting; `AccountClient::run` never returns it.
    #[error("invalid input: {0:?}")]
    InvalidInput(String),
}
