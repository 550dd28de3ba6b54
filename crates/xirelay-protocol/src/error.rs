//! Error types for the protocol layer.

/// Errors that can occur while decoding or building frames.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The buffer is shorter than the fixed frame length.
    #[error("{frame} frame too short: expected {expected} bytes, got {actual}")]
    FrameTooShort {
        frame: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The opcode byte names no known request.
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),

    /// A security-question selection outside 1-5.
    #[error("invalid security question: {0:?}")]
    InvalidQuestion(String),
}
