//! The input collaborator the account flow talks to.
//!
//! The state machine never touches a terminal directly. It asks a
//! [`Prompter`] for lines and secrets and hands it notices to show. The
//! binary plugs in a stdin/stdout implementation; tests plug in a scripted
//! one.

use crate::AccountError;

/// How a notice should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Menu text and other neutral output.
    Plain,
    Info,
    Success,
    Warning,
    Error,
}

/// Supplies user input and displays messages for the account flow.
///
/// `read_secret` is for passwords. Whether the input is masked is up to the
/// implementation.
///
/// Returning [`AccountError::InputClosed`] from either read ends the flow.
pub trait Prompter: Send {
    /// Shows `prompt` and reads one line, without the trailing newline.
    fn read_line(
        &mut self,
        prompt: &str,
    ) -> impl std::future::Future<Output = Result<String, AccountError>> + Send;

    /// Shows `prompt` and reads one line of secret input.
    fn read_secret(
        &mut self,
        prompt: &str,
    ) -> impl std::future::Future<Output = Result<String, AccountError>> + Send;

    /// Displays a message.
    fn notify(&mut self, notice: Notice, message: &str);
}
