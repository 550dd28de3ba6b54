//! States of the account flow and the pure response-dispatch function.
//!
//! [`on_response`] decides where a response leads without doing any I/O, so
//! every (state, status) pair can be checked in isolation. The
//! [`AccountClient`](crate::AccountClient) performs the prompts, sends, and
//! reconnects around it.

use std::fmt;

use xirelay_protocol::{ResponseFrame, Status};

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Progress through password recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPhase {
    /// Send the username, learn the account's question id.
    Lookup,
    /// Answer the question the server reported.
    Answer { question_id: u32 },
    /// Set the new password.
    Reset,
}

/// Where the account flow currently is.
///
/// Playing and logging out are not states: they end the flow with an
/// [`Outcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    LoginMenu,
    LoggingIn,
    CreatingAccount,
    Recovering(RecoveryPhase),
    MainMenu,
    ChangingEmail,
    ChangingPassword,
    SettingSecurityQuestion,
}

impl MenuState {
    /// The menu this state belongs to.
    pub fn menu(self) -> MenuState {
        match self {
            Self::LoginMenu | Self::LoggingIn | Self::CreatingAccount | Self::Recovering(_) => {
                Self::LoginMenu
            }
            Self::MainMenu
            | Self::ChangingEmail
            | Self::ChangingPassword
            | Self::SettingSecurityQuestion => Self::MainMenu,
        }
    }

    /// Entering this state tears the current connection down and opens a
    /// new one.
    pub fn needs_fresh_connection(self) -> bool {
        matches!(
            self,
            Self::MainMenu
                | Self::Recovering(RecoveryPhase::Answer { .. })
                | Self::Recovering(RecoveryPhase::Reset)
        )
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why the flow ended without proceeding to the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Main menu option 5.
    LoggedOut,
    LoginRejected,
    CreateRejected,
    UserNotFound,
    /// The account exists but never configured a security question.
    NoSecurityQuestion,
    WrongAnswer,
    /// Recovery finished; the user must log in again with the new password.
    PasswordReset,
    PasswordRejected,
    /// The password was changed from the main menu.
    PasswordChanged,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::LoggedOut => "logged out",
            Self::LoginRejected => "login rejected",
            Self::CreateRejected => "account creation rejected",
            Self::UserNotFound => "user not found",
            Self::NoSecurityQuestion => "no security question configured",
            Self::WrongAnswer => "wrong security answer",
            Self::PasswordReset => "password reset",
            Self::PasswordRejected => "password change rejected",
            Self::PasswordChanged => "password changed",
        };
        f.write_str(text)
    }
}

/// How the account flow ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The user chose to play; the relays should start.
    Play,
    Exit(ExitReason),
}

impl Outcome {
    pub fn proceeds_to_game(self) -> bool {
        matches!(self, Self::Play)
    }
}

/// The result of handling one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Goto(MenuState),
    Finish(Outcome),
    /// The server sent a status byte this state does not expect. The state
    /// is kept and retried on a fresh connection.
    UnknownStatus(u8),
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Maps a response received while in `from` to the next transition.
pub fn on_response(from: MenuState, response: &ResponseFrame) -> Transition {
    use ExitReason::*;
    use MenuState::*;
    use Transition::*;

    let Some(status) = response.status() else {
        return UnknownStatus(response.status_byte);
    };

    match (from, status) {
        (LoggingIn | CreatingAccount, Status::SuccessLogin | Status::SuccessCreate) => {
            Goto(MainMenu)
        }
        (LoggingIn | CreatingAccount, Status::ErrorLogin) => Finish(Outcome::Exit(LoginRejected)),
        (LoggingIn | CreatingAccount, Status::ErrorCreate) => {
            Finish(Outcome::Exit(CreateRejected))
        }

        (Recovering(RecoveryPhase::Lookup), Status::SuccessUserFound) => match response.value {
            0 => Finish(Outcome::Exit(NoSecurityQuestion)),
            question_id => Goto(Recovering(RecoveryPhase::Answer { question_id })),
        },
        (Recovering(RecoveryPhase::Lookup), Status::ErrorUserFound) => {
            Finish(Outcome::Exit(UserNotFound))
        }
        (Recovering(RecoveryPhase::Answer { .. }), Status::SuccessSqChanged) => {
            Goto(Recovering(RecoveryPhase::Reset))
        }
        (Recovering(RecoveryPhase::Answer { .. }), Status::ErrorSqFailed) => {
            Finish(Outcome::Exit(WrongAnswer))
        }
        (Recovering(RecoveryPhase::Reset), Status::SuccessPass) => {
            Finish(Outcome::Exit(PasswordReset))
        }
        (Recovering(RecoveryPhase::Reset), Status::ErrorPass) => {
            Finish(Outcome::Exit(PasswordRejected))
        }

        (ChangingEmail | ChangingPassword | SettingSecurityQuestion, Status::SuccessPass) => {
            Finish(Outcome::Exit(PasswordChanged))
        }
        (
            ChangingEmail | ChangingPassword | SettingSecurityQuestion,
            Status::SuccessEmail
            | Status::SuccessSecCode
            | Status::ErrorEmail
            | Status::ErrorPass
            | Status::ErrorSecCode,
        ) => Goto(MainMenu),

        _ => UnknownStatus(status.as_u8()),
    }
}
