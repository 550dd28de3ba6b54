//! Account sessions for xirelay.
//!
//! This crate drives the account protocol against the remote auth server:
//!
//! 1. **Session** ([`Session`]) — one outbound connection plus the identity
//!    derived from it (account id, local and server addresses).
//! 2. **Credentials** ([`Credentials`]) — what the user typed, kept for the
//!    whole run.
//! 3. **State machine** ([`AccountClient`], [`on_response`]) — login,
//!    account creation, password recovery, and the main-menu changes.
//!
//! Terminal I/O is not done here. The client asks a [`Prompter`] for input
//! and hands it notices to show, so the same flow runs against stdin or a
//! scripted test double.
//!
//! # How it fits in the stack
//!
//! ```text
//! Relays (above)  ← start once the flow ends in Outcome::Play
//!     ↕
//! Session Layer (this crate)  ← menus, credentials, request/response rounds
//!     ↕
//! Protocol + Transport (below)  ← frames and connections
//! ```

#![allow(async_fn_in_trait)]

mod account;
mod credentials;
mod error;
mod prompt;
mod session;
mod transition;

pub use account::{parse_selection, AccountClient};
pub use credentials::Credentials;
pub use error::AccountError;
pub use prompt::{Notice, Prompter};
pub use session::{Endpoint, Session, SessionIdentity};
pub use transition::{on_response, ExitReason, MenuState, Outcome, RecoveryPhase, Transition};
