//! Wire formats for xirelay.
//!
//! Every message exchanged by the relay is a fixed-size frame with fields at
//! fixed byte offsets. This crate is the one place those offsets live:
//!
//! - **Account protocol** ([`AccountRequest`], [`ResponseFrame`],
//!   [`RequestOpcode`], [`Status`], [`SecurityQuestion`]) — the 131-byte
//!   request and 32-byte response exchanged with the auth server.
//! - **Lobby handshake** ([`lobby`]) — the replies the local lobby relay
//!   sends to the game client.
//! - **Game data** ([`game`], [`roster`]) — the replies of the game-data
//!   relay and the character roster records it writes.
//!
//! Nothing here does I/O. Encoding and decoding are pure functions over byte
//! slices, so every layout can be tested without a socket.
//!
//! All integers are little-endian. String fields are fixed-width and
//! NUL-padded; values longer than the field are truncated, never rejected.

mod account;
mod error;
pub mod game;
pub mod lobby;
mod opcode;
mod question;
pub mod roster;

pub use account::{
    AccountRequest, EmailSlot, ResponseFrame, SecurityField, REQUEST_FRAME_LEN,
    RESPONSE_FRAME_LEN,
};
pub use error::ProtocolError;
pub use opcode::{RequestOpcode, Status};
pub use question::SecurityQuestion;
