//! Requests and replies of the game-data relay.
//!
//! The relay dispatches on the first byte of each inbound message. Only
//! three requests are answered; everything else is ignored.

use std::net::Ipv4Addr;

use byteorder::{ByteOrder, LittleEndian};

/// Requests the game-data relay understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GameOpcode {
    /// Asks for the account id and the server address.
    AccountInfo = 0x01,
    /// Asks for the session key.
    Key = 0x02,
    /// Delivers the character list.
    CharacterList = 0x03,
    /// Asks for the session key again.
    KeyRefresh = 0x15,
}

impl GameOpcode {
    /// Reads the opcode from the first byte of a payload.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        match payload.first()? {
            0x01 => Some(Self::AccountInfo),
            0x02 => Some(Self::Key),
            0x03 => Some(Self::CharacterList),
            0x15 => Some(Self::KeyRefresh),
            _ => None,
        }
    }
}

/// Length of the account-info reply.
pub const ACCOUNT_INFO_REPLY_LEN: usize = 9;

const ACCOUNT_INFO_TAG: u8 = 0xA1;

/// The fixed key frame sent for [`GameOpcode::Key`] and
/// [`GameOpcode::KeyRefresh`].
pub const KEY_REPLY: [u8; 25] = [
    0xA2, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x58, 0xE0, 0x5D, 0xAD, 0x00, 0x00, 0x00, 0x00,
];

/// A reply of exactly this length means the peer is finished.
///
/// None of the replies above has this length, so the check never fires in
/// practice; it is kept so a future 72-byte reply ends the session.
pub const TERMINAL_REPLY_LEN: usize = 72;

/// Builds the account-info reply: tag `0xA1`, the account id, and the
/// server address in network byte order.
pub fn account_info_reply(
    account_id: u32,
    server_address: Ipv4Addr,
) -> [u8; ACCOUNT_INFO_REPLY_LEN] {
    let mut reply = [0u8; ACCOUNT_INFO_REPLY_LEN];
    reply[0] = ACCOUNT_INFO_TAG;
    LittleEndian::write_u32(&mut reply[1..5], account_id);
    reply[5..9].copy_from_slice(&server_address.octets());
    reply
}
