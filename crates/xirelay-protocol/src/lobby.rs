//! Replies of the local lobby handshake.
//!
//! The lobby relay answers three client messages in order:
//!
//! 1. a 24-byte frame carrying the current time,
//! 2. a 24-byte frame, or 144 bytes when the client is creating a new
//!    character,
//! 3. the client's own message echoed back.
//!
//! Every reply is built on top of the inbound message: its first
//! [`CLEARED_PREFIX_LEN`] bytes are zeroed, the reply's fixed bytes are
//! written, and whatever lies beyond the prefix is echoed.

use byteorder::{ByteOrder, LittleEndian};

/// Number of leading inbound bytes cleared before a reply is written.
pub const CLEARED_PREFIX_LEN: usize = 32;

/// Length of the step-1 reply.
pub const TIME_REPLY_LEN: usize = 24;

/// Length of the step-2 reply for an existing character.
pub const CHARACTER_REPLY_LEN: usize = 24;

/// Length of the step-2 reply for a new character.
pub const NEW_CHARACTER_REPLY_LEN: usize = 144;

/// Offset of the character marker in the client's second message.
pub const CHARACTER_MARKER_OFFSET: usize = 0x04;

/// Byte the client puts at [`CHARACTER_MARKER_OFFSET`] for an existing
/// character. Anything else means a new character.
pub const CHARACTER_MARKER: u8 = 0x28;

const TIME_REPLY_STATUS: u8 = 0x81;
const TIMESTAMP_OFFSET: usize = 0x14;

/// Returns `true` when `message` carries the existing-character marker.
pub fn carries_character_marker(message: &[u8]) -> bool {
    message.get(CHARACTER_MARKER_OFFSET) == Some(&CHARACTER_MARKER)
}

/// Step 1: status `0x81` and the low 32 bits of `unix_time` at 0x14.
pub fn time_reply(inbound: &[u8], unix_time: i64) -> Vec<u8> {
    let mut reply = overlay(inbound, TIME_REPLY_LEN);
    reply[0] = TIME_REPLY_STATUS;
    LittleEndian::write_u32(
        &mut reply[TIMESTAMP_OFFSET..TIMESTAMP_OFFSET + 4],
        unix_time as u32,
    );
    reply
}

/// Step 2: the character reply, long form for a new character.
pub fn character_reply(inbound: &[u8], new_character: bool) -> Vec<u8> {
    let len = if new_character {
        NEW_CHARACTER_REPLY_LEN
    } else {
        CHARACTER_REPLY_LEN
    };
    let mut reply = overlay(inbound, len);
    reply[0x00] = 0x28;
    reply[0x04] = 0x20;
    reply[0x08] = 0x01;
    reply[0x0B] = 0x7F;
    reply
}

/// Step 3: the inbound message with its prefix cleared, same length.
pub fn echo_reply(inbound: &[u8]) -> Vec<u8> {
    overlay(inbound, inbound.len())
}

/// A `len`-byte buffer: zeros for the cleared prefix, then the inbound
/// bytes, then zeros past the end of the inbound message.
fn overlay(inbound: &[u8], len: usize) -> Vec<u8> {
    let mut reply = vec![0u8; len];
    if len > CLEARED_PREFIX_LEN && inbound.len() > CLEARED_PREFIX_LEN {
        let end = len.min(inbound.len());
        reply[CLEARED_PREFIX_LEN..end].copy_from_slice(&inbound[CLEARED_PREFIX_LEN..end]);
    }
    reply
}
