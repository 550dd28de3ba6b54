//! Character roster records.
//!
//! The character-list message names the highest slot index at byte 1. For
//! each slot `x` from 0 up to and including that index, the character id is
//! read at `0x14 * (x + 1)` and the content id at `0x10 * (x + 1)`. Each
//! slot becomes one [`RECORD_LEN`]-byte record.

use byteorder::{ByteOrder, LittleEndian};

/// Size of one roster record.
pub const RECORD_LEN: usize = 0x68;

const HIGHEST_SLOT_OFFSET: usize = 1;

/// One character slot reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterEntry {
    pub slot: u8,
    pub character_id: u32,
    pub content_id: u32,
}

impl RosterEntry {
    /// Writes this entry's bytes into a record.
    ///
    /// Only the fields the relay owns are written; other bytes of the
    /// record are left as they are.
    ///
    /// # Panics
    /// Panics if `record` is shorter than [`RECORD_LEN`].
    pub fn write_record(&self, record: &mut [u8]) {
        let record = &mut record[..RECORD_LEN];
        record[0x00] = 0x01;
        record[0x02] = 0x01;
        LittleEndian::write_u32(&mut record[0x04..0x08], self.character_id);
        LittleEndian::write_u32(&mut record[0x08..0x0C], self.content_id);
        record[0x10] = self.slot;
        record[0x11] = 0x80;
        record[0x18] = 0x20;
        record[0x28] = 0x20;
    }
}

/// Parses a character-list payload into at most `capacity` entries.
///
/// The slot count byte is unsigned, so 0xFF means 256 slots before the
/// clamp. Ids lying past the end of the payload read as zero.
pub fn parse_character_list(payload: &[u8], capacity: usize) -> Vec<RosterEntry> {
    let Some(&highest) = payload.get(HIGHEST_SLOT_OFFSET) else {
        return Vec::new();
    };
    let count = (usize::from(highest) + 1).min(capacity);

    (0..count)
        .map(|x| RosterEntry {
            slot: x as u8,
            character_id: read_u32_padded(payload, 0x14 * (x + 1)),
            content_id: read_u32_padded(payload, 0x10 * (x + 1)),
        })
        .collect()
}

fn read_u32_padded(payload: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    if let Some(available) = payload.get(offset..) {
        let n = available.len().min(4);
        word[..n].copy_from_slice(&available[..n]);
    }
    LittleEndian::read_u32(&word)
}
