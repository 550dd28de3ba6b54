//! The character roster shared between the game-data relay and its reader.
//!
//! The relay writes records when the character list arrives; whoever
//! consumes the roster reads it afterwards. The buffer sits behind a mutex,
//! and a generation counter is bumped once a population has finished, so a
//! reader that waits on [`SharedRoster::wait_populated`] never sees a
//! half-written list.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use xirelay_protocol::roster::{RosterEntry, RECORD_LEN};

/// Most records a character list can carry.
pub const MAX_ROSTER_SLOTS: usize = 256;

struct RosterBuffer {
    bytes: Vec<u8>,
    count: usize,
}

struct RosterInner {
    slots: usize,
    buffer: Mutex<RosterBuffer>,
    generation: watch::Sender<u64>,
}

/// A fixed-capacity buffer of [`RECORD_LEN`]-byte roster records.
///
/// Cheap to clone; all clones share the same buffer.
#[derive(Clone)]
pub struct SharedRoster {
    inner: Arc<RosterInner>,
}

impl SharedRoster {
    /// Creates a zeroed roster with room for `slots` records, at most
    /// [`MAX_ROSTER_SLOTS`].
    pub fn new(slots: usize) -> Self {
        let slots = slots.min(MAX_ROSTER_SLOTS);
        let len = slots
            .checked_mul(RECORD_LEN)
            .unwrap_or(MAX_ROSTER_SLOTS * RECORD_LEN);
        let (generation, _) = watch::channel(0);
        Self {
            inner: Arc::new(RosterInner {
                slots,
                buffer: Mutex::new(RosterBuffer {
                    bytes: vec![0; len],
                    count: 0,
                }),
                generation,
            }),
        }
    }

    /// Maximum number of records.
    pub fn capacity(&self) -> usize {
        self.inner.slots
    }

    /// Writes `entries` as consecutive records starting at record 0 and
    /// publishes the new generation. Entries beyond the capacity are
    /// dropped. Returns how many records were written.
    pub async fn populate(&self, entries: &[RosterEntry]) -> usize {
        let written = entries.len().min(self.inner.slots);
        {
            let mut buffer = self.inner.buffer.lock().await;
            for (index, entry) in entries.iter().take(written).enumerate() {
                let start = index * RECORD_LEN;
                entry.write_record(&mut buffer.bytes[start..start + RECORD_LEN]);
            }
            buffer.count = written;
        }
        self.inner.generation.send_modify(|generation| *generation += 1);
        tracing::debug!(records = written, "roster populated");
        written
    }

    /// Copies the whole buffer.
    pub async fn snapshot(&self) -> Vec<u8> {
        self.inner.buffer.lock().await.bytes.clone()
    }

    /// Number of records written by the last population.
    pub async fn count(&self) -> usize {
        self.inner.buffer.lock().await.count
    }

    /// How many populations have completed.
    pub fn generation(&self) -> u64 {
        *self.inner.generation.borrow()
    }

    /// Waits until at least one population has completed and returns its
    /// record count.
    pub async fn wait_populated(&self) -> usize {
        let mut rx = self.inner.generation.subscribe();
        // The sender lives in `self`, so this only returns once populated.
        let _ = rx.wait_for(|generation| *generation > 0).await;
        self.count().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn entry(slot: u8) -> RosterEntry {
        RosterEntry {
            slot,
            character_id: 1000 + u32::from(slot),
            content_id: 2000 + u32::from(slot),
        }
    }

    #[tokio::test]
    async fn test_populate_writes_consecutive_records() {
        let roster = SharedRoster::new(4);
        let written = roster.populate(&[entry(0), entry(1)]).await;
        assert_eq!(written, 2);
        assert_eq!(roster.generation(), 1);

        let bytes = roster.snapshot().await;
        assert_eq!(bytes.len(), 4 * RECORD_LEN);
        assert_eq!(bytes[0x10], 0);
        assert_eq!(bytes[RECORD_LEN + 0x10], 1);
        assert_eq!(&bytes[RECORD_LEN + 0x04..RECORD_LEN + 0x08], &1001u32.to_le_bytes());
        assert!(bytes[2 * RECORD_LEN..].iter().all(|&b| b == 0));
    }

    #[tokio::test]
    async fn test_populate_clamps_to_capacity() {
        let roster = SharedRoster::new(1);
        let written = roster.populate(&[entry(0), entry(1), entry(2)]).await;
        assert_eq!(written, 1);
        assert_eq!(roster.count().await, 1);
        assert_eq!(roster.snapshot().await.len(), RECORD_LEN);
    }

    #[tokio::test]
    async fn test_oversized_capacity_is_capped() {
        let roster = SharedRoster::new(usize::MAX);
        assert_eq!(roster.capacity(), MAX_ROSTER_SLOTS);
        assert_eq!(roster.snapshot().await.len(), MAX_ROSTER_SLOTS * RECORD_LEN);
    }

    #[tokio::test]
    async fn test_wait_populated_sees_finished_population() {
        let roster = SharedRoster::new(8);
        let reader = roster.clone();
        let waiter = tokio::spawn(async move { reader.wait_populated().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        roster.populate(&[entry(0), entry(1), entry(2)]).await;

        let count = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(count, 3);
    }
}
