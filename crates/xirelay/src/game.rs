//! The game-data relay.
//!
//! One relay serves one game session. It receives the game client's
//! requests, dispatches on the first byte, and answers from the session
//! identity established by the account flow. The character list is written
//! into the [`SharedRoster`] and gets no reply.

use std::time::Duration;

use xirelay_protocol::game::{account_info_reply, GameOpcode, KEY_REPLY, TERMINAL_REPLY_LEN};
use xirelay_protocol::roster::parse_character_list;
use xirelay_session::SessionIdentity;
use xirelay_transport::Connection;

use crate::roster::SharedRoster;
use crate::shutdown::Shutdown;
use crate::RelayError;

/// Why a relay loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayEnd {
    Shutdown,
    PeerClosed,
    ReceiveFailed,
    SendFailed,
    /// A reply of [`TERMINAL_REPLY_LEN`] bytes was sent.
    TerminalReply,
}

/// A game-data relay over any [`Connection`].
pub struct GameRelay<C> {
    conn: C,
    identity: SessionIdentity,
    roster: SharedRoster,
    poll_interval: Duration,
}

impl<C: Connection> GameRelay<C> {
    pub fn new(
        conn: C,
        identity: SessionIdentity,
        roster: SharedRoster,
        poll_interval: Duration,
    ) -> Self {
        Self {
            conn,
            identity,
            roster,
            poll_interval,
        }
    }

    /// Serves requests until shutdown, peer close, or an I/O failure, then
    /// closes the connection.
    pub async fn run(self, mut shutdown: Shutdown) -> Result<RelayEnd, RelayError> {
        let id = self.conn.id();
        tracing::info!(
            %id,
            account_id = self.identity.account_id,
            server = %self.identity.server_address,
            "game-data relay running"
        );

        let end = loop {
            let payload = tokio::select! {
                _ = shutdown.wait() => break RelayEnd::Shutdown,
                received = self.conn.recv() => match received {
                    Ok(Some(payload)) => payload,
                    Ok(None) => break RelayEnd::PeerClosed,
                    Err(e) => {
                        tracing::debug!(%id, error = %e, "game-data receive failed");
                        break RelayEnd::ReceiveFailed;
                    }
                },
            };

            if let Some(reply) = self.dispatch(&payload).await {
                if let Err(e) = self.conn.send(&reply).await {
                    tracing::debug!(%id, error = %e, "game-data send failed");
                    break RelayEnd::SendFailed;
                }
                if reply.len() == TERMINAL_REPLY_LEN {
                    break RelayEnd::TerminalReply;
                }
            }

            tokio::select! {
                _ = shutdown.wait() => break RelayEnd::Shutdown,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        };

        tracing::info!(%id, ?end, "game-data relay stopped");
        if let Err(e) = self.conn.close().await {
            tracing::debug!(%id, error = %e, "close failed");
        }
        Ok(end)
    }

    /// Handles one request. Returns the reply to send, if any.
    async fn dispatch(&self, payload: &[u8]) -> Option<Vec<u8>> {
        let opcode = GameOpcode::from_payload(payload);
        tracing::trace!(?opcode, len = payload.len(), "game-data request");

        match opcode? {
            GameOpcode::AccountInfo => Some(
                account_info_reply(self.identity.account_id, self.identity.server_address)
                    .to_vec(),
            ),
            GameOpcode::Key | GameOpcode::KeyRefresh => Some(KEY_REPLY.to_vec()),
            GameOpcode::CharacterList => {
                let entries = parse_character_list(payload, self.roster.capacity());
                let written = self.roster.populate(&entries).await;
                tracing::info!(characters = written, "character list received");
                None
            }
        }
    }
}
