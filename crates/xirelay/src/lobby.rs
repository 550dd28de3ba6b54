//! The local lobby handshake relay.
//!
//! The game client connects here instead of the real lobby. Every accepted
//! connection runs its own task that answers exactly three client messages
//! locally, then closes. Connection tasks live in a [`JoinSet`] so that
//! shutdown can wait for them.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::task::JoinSet;
use xirelay_protocol::lobby::{carries_character_marker, character_reply, echo_reply, time_reply};
use xirelay_transport::{
    listen, Connection, Protocol, TcpConnection, TcpTransport, Transport, TransportError,
};

use crate::shutdown::Shutdown;
use crate::RelayError;

/// Number of client messages answered per connection.
pub const LOBBY_STEPS: usize = 3;

/// The listening lobby relay.
pub struct LobbyRelay<T = TcpTransport> {
    transport: T,
    timeout: Option<Duration>,
}

impl LobbyRelay {
    /// Binds the relay on all interfaces. Port 0 picks a free port.
    ///
    /// `timeout` bounds each receive and send on accepted connections.
    pub async fn bind(port: u16, timeout: Option<Duration>) -> Result<Self, RelayError> {
        let transport = listen(Protocol::Tcp, port)
            .await?
            .into_tcp()
            .ok_or_else(|| TransportError::ConnectionClosed("expected a TCP listener".into()))?;
        Ok(Self { transport, timeout })
    }
}

impl<T> LobbyRelay<T>
where
    T: Transport<Connection = TcpConnection>,
{
    /// Wraps an already listening transport.
    pub fn from_transport(transport: T, timeout: Option<Duration>) -> Self {
        Self { transport, timeout }
    }

    /// Returns the local address the relay is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until `shutdown` fires or accepting fails, then
    /// waits for every connection task to finish.
    ///
    /// A failed accept is not retried; it is returned once the open
    /// connections are done.
    pub async fn run(mut self, mut shutdown: Shutdown) -> Result<(), RelayError> {
        tracing::info!(addr = ?self.local_addr().ok(), "lobby relay running");
        let mut tasks = JoinSet::new();

        let outcome = loop {
            tokio::select! {
                _ = shutdown.wait() => break Ok(()),
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let conn = conn.with_timeout(self.timeout);
                        let shutdown = shutdown.clone();
                        tasks.spawn(async move {
                            let id = conn.id();
                            if let Err(e) = handle_lobby_connection(conn, shutdown).await {
                                tracing::debug!(%id, error = %e, "lobby handshake aborted");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed, lobby relay closing");
                        break Err(RelayError::Transport(e));
                    }
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        tracing::warn!(error = %e, "lobby connection task failed");
                    }
                }
            }
        };
        drop(self.transport);

        tracing::info!(pending = tasks.len(), "lobby relay stopping");
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "lobby connection task failed");
            }
        }
        outcome
    }
}

/// Runs the three-step handshake on one connection and closes it.
///
/// Shutdown abandons the handshake without an error.
pub async fn handle_lobby_connection(
    conn: TcpConnection,
    mut shutdown: Shutdown,
) -> Result<(), RelayError> {
    let id = conn.id();
    tracing::debug!(%id, peer = %conn.peer_addr(), "lobby connection accepted");

    let result = tokio::select! {
        result = lobby_handshake(&conn) => result,
        _ = shutdown.wait() => {
            tracing::debug!(%id, "lobby handshake cancelled");
            Ok(())
        }
    };

    if let Err(e) = conn.close().await {
        tracing::debug!(%id, error = %e, "close failed");
    }
    result
}

async fn lobby_handshake(conn: &TcpConnection) -> Result<(), RelayError> {
    let id = conn.id();

    for step in 0..LOBBY_STEPS {
        let Some(inbound) = conn.recv().await? else {
            return Err(TransportError::ConnectionClosed(format!(
                "client left before lobby step {}",
                step + 1
            ))
            .into());
        };

        let reply = match step {
            0 => time_reply(&inbound, chrono::Utc::now().timestamp()),
            1 => {
                let new_character = !carries_character_marker(&inbound);
                tracing::debug!(%id, new_character, "character step");
                character_reply(&inbound, new_character)
            }
            _ => echo_reply(&inbound),
        };

        conn.send(&reply).await?;
        tracing::trace!(
            %id,
            step = step + 1,
            received = inbound.len(),
            sent = reply.len(),
            "lobby step done"
        );
    }

    tracing::debug!(%id, "lobby handshake complete");
    Ok(())
}
