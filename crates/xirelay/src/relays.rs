//! Starting and stopping the relays once the account flow ends in play.

use std::future::Future;
use std::net::SocketAddr;

use tokio::task::JoinHandle;
use xirelay_session::{Session, SessionIdentity};
use xirelay_transport::{TcpConnection, TransportError};

use crate::config::RelayConfig;
use crate::game::{GameRelay, RelayEnd};
use crate::lobby::LobbyRelay;
use crate::roster::SharedRoster;
use crate::shutdown::{self, ShutdownTrigger};
use crate::RelayError;

/// The running lobby and game-data relays.
pub struct Relays {
    trigger: ShutdownTrigger,
    lobby_addr: SocketAddr,
    roster: SharedRoster,
    lobby: JoinHandle<Result<(), RelayError>>,
    game: JoinHandle<Result<RelayEnd, RelayError>>,
}

impl Relays {
    /// Binds the lobby relay, opens the game-data connection with the
    /// account's identity, and spawns both.
    pub async fn start(
        config: &RelayConfig,
        identity: SessionIdentity,
    ) -> Result<Self, RelayError> {
        let (trigger, shutdown) = shutdown::channel();

        let lobby = LobbyRelay::bind(config.lobby.port, config.io_timeout()).await?;
        let lobby_addr = lobby
            .local_addr()
            .map_err(TransportError::LocalAddrUnavailable)?;

        let (conn, identity) = open_data_connection(config, identity).await?;
        let roster = SharedRoster::new(config.roster_slots);
        let game = GameRelay::new(conn, identity, roster.clone(), config.poll_interval());

        tracing::info!(%lobby_addr, data = %config.data_endpoint(), "relays started");
        Ok(Self {
            lobby: tokio::spawn(lobby.run(shutdown.clone())),
            game: tokio::spawn(game.run(shutdown)),
            trigger,
            lobby_addr,
            roster,
        })
    }

    pub fn lobby_addr(&self) -> SocketAddr {
        self.lobby_addr
    }

    pub fn roster(&self) -> &SharedRoster {
        &self.roster
    }

    /// Runs until `stop` resolves or the game-data relay ends on its own,
    /// then shuts both relays down and joins them.
    pub async fn run_until<F>(mut self, stop: F) -> Result<RelayEnd, RelayError>
    where
        F: Future<Output = ()>,
    {
        let finished = tokio::select! {
            _ = stop => None,
            joined = &mut self.game => Some(joined),
        };

        self.trigger.trigger();
        let game = match finished {
            Some(joined) => joined,
            None => self.game.await,
        };
        let lobby = self.lobby.await;

        let end = game??;
        lobby??;
        Ok(end)
    }
}

/// Connects to the data port, keeping the account id and refreshing the
/// addresses from the new connection.
async fn open_data_connection(
    config: &RelayConfig,
    identity: SessionIdentity,
) -> Result<(TcpConnection, SessionIdentity), RelayError> {
    // No deadline: the connection idles until the game client asks.
    let mut session = Session::with_identity(config.data_endpoint(), None, identity);
    session.ensure_open().await?;
    let conn = session
        .take_connection()
        .ok_or_else(|| TransportError::ConnectionClosed("game-data session not open".into()))?;
    Ok((conn, session.identity()))
}
