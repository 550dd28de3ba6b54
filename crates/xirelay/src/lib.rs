//! # xirelay
//!
//! Client-side relay between a game client and a remote account, lobby, and
//! game-data server cluster.
//!
//! A run has two halves:
//!
//! 1. **Account flow** — [`AccountClient`] walks the login menus against the
//!    auth server until the user chooses to play.
//! 2. **Relays** — [`Relays`] then starts the [`LobbyRelay`], which answers
//!    the client's lobby handshake locally, and the [`GameRelay`], which
//!    serves game-data requests and fills the [`SharedRoster`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xirelay::prelude::*;
//!
//! # async fn start() -> Result<(), RelayError> {
//! let config = RelayConfig::default().validated();
//! let session = Session::new(config.auth_endpoint(), config.io_timeout());
//! let mut client = AccountClient::new(session, StdioPrompter::new());
//!
//! if client.run().await?.proceeds_to_game() {
//!     let relays = Relays::start(&config, client.session().identity()).await?;
//!     relays.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
mod error;
pub mod game;
pub mod lobby;
pub mod logging;
pub mod relays;
pub mod roster;
pub mod shutdown;
pub mod terminal;

pub use config::RelayConfig;
pub use error::RelayError;
pub use game::{GameRelay, RelayEnd};
pub use lobby::LobbyRelay;
pub use relays::Relays;
pub use roster::SharedRoster;
pub use terminal::StdioPrompter;

pub use xirelay_session::AccountClient;

/// Convenience re-exports for the common types.
pub mod prelude {
    pub use crate::config::RelayConfig;
    pub use crate::error::RelayError;
    pub use crate::game::{GameRelay, RelayEnd};
    pub use crate::lobby::LobbyRelay;
    pub use crate::relays::Relays;
    pub use crate::roster::SharedRoster;
    pub use crate::shutdown::{Shutdown, ShutdownTrigger};
    pub use crate::terminal::StdioPrompter;

    pub use xirelay_protocol::{ResponseFrame, SecurityQuestion, Status};
    pub use xirelay_session::{
        AccountClient, AccountError, Credentials, Endpoint, ExitReason, Notice, Outcome,
        Prompter, Session, SessionIdentity,
    };
    pub use xirelay_transport::{Connection, TransportError};
}
