//! Transport layer for xirelay.
//!
//! Everything that touches a socket lives here:
//!
//! - **Connection factory** ([`connect`], [`resolve_hostname`],
//!   [`local_ipv4`]) — resolves the remote server and opens an outbound TCP
//!   connection.
//! - **Listening server factory** ([`listen`]) — binds a local port for TCP
//!   or UDP and hands back a [`ListenHandle`].
//! - **Connections** ([`Connection`] trait, [`TcpConnection`],
//!   [`UdpConnection`]) — send and receive raw bytes.
//!
//! The layers above never see a raw `TcpStream`; they only see the
//! [`Connection`] trait and [`TransportError`].

#![allow(async_fn_in_trait)]

mod connect;
mod error;
mod listen;
mod tcp;
mod udp;

pub use connect::{connect, ipv4_of, local_ipv4, resolve_hostname};
pub use error::TransportError;
pub use listen::{listen, ListenHandle, Protocol, TcpTransport, LISTEN_BACKLOG};
pub use tcp::TcpConnection;
pub use udp::UdpConnection;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-unique id.
    pub(crate) fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, TransportError>;

    /// Returns the local address the transport is bound to.
    fn local_addr(&self) -> std::io::Result<std::net::SocketAddr>;
}

/// A single connection that can send and receive bytes.
///
/// Methods take `&self` so a connection can be shared between the code that
/// reads and the code that writes; implementations lock internally.
pub trait Connection: Send + Sync + 'static {
    /// Sends data to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Receives the next chunk of data from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError>;

    /// Shuts the connection down for sending.
    ///
    /// The socket itself is released when the connection is dropped.
    async fn close(&self) -> Result<(), TransportError>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
