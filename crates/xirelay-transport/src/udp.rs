//! Connectionless transport: a bound UDP socket that replies to whoever
//! last sent it a datagram.

use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tokio::sync::Mutex;

use crate::tcp::DEFAULT_RECV_CAPACITY;
use crate::{Connection, ConnectionId, TransportError};

/// A bound UDP socket behaving as a [`Connection`].
///
/// [`recv`](Connection::recv) remembers the sender of each datagram and
/// [`send`](Connection::send) replies to it, mirroring a `recvfrom`/`sendto`
/// loop.
#[derive(Debug)]
pub struct UdpConnection {
    id: ConnectionId,
    socket: UdpSocket,
    peer: Mutex<Option<SocketAddr>>,
}

impl UdpConnection {
    /// Wraps a bound socket with no known peer yet.
    pub fn new(socket: UdpSocket) -> Self {
        Self {
            id: ConnectionId::next(),
            socket,
            peer: Mutex::new(None),
        }
    }

    /// Wraps a bound socket that should reply to `peer` until another
    /// sender shows up.
    pub fn with_peer(socket: UdpSocket, peer: SocketAddr) -> Self {
        Self {
            id: ConnectionId::next(),
            socket,
            peer: Mutex::new(Some(peer)),
        }
    }

    /// Returns the local address the socket is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// The last peer a datagram was received from.
    pub async fn peer(&self) -> Option<SocketAddr> {
        *self.peer.lock().await
    }
}

impl Connection for UdpConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let Some(peer) = *self.peer.lock().await else {
            return Err(TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "no datagram received yet, nobody to reply to",
            )));
        };
        self.socket
            .send_to(data, peer)
            .await
            .map(|_| ())
            .map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut buf = vec![0u8; DEFAULT_RECV_CAPACITY];
        let (n, from) = self
            .socket
            .recv_from(&mut buf)
            .await
            .map_err(TransportError::ReceiveFailed)?;
        *self.peer.lock().await = Some(from);
        buf.truncate(n);
        Ok(Some(buf))
    }

    async fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
