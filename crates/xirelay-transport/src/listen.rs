//! Listening server factory.

use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::{TcpListener, TcpSocket, UdpSocket};

use crate::{Connection, TcpConnection, Transport, TransportError, UdpConnection};

/// Backlog requested for TCP listeners. The kernel clamps it to its own
/// maximum (`somaxconn`).
pub const LISTEN_BACKLOG: u32 = i32::MAX as u32;

/// Which transport a listening socket should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
}

/// A bound local socket.
///
/// For TCP this is a listener ready to accept; for UDP it is simply the
/// bound socket, there is no accept step.
#[derive(Debug)]
pub enum ListenHandle {
    Tcp(TcpTransport),
    Udp(UdpConnection),
}

impl ListenHandle {
    /// Returns the local address the handle is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        match self {
            Self::Tcp(transport) => transport.local_addr(),
            Self::Udp(conn) => conn.local_addr(),
        }
    }

    /// Returns the TCP transport, or `None` for a UDP handle.
    pub fn into_tcp(self) -> Option<TcpTransport> {
        match self {
            Self::Tcp(transport) => Some(transport),
            Self::Udp(_) => None,
        }
    }

    /// Returns the UDP socket, or `None` for a TCP handle.
    pub fn into_udp(self) -> Option<UdpConnection> {
        match self {
            Self::Tcp(_) => None,
            Self::Udp(conn) => Some(conn),
        }
    }
}

/// Binds the wildcard IPv4 address on `port` with the requested transport.
///
/// For TCP the socket is additionally put into the listening state. Each
/// stage that fails drops whatever the earlier stages created.
pub async fn listen(
    protocol: Protocol,
    port: u16,
) -> Result<ListenHandle, TransportError> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));

    match protocol {
        Protocol::Tcp => {
            let socket =
                TcpSocket::new_v4().map_err(TransportError::SocketCreateFailed)?;
            socket
                .bind(addr)
                .map_err(|source| TransportError::BindFailed { port, source })?;
            let listener = socket
                .listen(LISTEN_BACKLOG)
                .map_err(|source| TransportError::ListenFailed { port, source })?;
            tracing::info!(%addr, "TCP listener ready");
            Ok(ListenHandle::Tcp(TcpTransport { listener }))
        }
        Protocol::Udp => {
            let socket = UdpSocket::bind(addr)
                .await
                .map_err(|source| TransportError::BindFailed { port, source })?;
            tracing::info!(%addr, "UDP socket bound");
            Ok(ListenHandle::Udp(UdpConnection::new(socket)))
        }
    }
}

/// A TCP [`Transport`] accepting [`TcpConnection`]s.
#[derive(Debug)]
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Wraps an existing listener.
    pub fn from_listener(listener: TcpListener) -> Self {
        Self { listener }
    }
}

impl Transport for TcpTransport {
    type Connection = TcpConnection;

    async fn accept(&mut self) -> Result<Self::Connection, TransportError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let conn = TcpConnection::new(stream, addr);
        tracing::debug!(id = %conn.id(), %addr, "accepted TCP connection");
        Ok(conn)
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}
