//! TCP connection used by the account client, the lobby relay, and the
//! game-data relay.

use std::future::Future;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::{Connection, ConnectionId, TransportError};

/// Size of the buffer a single [`Connection::recv`] reads into.
pub const DEFAULT_RECV_CAPACITY: usize = 4096;

/// A single TCP connection.
///
/// The stream is split into halves behind separate locks so a pending
/// receive never blocks a send.
#[derive(Debug)]
pub struct TcpConnection {
    id: ConnectionId,
    peer_addr: SocketAddr,
    local_addr: Option<SocketAddr>,
    reader: Mutex<OwnedReadHalf>,
    writer: Mutex<OwnedWriteHalf>,
    timeout: Option<Duration>,
    recv_capacity: usize,
}

impl TcpConnection {
    /// Wraps an established stream. `peer_addr` is the address it is
    /// connected to.
    pub fn new(stream: TcpStream, peer_addr: SocketAddr) -> Self {
        let local_addr = stream.local_addr().ok();
        let (reader, writer) = stream.into_split();
        Self {
            id: ConnectionId::next(),
            peer_addr,
            local_addr,
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            timeout: None,
            recv_capacity: DEFAULT_RECV_CAPACITY,
        }
    }

    /// Applies a deadline to every send and receive. `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets how many bytes a single [`Connection::recv`] may return.
    pub fn with_recv_capacity(mut self, capacity: usize) -> Self {
        self.recv_capacity = capacity.max(1);
        self
    }

    /// The remote end of the connection.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// The local end of the connection, if the OS reported one.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Receives exactly `len` bytes.
    ///
    /// A peer that closes before `len` bytes arrive yields
    /// [`TransportError::ConnectionClosed`].
    pub async fn recv_exact(&self, len: usize) -> Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; len];
        let result = with_deadline(self.timeout, "receive", async {
            self.reader.lock().await.read_exact(&mut buf).await
        })
        .await?;

        match result {
            Ok(_) => Ok(buf),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(
                TransportError::ConnectionClosed(format!(
                    "peer closed before {len} bytes arrived"
                )),
            ),
            Err(e) => Err(TransportError::ReceiveFailed(e)),
        }
    }
}

impl Connection for TcpConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        with_deadline(self.timeout, "send", async {
            self.writer.lock().await.write_all(data).await
        })
        .await?
        .map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut buf = vec![0u8; self.recv_capacity];
        let n = with_deadline(self.timeout, "receive", async {
            self.reader.lock().await.read(&mut buf).await
        })
        .await?
        .map_err(TransportError::ReceiveFailed)?;

        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        Ok(Some(buf))
    }

    async fn close(&self) -> Result<(), TransportError> {
        match self.writer.lock().await.shutdown().await {
            Ok(()) => Ok(()),
            // The peer already went away; nothing left to shut down.
            Err(e) if e.kind() == ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(TransportError::SendFailed(e)),
        }
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// Runs `fut` under an optional deadline.
///
/// The outer `Result` carries the timeout, the inner one the I/O outcome.
async fn with_deadline<T, F>(
    limit: Option<Duration>,
    op: &'static str,
    fut: F,
) -> Result<std::io::Result<T>, TransportError>
where
    F: Future<Output = std::io::Result<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| TransportError::TimedOut(op)),
        None => Ok(fut.await),
    }
}
