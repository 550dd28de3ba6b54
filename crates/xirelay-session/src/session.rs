//! The account session: one connection plus the identity derived from it.
//!
//! A session never outlives its connection. Protocol steps that need a fresh
//! connection call [`Session::reopen`], which closes the old handle before
//! opening a new one. The identity (account id, addresses) survives
//! reconnects; it is what the game-data relay needs later.

use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

use xirelay_transport::{
    connect, ipv4_of, local_ipv4, Connection, TcpConnection, TransportError,
};

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// A remote host and port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// ---------------------------------------------------------------------------
// SessionIdentity
// ---------------------------------------------------------------------------

/// Who the session belongs to and where it talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionIdentity {
    /// Assigned by the server on a successful login or account creation.
    /// Zero until then.
    pub account_id: u32,
    /// This machine's address, from a lookup of its primary hostname.
    pub local_address: Option<Ipv4Addr>,
    /// The server's address in 32-bit form. `255.255.255.255` when the
    /// server was only reachable over IPv6.
    pub server_address: Ipv4Addr,
}

impl Default for SessionIdentity {
    fn default() -> Self {
        Self {
            account_id: 0,
            local_address: None,
            server_address: Ipv4Addr::BROADCAST,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// An outbound connection handle and the identity attached to it.
pub struct Session {
    endpoint: Endpoint,
    timeout: Option<Duration>,
    connection: Option<TcpConnection>,
    identity: SessionIdentity,
    connections_opened: u64,
}

impl Session {
    /// Creates a closed session for `endpoint`.
    ///
    /// `timeout` bounds every send and receive on the connections the
    /// session opens; `None` waits forever.
    pub fn new(endpoint: Endpoint, timeout: Option<Duration>) -> Self {
        Self {
            endpoint,
            timeout,
            connection: None,
            identity: SessionIdentity::default(),
            connections_opened: 0,
        }
    }

    /// Creates a closed session that already knows its identity, e.g. the
    /// game-data session following a successful login.
    pub fn with_identity(
        endpoint: Endpoint,
        timeout: Option<Duration>,
        identity: SessionIdentity,
    ) -> Self {
        Self {
            identity,
            ..Self::new(endpoint, timeout)
        }
    }

    /// Opens a connection unless one is already open.
    pub async fn ensure_open(&mut self) -> Result<(), TransportError> {
        if self.connection.is_none() {
            self.open().await?;
        }
        Ok(())
    }

    /// Closes the current connection, if any, and opens a new one.
    pub async fn reopen(&mut self) -> Result<(), TransportError> {
        self.close().await;
        self.open().await
    }

    async fn open(&mut self) -> Result<(), TransportError> {
        let conn = connect(&self.endpoint.host, self.endpoint.port)
            .await?
            .with_timeout(self.timeout);

        self.identity.local_address = local_ipv4().await;
        self.identity.server_address = match ipv4_of(&conn.peer_addr()) {
            Some(addr) => addr,
            None => {
                tracing::warn!(
                    peer = %conn.peer_addr(),
                    "server has no IPv4 address, reporting 255.255.255.255"
                );
                Ipv4Addr::BROADCAST
            }
        };

        self.connections_opened += 1;
        tracing::debug!(
            id = %conn.id(),
            endpoint = %self.endpoint,
            n = self.connections_opened,
            "session connection opened"
        );
        self.connection = Some(conn);
        Ok(())
    }

    /// Shuts down and releases the current connection.
    ///
    /// The handle is invalidated even if the shutdown itself fails.
    pub async fn close(&mut self) {
        if let Some(conn) = self.connection.take() {
            if let Err(e) = conn.close().await {
                tracing::debug!(id = %conn.id(), error = %e, "close failed");
            }
        }
    }

    /// Hands the open connection over to the caller, leaving the session
    /// closed but keeping its identity.
    pub fn take_connection(&mut self) -> Option<TcpConnection> {
        self.connection.take()
    }

    /// The open connection, if any.
    pub fn connection(&self) -> Option<&TcpConnection> {
        self.connection.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn identity(&self) -> SessionIdentity {
        self.identity
    }

    /// Records the account id the server assigned.
    pub fn set_account_id(&mut self, account_id: u32) {
        self.identity.account_id = account_id;
    }

    /// How many connections this session has opened so far.
    pub fn connections_opened(&self) -> u64 {
        self.connections_opened
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_closed_with_default_identity() {
        let session = Session::new(Endpoint::new("127.0.0.1", 54231), None);
        assert!(!session.is_open());
        assert_eq!(session.connections_opened(), 0);
        assert_eq!(session.identity().account_id, 0);
        assert_eq!(session.identity().server_address, Ipv4Addr::BROADCAST);
    }

    #[test]
    fn test_endpoint_display() {
        assert_eq!(Endpoint::new("example.org", 54230).to_string(), "example.org:54230");
    }

    #[tokio::test]
    async fn test_reopen_keeps_identity() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let mut session = Session::new(Endpoint::new("127.0.0.1", port), None);
        session.ensure_open().await.unwrap();
        session.set_account_id(99);
        session.reopen().await.unwrap();
        session.ensure_open().await.unwrap();

        assert_eq!(session.connections_opened(), 2);
        assert_eq!(session.identity().account_id, 99);
        assert_eq!(session.identity().server_address, Ipv4Addr::LOCALHOST);
        assert_eq!(session.identity().local_address, local_ipv4().await);

        session.close().await;
        assert!(!session.is_open());
    }
}
