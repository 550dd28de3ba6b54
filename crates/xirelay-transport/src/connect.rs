//! Outbound connection factory and hostname resolution.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tokio::net::{lookup_host, TcpSocket};

use crate::{Connection, TcpConnection, TransportError};

/// Resolves `host:port` and opens a TCP connection to it.
///
/// Resolution is family-agnostic, but only the *first* candidate is tried:
/// if creating the socket or connecting to that address fails, the whole
/// call fails. There is no fallback to later candidates.
pub async fn connect(
    host: &str,
    port: u16,
) -> Result<TcpConnection, TransportError> {
    let mut candidates = lookup_host((host, port)).await.map_err(|source| {
        TransportError::ResolutionFailed {
            host: host.to_string(),
            source,
        }
    })?;

    let addr = candidates
        .next()
        .ok_or_else(|| TransportError::NoAddress(format!("{host}:{port}")))?;

    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4(),
        SocketAddr::V6(_) => TcpSocket::new_v6(),
    }
    .map_err(TransportError::SocketCreateFailed)?;

    let stream = socket
        .connect(addr)
        .await
        .map_err(|source| TransportError::ConnectFailed { addr, source })?;

    let conn = TcpConnection::new(stream, addr);
    tracing::debug!(id = %conn.id(), %addr, "connected to server");
    Ok(conn)
}

/// Resolves a bare hostname to its IPv4 address.
///
/// A plain forward lookup: no socket is created.
pub async fn resolve_hostname(host: &str) -> Result<Ipv4Addr, TransportError> {
    let candidates = lookup_host((host, 0))
        .await
        .map_err(|_| TransportError::HostNotFound(host.to_string()))?;

    candidates
        .filter_map(|addr| ipv4_of(&addr))
        .next()
        .ok_or_else(|| TransportError::HostNotFound(host.to_string()))
}

/// Looks up the local machine's primary hostname and returns its first IPv4
/// address, or `None` if it has none.
pub async fn local_ipv4() -> Option<Ipv4Addr> {
    let name = gethostname::gethostname();
    let Some(host) = name.to_str() else {
        tracing::warn!(hostname = ?name, "local hostname is not valid UTF-8");
        return None;
    };

    match resolve_hostname(host).await {
        Ok(addr) => Some(addr),
        Err(e) => {
            tracing::warn!(hostname = host, error = %e, "local address unknown");
            None
        }
    }
}

/// Returns the IPv4 form of a socket address, unwrapping IPv4-mapped IPv6.
pub fn ipv4_of(addr: &SocketAddr) -> Option<Ipv4Addr> {
    match addr.ip() {
        IpAddr::V4(v4) => Some(v4),
        IpAddr::V6(v6) => v6.to_ipv4_mapped(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_of_plain_v4() {
        let addr: SocketAddr = "10.1.2.3:54231".parse().unwrap();
        assert_eq!(ipv4_of(&addr), Some(Ipv4Addr::new(10, 1, 2, 3)));
    }

    #[test]
    fn test_ipv4_of_mapped_v6() {
        let addr: SocketAddr = "[::ffff:192.168.0.7]:80".parse().unwrap();
        assert_eq!(ipv4_of(&addr), Some(Ipv4Addr::new(192, 168, 0, 7)));
    }

    #[test]
    fn test_ipv4_of_real_v6_is_none() {
        let addr: SocketAddr = "[2001:db8::1]:80".parse().unwrap();
        assert_eq!(ipv4_of(&addr), None);
    }

    #[tokio::test]
    async fn test_resolve_localhost() {
        let ip = resolve_hostname("127.0.0.1").await.unwrap();
        assert_eq!(ip, Ipv4Addr::LOCALHOST);
    }

    #[tokio::test]
    async fn test_local_ipv4_follows_hostname_lookup() {
        let name = gethostname::gethostname();
        let expected = match name.to_str() {
            Some(host) => resolve_hostname(host).await.ok(),
            None => None,
        };
        assert_eq!(local_ipv4().await, expected);
    }

    #[tokio::test]
    async fn test_connect_refused_is_connect_failed() {
        // Bind then drop to get a port that is almost certainly closed.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = connect("127.0.0.1", port).await.unwrap_err();
        assert!(matches!(err, TransportError::ConnectFailed { .. }));
    }
}
