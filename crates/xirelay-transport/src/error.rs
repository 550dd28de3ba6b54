/// Errors that can occur in the transport layer.
///
/// Every variant that wraps an [`std::io::Error`] names the stage that
/// failed, so a caller can report "bind failed" rather than a bare OS error.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Name resolution itself failed (DNS error, malformed host).
    #[error("failed to obtain address information for {host}: {source}")]
    ResolutionFailed {
        host: String,
        #[source]
        source: std::io::Error,
    },

    /// Resolution succeeded but produced no usable candidate.
    #[error("no address found for {0}")]
    NoAddress(String),

    /// A hostname lookup found no IPv4 address.
    #[error("host not found: {0}")]
    HostNotFound(String),

    /// Creating the socket failed.
    #[error("failed to create socket: {0}")]
    SocketCreateFailed(#[source] std::io::Error),

    /// Connecting to the remote server failed.
    #[error("failed to connect to {addr}: {source}")]
    ConnectFailed {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Binding the listening socket failed.
    #[error("failed to bind port {port}: {source}")]
    BindFailed {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// Putting the bound socket into the listening state failed.
    #[error("failed to listen on port {port}: {source}")]
    ListenFailed {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// Accepting an incoming connection failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// The bound socket could not report its local address.
    #[error("failed to read local address: {0}")]
    LocalAddrUnavailable(#[source] std::io::Error),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// The peer closed the connection.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// A send or receive did not complete before its deadline.
    #[error("{0} timed out")]
    TimedOut(&'static str),
}
