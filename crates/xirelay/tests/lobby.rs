//! Integration tests for the lobby handshake relay.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use xirelay::lobby::LobbyRelay;
use xirelay::shutdown::{self, ShutdownTrigger};
use xirelay::RelayError;
use xirelay_transport::{TcpConnection, TcpTransport, Transport, TransportError};

// =========================================================================
// Helpers
// =========================================================================

async fn start_lobby() -> (ShutdownTrigger, u16, tokio::task::JoinHandle<()>) {
    let relay = LobbyRelay::bind(0, Some(Duration::from_secs(5))).await.unwrap();
    let port = relay.local_addr().unwrap().port();
    let (trigger, shutdown) = shutdown::channel();
    let handle = tokio::spawn(async move {
        relay.run(shutdown).await.unwrap();
    });
    (trigger, port, handle)
}

async fn connect(port: u16) -> TcpStream {
    TcpStream::connect(("127.0.0.1", port)).await.unwrap()
}

/// A client message with `marker` at offset 4 and a recognisable tail.
fn message(len: usize, marker: u8) -> Vec<u8> {
    let mut msg: Vec<u8> = (0..len).map(|i| i as u8).collect();
    msg[4] = marker;
    msg
}

async fn read_exactly(stream: &mut TcpStream, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    tokio::time::timeout(Duration::from_secs(5), stream.read_exact(&mut buf))
        .await
        .unwrap()
        .unwrap();
    buf
}

/// Reads until the relay closes the connection.
async fn read_rest(stream: &mut TcpStream) -> Vec<u8> {
    let mut rest = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut rest))
        .await
        .unwrap()
        .unwrap();
    rest
}

/// Accepts a fixed number of connections, then fails every accept the way
/// a process out of file descriptors does.
struct ExhaustedTransport {
    inner: TcpTransport,
    accepts_left: usize,
    attempts: Arc<AtomicUsize>,
}

impl Transport for ExhaustedTransport {
    type Connection = TcpConnection;

    async fn accept(&mut self) -> Result<TcpConnection, TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.accepts_left == 0 {
            return Err(TransportError::AcceptFailed(std::io::Error::from_raw_os_error(24)));
        }
        self.accepts_left -= 1;
        self.inner.accept().await
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.inner.local_addr()
    }
}

// =========================================================================
// Handshake
// =========================================================================

#[tokio::test]
async fn test_existing_character_handshake() {
    let (_trigger, port, _handle) = start_lobby().await;
    let mut client = connect(port).await;

    client.write_all(&message(40, 0)).await.unwrap();
    let first = read_exactly(&mut client, 24).await;
    assert_eq!(first[0], 0x81);
    let stamp = u32::from_le_bytes(first[0x14..0x18].try_into().unwrap());
    let now = chrono::Utc::now().timestamp() as u32;
    assert!(now.wrapping_sub(stamp) < 60, "timestamp {stamp} not near {now}");

    client.write_all(&message(40, 0x28)).await.unwrap();
    let second = read_exactly(&mut client, 24).await;
    assert_eq!(second[0x00], 0x28);
    assert_eq!(second[0x04], 0x20);
    assert_eq!(second[0x08], 0x01);
    assert_eq!(second[0x0B], 0x7F);

    let third = message(50, 0);
    client.write_all(&third).await.unwrap();
    let echoed = read_rest(&mut client).await;
    assert_eq!(echoed.len(), 50);
    assert!(echoed[..32].iter().all(|&b| b == 0));
    assert_eq!(&echoed[32..], &third[32..]);
}

#[tokio::test]
async fn test_new_character_gets_long_reply() {
    let (_trigger, port, _handle) = start_lobby().await;
    let mut client = connect(port).await;

    client.write_all(&message(40, 0)).await.unwrap();
    read_exactly(&mut client, 24).await;

    // No marker at offset 4: the client is creating a character.
    let second_msg = message(64, 0x00);
    client.write_all(&second_msg).await.unwrap();
    let second = read_exactly(&mut client, 144).await;
    assert_eq!(second[0x00], 0x28);
    assert_eq!(&second[32..64], &second_msg[32..64]);
    assert!(second[64..].iter().all(|&b| b == 0));

    client.write_all(&message(36, 0)).await.unwrap();
    let echoed = read_rest(&mut client).await;
    assert_eq!(echoed.len(), 36);
}

#[tokio::test]
async fn test_fourth_message_is_never_read() {
    let (_trigger, port, _handle) = start_lobby().await;
    let mut client = connect(port).await;

    for (len, reply_len) in [(40, 24), (40, 24)] {
        client.write_all(&message(len, 0x28)).await.unwrap();
        read_exactly(&mut client, reply_len).await;
    }
    client.write_all(&message(40, 0x28)).await.unwrap();
    read_exactly(&mut client, 40).await;

    // End of stream right after the third reply: nothing is waiting for a
    // fourth message.
    let rest = read_rest(&mut client).await;
    assert!(rest.is_empty());
}

#[tokio::test]
async fn test_connections_are_independent() {
    let (_trigger, port, _handle) = start_lobby().await;
    let mut first = connect(port).await;
    let mut second = connect(port).await;

    first.write_all(&message(40, 0)).await.unwrap();
    second.write_all(&message(40, 0)).await.unwrap();
    read_exactly(&mut second, 24).await;
    read_exactly(&mut first, 24).await;

    second.write_all(&message(40, 0x28)).await.unwrap();
    first.write_all(&message(40, 0x01)).await.unwrap();
    assert_eq!(read_exactly(&mut second, 24).await.len(), 24);
    assert_eq!(read_exactly(&mut first, 144).await.len(), 144);
}

#[tokio::test]
async fn test_client_leaving_early_does_not_stop_relay() {
    let (_trigger, port, _handle) = start_lobby().await;

    let mut quitter = connect(port).await;
    quitter.write_all(&message(40, 0)).await.unwrap();
    read_exactly(&mut quitter, 24).await;
    drop(quitter);

    let mut client = connect(port).await;
    client.write_all(&message(40, 0)).await.unwrap();
    assert_eq!(read_exactly(&mut client, 24).await[0], 0x81);
}

// =========================================================================
// Shutdown
// =========================================================================

#[tokio::test]
async fn test_shutdown_joins_open_connections() {
    let (trigger, port, handle) = start_lobby().await;

    // Mid-handshake connection: shutdown must still let the relay finish.
    let mut client = connect(port).await;
    client.write_all(&message(40, 0)).await.unwrap();
    read_exactly(&mut client, 24).await;

    trigger.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("lobby relay did not stop")
        .unwrap();

    let rest = read_rest(&mut client).await;
    assert!(rest.is_empty());
}

// =========================================================================
// Accept failure
// =========================================================================

#[tokio::test]
async fn test_accept_failure_stops_relay_after_open_connections() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let attempts = Arc::new(AtomicUsize::new(0));
    let transport = ExhaustedTransport {
        inner: TcpTransport::from_listener(listener),
        accepts_left: 1,
        attempts: attempts.clone(),
    };
    let relay = LobbyRelay::from_transport(transport, Some(Duration::from_secs(5)));
    let (_trigger, shutdown) = shutdown::channel();
    let handle = tokio::spawn(relay.run(shutdown));

    let mut client = connect(port).await;
    client.write_all(&message(40, 0)).await.unwrap();
    read_exactly(&mut client, 24).await;

    // The next accept has failed, but the open handshake is still served.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!handle.is_finished());

    client.write_all(&message(40, 0x28)).await.unwrap();
    read_exactly(&mut client, 24).await;
    client.write_all(&message(40, 0)).await.unwrap();
    assert_eq!(read_rest(&mut client).await.len(), 40);

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("lobby relay kept accepting")
        .unwrap();
    assert!(matches!(
        result,
        Err(RelayError::Transport(TransportError::AcceptFailed(_)))
    ));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}
