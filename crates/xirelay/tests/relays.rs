//! Integration tests for starting and stopping both relays together.

use std::net::Ipv4Addr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use xirelay::prelude::*;

fn config(data_port: u16) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.server.data_port = data_port;
    config.lobby.port = 0;
    config.relay_poll_interval_ms = 1;
    config.validated()
}

fn identity() -> SessionIdentity {
    SessionIdentity {
        account_id: 77,
        local_address: None,
        server_address: Ipv4Addr::BROADCAST,
    }
}

#[tokio::test]
async fn test_relays_serve_lobby_and_game_data() {
    let data = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let data_port = data.local_addr().unwrap().port();

    let relays = Relays::start(&config(data_port), identity()).await.unwrap();
    let (mut game_peer, _) = data.accept().await.unwrap();
    let lobby_port = relays.lobby_addr().port();
    let roster = relays.roster().clone();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let running = tokio::spawn(relays.run_until(async {
        let _ = stop_rx.await;
    }));

    // Game data: the identity opened on the data connection is served.
    game_peer.write_all(&[0x01]).await.unwrap();
    let mut reply = [0u8; 9];
    game_peer.read_exact(&mut reply).await.unwrap();
    assert_eq!(&reply[1..5], &77u32.to_le_bytes());
    assert_eq!(&reply[5..9], &[127, 0, 0, 1]);

    // Lobby: first handshake step answers locally.
    let mut lobby = TcpStream::connect(("127.0.0.1", lobby_port)).await.unwrap();
    lobby.write_all(&[0u8; 40]).await.unwrap();
    let mut first = [0u8; 24];
    lobby.read_exact(&mut first).await.unwrap();
    assert_eq!(first[0], 0x81);

    assert_eq!(roster.generation(), 0);

    stop_tx.send(()).unwrap();
    let end = tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("relays did not stop")
        .unwrap()
        .unwrap();
    assert_eq!(end, RelayEnd::Shutdown);
}

#[tokio::test]
async fn test_relays_stop_when_game_peer_leaves() {
    let data = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let data_port = data.local_addr().unwrap().port();

    let relays = Relays::start(&config(data_port), identity()).await.unwrap();
    let (game_peer, _) = data.accept().await.unwrap();
    drop(game_peer);

    let end = tokio::time::timeout(
        Duration::from_secs(5),
        relays.run_until(std::future::pending()),
    )
    .await
    .expect("relays did not stop")
    .unwrap();
    assert_eq!(end, RelayEnd::PeerClosed);
}

#[tokio::test]
async fn test_start_fails_without_data_server() {
    let data = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let data_port = data.local_addr().unwrap().port();
    drop(data);

    let result = Relays::start(&config(data_port), identity()).await;
    assert!(matches!(
        result,
        Err(RelayError::Transport(TransportError::ConnectFailed { .. }))
    ));
}
