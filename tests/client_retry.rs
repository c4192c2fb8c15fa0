//! End-to-end timeout and retry behavior against a silent peer.

use std::time::Duration;

use snmp_client::v3::{AuthProtocol, PrivProtocol};
use snmp_client::{oid, Client, Error};
use tokio::net::UdpSocket;

/// A bound socket that never answers, so every request times out.
async fn silent_peer() -> UdpSocket {
    UdpSocket::bind("127.0.0.1:0").await.unwrap()
}

/// Drain every datagram the peer has received so far.
async fn drain(peer: &UdpSocket) -> usize {
    // Local delivery is immediate, but give the last datagram a beat
    tokio::time::sleep(Duration::from_millis(50)).await;
    let mut count = 0;
    let mut buf = [0u8; 65535];
    while peer.try_recv_from(&mut buf).is_ok() {
        count += 1;
    }
    count
}

#[tokio::test]
async fn v3_get_times_out_after_configured_retries() {
    let peer = silent_peer().await;
    let addr = peer.local_addr().unwrap();

    let mut client = Client::builder(addr.to_string())
        .username("authprivmd5des")
        .auth(AuthProtocol::Md5, "maplesyrup")
        .privacy(PrivProtocol::Des, "maplesyrup")
        .timeout(Duration::from_micros(100))
        .retries(5)
        .connect()
        .await
        .unwrap();

    let err = client.get(&oid!(1, 3, 6, 1)).await.unwrap_err();

    match &err {
        Error::Timeout { retries, .. } => assert_eq!(*retries, 5),
        other => panic!("expected a timeout, got {other:?}"),
    }
    assert!(
        err.to_string().contains("5 retries"),
        "error message should state the retry count: {err}"
    );

    // retries=5 means 6 total attempts; for v3 each attempt is a discovery
    // probe, since discovery never completed
    assert_eq!(drain(&peer).await, 6);
}

#[tokio::test]
async fn v2c_get_times_out_after_configured_retries() {
    let peer = silent_peer().await;
    let addr = peer.local_addr().unwrap();

    let mut client = Client::builder(addr.to_string())
        .version_str("2c")
        .unwrap()
        .community("public")
        .timeout(Duration::from_millis(1))
        .retries(2)
        .connect()
        .await
        .unwrap();

    let err = client.get(&oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)).await.unwrap_err();
    assert!(matches!(err, Error::Timeout { retries: 2, .. }));
    assert_eq!(drain(&peer).await, 3);
}

#[tokio::test]
async fn zero_retries_sends_once() {
    let peer = silent_peer().await;
    let addr = peer.local_addr().unwrap();

    let mut client = Client::builder(addr.to_string())
        .version_str("1")
        .unwrap()
        .timeout(Duration::from_millis(1))
        .retries(0)
        .connect()
        .await
        .unwrap();

    let err = client.get(&oid!(1, 3, 6, 1)).await.unwrap_err();
    assert!(matches!(err, Error::Timeout { retries: 0, .. }));
    assert_eq!(drain(&peer).await, 1);
}
