use serde_json::json;

use duet_core::ServerEnvelope;

use crate::integration::init_tracing;
use crate::utils::{SIGNAL_TIMEOUT_MS, SILENCE_MS, TestClient, spawn_relay, wait_for_members};

#[tokio::test]
async fn test_three_peers_join() {
    init_tracing();

    let (addr, service) = spawn_relay().await.expect("Failed to start relay");

    let mut client1 = TestClient::connect(addr).await.expect("connect 1");
    let mut client2 = TestClient::connect(addr).await.expect("connect 2");
    let mut client3 = TestClient::connect(addr).await.expect("connect 3");

    client1.join("mesh").await.expect("join 1");
    wait_for_members(&service, "mesh", 1).await.expect("1 joined");
    client2.join("mesh").await.expect("join 2");
    wait_for_members(&service, "mesh", 2).await.expect("2 joined");
    client3.join("mesh").await.expect("join 3");
    wait_for_members(&service, "mesh", 3).await.expect("3 joined");

    // client1 heard about 2 and 3, client2 only about 3.
    for _ in 0..2 {
        assert_eq!(
            client1.recv(SIGNAL_TIMEOUT_MS).await.expect("peer-joined"),
            ServerEnvelope::PeerJoined
        );
    }
    assert_eq!(
        client2.recv(SIGNAL_TIMEOUT_MS).await.expect("peer-joined"),
        ServerEnvelope::PeerJoined
    );
    client3
        .expect_silence(SILENCE_MS)
        .await
        .expect("Newest member is not told about itself");

    // No cap: a signal reaches every other member.
    let payload = json!({"candidate": {"candidate": "from-3"}});
    client3.signal("mesh", payload.clone()).await.expect("signal");
    for client in [&mut client1, &mut client2] {
        assert_eq!(
            client.recv(SIGNAL_TIMEOUT_MS).await.expect("signal"),
            ServerEnvelope::Signal {
                payload: payload.clone()
            }
        );
    }

    client1.close().await.expect("close 1");
    client2.close().await.expect("close 2");
    client3.close().await.expect("close 3");
}
