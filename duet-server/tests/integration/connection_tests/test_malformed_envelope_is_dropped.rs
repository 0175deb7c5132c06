use serde_json::json;

use duet_core::ServerEnvelope;

use crate::integration::init_tracing;
use crate::utils::{SIGNAL_TIMEOUT_MS, SILENCE_MS, TestClient, spawn_relay, wait_for_members};

#[tokio::test]
async fn test_malformed_envelope_is_dropped() {
    init_tracing();

    let (addr, service) = spawn_relay().await.expect("Failed to start relay");

    let mut alice = TestClient::connect(addr).await.expect("connect alice");
    let mut bob = TestClient::connect(addr).await.expect("connect bob");

    alice.send_raw("not json").await.expect("send garbage");
    alice.send_raw(r#"{"type":"join"}"#).await.expect("send roomless join");
    alice.send_raw(r#"{"room":"r1"}"#).await.expect("send typeless");
    alice.send_binary(&[1, 2, 3]).await.expect("send binary");

    // None of the above may answer with an error or close the channel.
    alice
        .expect_silence(SILENCE_MS)
        .await
        .expect("Malformed envelopes are never answered");
    assert_eq!(service.router().room_count(), 0);

    alice.join("r1").await.expect("alice join");
    wait_for_members(&service, "r1", 1).await.expect("alice joined");
    bob.join("r1").await.expect("bob join");
    wait_for_members(&service, "r1", 2).await.expect("bob joined");
    assert_eq!(
        alice.recv(SIGNAL_TIMEOUT_MS).await.expect("peer-joined"),
        ServerEnvelope::PeerJoined
    );

    // Signal naming a room the sender is not in is dropped too.
    bob.signal("elsewhere", json!({"candidate": {"candidate": "x"}}))
        .await
        .expect("send foreign signal");
    alice
        .expect_silence(SILENCE_MS)
        .await
        .expect("Foreign-room signal must not be relayed");

    let payload = json!({"candidate": {"candidate": "y"}});
    bob.signal("r1", payload.clone()).await.expect("send signal");
    assert_eq!(
        alice.recv(SIGNAL_TIMEOUT_MS).await.expect("signal"),
        ServerEnvelope::Signal { payload }
    );

    alice.close().await.expect("close alice");
    bob.close().await.expect("close bob");
}
