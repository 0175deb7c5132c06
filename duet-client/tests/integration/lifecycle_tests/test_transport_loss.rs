use duet_client::{CallState, Connectivity, EngineEvent};

use crate::integration::{init_tracing, joined, wait_for_state};
use crate::utils::{STATE_TIMEOUT_MS, wait_until};

#[tokio::test]
async fn test_relay_drop_fails_call() {
    init_tracing();

    let harness = joined("r1").await;
    let engine = harness.engines.last().expect("engine built");

    harness.relay.drop_connection();
    let snapshot = wait_for_state(&harness.handle, CallState::Failed).await;

    assert!(snapshot.status.contains("relay"), "status: {}", snapshot.status);
    assert!(harness.media.granted().iter().all(|m| !m.is_live()));
    assert!(wait_until(|| engine.is_closed(), STATE_TIMEOUT_MS).await);

    harness.handle.join("r1").unwrap();
    wait_for_state(&harness.handle, CallState::Negotiating).await;
    assert_eq!(harness.relay.connections(), 2);
}

#[tokio::test]
async fn test_connectivity_failure_fails_call() {
    init_tracing();

    let harness = joined("r1").await;
    let engine = harness.engines.last().expect("engine built");

    engine.emit(EngineEvent::Connectivity(Connectivity::Failed));
    let snapshot = wait_for_state(&harness.handle, CallState::Failed).await;

    assert!(snapshot.status.contains("connectivity"), "status: {}", snapshot.status);
    assert!(!harness.relay.is_open());
}

#[tokio::test]
async fn test_disconnected_is_reported_without_teardown() {
    init_tracing();

    let harness = joined("r1").await;
    let engine = harness.engines.last().expect("engine built");

    engine.emit(EngineEvent::Connectivity(Connectivity::Disconnected));
    let snapshot = tokio::time::timeout(
        std::time::Duration::from_millis(STATE_TIMEOUT_MS),
        harness
            .handle
            .wait_for(|s| s.status == "Connection: disconnected"),
    )
    .await
    .expect("status update")
    .unwrap();

    assert_eq!(snapshot.state, CallState::Negotiating);
    assert!(harness.relay.is_open());
}
