use duet_client::{CallState, Role};
use duet_core::{SdpType, ServerEnvelope, SessionDescription, SignalPayload};
use serde_json::json;

use crate::integration::{init_tracing, joined, wait_for_state};
use crate::utils::{EngineCall, STATE_TIMEOUT_MS, wait_until};

#[tokio::test]
async fn test_unsolicited_answer_is_ignored() {
    init_tracing();

    let harness = joined("r1").await;
    let engine = harness.engines.last().expect("engine built");

    harness
        .relay
        .push_payload(SignalPayload::Answer(SessionDescription::answer("v=0 remote")));
    harness.relay.push(ServerEnvelope::Signal {
        payload: json!({"bogus": 1}),
    });
    // A marker the controller does act on, processed after the two above.
    harness.relay.push(ServerEnvelope::PeerJoined);
    assert!(
        wait_until(
            || engine.calls().contains(&EngineCall::CreateOffer),
            STATE_TIMEOUT_MS
        )
        .await
    );

    assert!(!engine.calls().contains(&EngineCall::SetRemote(SdpType::Answer)));
    let snapshot = harness.handle.snapshot();
    assert_eq!(snapshot.state, CallState::Negotiating);
    assert_eq!(snapshot.role, Role::Offerer);
}

#[tokio::test]
async fn test_only_the_first_offer_is_answered() {
    init_tracing();

    let harness = joined("r1").await;
    let engine = harness.engines.last().expect("engine built");

    harness
        .relay
        .push_payload(SignalPayload::Offer(SessionDescription::offer("v=0 first")));
    wait_for_state(&harness.handle, CallState::Connected).await;

    harness
        .relay
        .push_payload(SignalPayload::Offer(SessionDescription::offer("v=0 third party")));
    harness.relay.push(ServerEnvelope::PeerJoined);
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let answers = engine
        .calls()
        .into_iter()
        .filter(|c| *c == EngineCall::CreateAnswer)
        .count();
    assert_eq!(answers, 1);
    assert!(!engine.calls().contains(&EngineCall::CreateOffer));
    assert_eq!(harness.handle.snapshot().state, CallState::Connected);
}

#[tokio::test]
async fn test_rejected_offer_keeps_session() {
    init_tracing();

    let harness = joined("r1").await;
    let engine = harness.engines.last().expect("engine built");

    harness
        .relay
        .push_payload(SignalPayload::Offer(SessionDescription::offer("garbage")));
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert_eq!(harness.handle.snapshot().state, CallState::Negotiating);
    harness
        .relay
        .push_payload(SignalPayload::Offer(SessionDescription::offer("v=0 retry")));

    let snapshot = wait_for_state(&harness.handle, CallState::Connected).await;
    assert_eq!(snapshot.role, Role::Answerer);
    assert!(engine.calls().contains(&EngineCall::CreateAnswer));
}
