use duet_client::CallState;
use duet_core::{IceCandidate, SdpType, SessionDescription, SignalPayload};

use crate::integration::{init_tracing, joined, wait_for_state};
use crate::utils::{EngineCall, STATE_TIMEOUT_MS, wait_until};

fn remote_candidate(label: &str) -> SignalPayload {
    SignalPayload::Candidate(IceCandidate {
        candidate: format!("candidate:{} 1 udp 2122260223 192.0.2.7 40000 typ host", label),
        sdp_mid: Some("0".to_owned()),
        sdp_m_line_index: Some(0),
        username_fragment: None,
    })
}

fn candidate_text(label: &str) -> String {
    format!("candidate:{} 1 udp 2122260223 192.0.2.7 40000 typ host", label)
}

#[tokio::test]
async fn test_candidate_buffering() {
    init_tracing();

    let harness = joined("r1").await;
    let engine = harness.engines.last().expect("engine built");

    // Candidates overtake the offer.
    harness.relay.push_payload(remote_candidate("a"));
    harness.relay.push_payload(remote_candidate("bad"));
    harness.relay.push_payload(remote_candidate("c"));
    harness
        .relay
        .push_payload(SignalPayload::Offer(SessionDescription::offer("v=0 remote")));

    wait_for_state(&harness.handle, CallState::Connected).await;
    assert!(wait_until(|| engine.added_candidates().len() == 3, STATE_TIMEOUT_MS).await);

    let calls = engine.calls();
    let remote_at = calls
        .iter()
        .position(|c| *c == EngineCall::SetRemote(SdpType::Offer))
        .expect("offer applied");
    let first_candidate_at = calls
        .iter()
        .position(|c| matches!(c, EngineCall::AddCandidate(_)))
        .expect("candidates applied");
    assert!(remote_at < first_candidate_at, "No candidate before the remote description");

    // Applied once each, in arrival order, and the rejected one did not stop the rest.
    assert_eq!(
        engine.added_candidates(),
        vec![candidate_text("a"), candidate_text("bad"), candidate_text("c")]
    );

    // Later candidates are applied directly.
    harness.relay.push_payload(remote_candidate("d"));
    assert!(
        wait_until(|| engine.added_candidates().len() == 4, STATE_TIMEOUT_MS).await
    );
    assert_eq!(engine.added_candidates()[3], candidate_text("d"));
    assert_eq!(harness.handle.snapshot().state, CallState::Connected);
}

#[tokio::test]
async fn test_slow_candidate_does_not_hold_up_leave() {
    init_tracing();

    let harness = joined("r1").await;
    let engine = harness.engines.last().expect("engine built");
    harness
        .relay
        .push_payload(SignalPayload::Offer(SessionDescription::offer("v=0 remote")));
    wait_for_state(&harness.handle, CallState::Connected).await;

    harness.relay.push_payload(remote_candidate("slow"));
    assert!(
        wait_until(
            || engine.added_candidates() == vec![candidate_text("slow")],
            STATE_TIMEOUT_MS
        )
        .await
    );

    // The engine is still busy with the candidate.
    harness.handle.leave().unwrap();
    wait_for_state(&harness.handle, CallState::Idle).await;

    assert!(harness.media.granted().iter().all(|m| !m.is_live()));
    assert!(!harness.relay.is_open());
    assert!(wait_until(|| engine.is_closed(), STATE_TIMEOUT_MS).await);
}
