use duet_client::{CallState, Role};
use duet_core::{SdpType, SessionDescription, SignalPayload};

use crate::integration::{init_tracing, joined, wait_for_state};
use crate::utils::{EngineCall, STATE_TIMEOUT_MS, wait_until};

#[tokio::test]
async fn test_answerer_flow() {
    init_tracing();

    let harness = joined("r1").await;
    let engine = harness.engines.last().expect("engine built");

    harness
        .relay
        .push_payload(SignalPayload::Offer(SessionDescription::offer("v=0 remote")));
    let snapshot = wait_for_state(&harness.handle, CallState::Connected).await;

    assert_eq!(snapshot.role, Role::Answerer);
    assert_eq!(
        engine.calls()[..4],
        [
            EngineCall::AddLocalMedia(2),
            EngineCall::SetRemote(SdpType::Offer),
            EngineCall::CreateAnswer,
            EngineCall::SetLocal(SdpType::Answer),
        ]
    );
    assert!(
        wait_until(
            || harness
                .relay
                .sent_payloads()
                .iter()
                .any(|p| matches!(p, SignalPayload::Answer(_))),
            STATE_TIMEOUT_MS
        )
        .await
    );
    assert!(
        !engine.calls().contains(&EngineCall::CreateOffer),
        "The answerer never offers"
    );

    let snapshot = harness
        .handle
        .wait_for(|s| s.surfaces.remote.is_some())
        .await
        .unwrap();
    assert_eq!(snapshot.surfaces.remote.as_deref(), Some("remote-stream-1"));
}
