use duet_client::{CallError, CallEvent, CallPhase, HangupReason, NegotiationState};
use duet_core::{ClientMessage, ConnectionId, ServerMessage, SessionDescription};

use crate::utils::{PeerOptions, Standalone};

/// An answer that shows up after the call was ended belongs to nothing and
/// is dropped without touching the engine.
#[tokio::test]
async fn test_answer_after_end_call_is_stale() {
    let mut peer = Standalone::new("Alice", PeerOptions::default()).await;
    let remote = ConnectionId::new();

    peer.controller.initiate_call(remote).await.unwrap();
    assert_eq!(peer.controller.phase(), CallPhase::InCall);
    assert_eq!(
        peer.controller.negotiation_state(),
        Some(NegotiationState::HaveLocalOffer(duet_client::OfferKind::Invite))
    );

    assert!(peer.controller.end_call(HangupReason::Local).await);
    assert!(!peer.controller.end_call(HangupReason::Local).await);
    assert_eq!(peer.controller.phase(), CallPhase::Idle);

    let calls_before = peer.engine_log.calls().len();
    let late = peer
        .controller
        .handle_server_message(ServerMessage::CallAccepted {
            from: remote,
            ans: SessionDescription::answer("late"),
        })
        .await;

    assert_eq!(late, Err(CallError::StaleNegotiationResult));
    assert_eq!(peer.engine_log.calls().len(), calls_before);
    assert_eq!(peer.controller.phase(), CallPhase::Idle);

    let sent = peer.take_sent();
    let ends = sent
        .iter()
        .filter(|m| matches!(m, ClientMessage::CallEnd { .. }))
        .count();
    assert_eq!(ends, 1, "call:end is sent once: {:?}", sent);

    let hung_up = peer
        .take_events()
        .into_iter()
        .filter(|e| matches!(e, CallEvent::HungUp { .. }))
        .count();
    assert_eq!(hung_up, 1);
}

/// Engine events queued by a session that has ended are not applied to the
/// next one.
#[tokio::test]
async fn test_engine_events_from_old_session_are_stale() {
    let mut peer = Standalone::new("Alice", PeerOptions::default()).await;
    let first = ConnectionId::new();

    peer.controller.initiate_call(first).await.unwrap();
    peer.controller
        .on_answer_received(first, SessionDescription::answer("Bob-answer-1"))
        .await
        .unwrap();
    peer.controller.end_call(HangupReason::Local).await;

    let second = ConnectionId::new();
    peer.controller.initiate_call(second).await.unwrap();

    // The first session published and asked for negotiation with
    // generation 1; we are on a later generation now.
    let stale = peer
        .controller
        .handle_engine_event(1, duet_client::EngineEvent::NegotiationNeeded)
        .await;
    assert_eq!(stale, Err(CallError::StaleNegotiationResult));
    assert_eq!(
        peer.controller.negotiation_state(),
        Some(NegotiationState::HaveLocalOffer(duet_client::OfferKind::Invite))
    );
}
