use duet_client::{
    CallError, EngineEventSender, NegotiationSession, NegotiationState, OfferKind, OfferOutcome,
    Role, SignalingClient,
};
use duet_core::{ClientMessage, ConnectionId, SessionDescription};
use tokio::sync::mpsc;

use crate::utils::{EngineCall, EngineLog, MockBehavior, MockEngine, audio_video_stream};

struct Fixture {
    session: NegotiationSession<MockEngine>,
    log: EngineLog,
    sent: mpsc::UnboundedReceiver<ClientMessage>,
    remote: ConnectionId,
    _inbound: mpsc::UnboundedSender<duet_core::ServerMessage>,
}

fn fixture() -> Fixture {
    let (out_tx, sent) = mpsc::unbounded_channel();
    let (inbound, in_rx) = mpsc::unbounded_channel();
    let (engine_tx, _engine_rx) = mpsc::unbounded_channel();

    let log = EngineLog::default();
    let engine = MockEngine::new(
        "Local",
        log.clone(),
        EngineEventSender::new(1, engine_tx),
        MockBehavior::default(),
    );
    let remote = ConnectionId::new();
    let session = NegotiationSession::new(
        remote,
        "Local",
        Role::Impolite,
        engine,
        SignalingClient::from_channels(out_tx, in_rx),
    );

    Fixture {
        session,
        log,
        sent,
        remote,
        _inbound: inbound,
    }
}

#[tokio::test]
async fn test_answer_without_offer_is_rejected() {
    let mut f = fixture();

    let result = f
        .session
        .receive_answer(SessionDescription::answer("stray"), OfferKind::Invite)
        .await;

    assert!(matches!(result, Err(CallError::InvalidState { .. })));
    assert_eq!(f.session.state(), NegotiationState::Stable);
    assert!(f.log.calls().is_empty());
}

#[tokio::test]
async fn test_answer_of_other_kind_is_rejected() {
    let mut f = fixture();
    f.session.create_offer(OfferKind::Invite).await.unwrap();

    let result = f
        .session
        .receive_answer(SessionDescription::answer("reneg"), OfferKind::Renegotiation)
        .await;

    assert!(matches!(result, Err(CallError::InvalidState { .. })));
    assert_eq!(
        f.session.state(),
        NegotiationState::HaveLocalOffer(OfferKind::Invite)
    );
}

#[tokio::test]
async fn test_invite_round_trip() {
    let mut f = fixture();

    f.session.create_offer(OfferKind::Invite).await.unwrap();
    assert_eq!(
        f.sent.try_recv().unwrap(),
        ClientMessage::UserCall {
            to: f.remote,
            offer: SessionDescription::offer("Local-offer-1"),
            name: "Local".into(),
        }
    );

    // A second offer while one is outstanding is out of order.
    assert!(matches!(
        f.session.create_offer(OfferKind::Renegotiation).await,
        Err(CallError::InvalidState { .. })
    ));

    f.session
        .receive_answer(SessionDescription::answer("Remote-answer-1"), OfferKind::Invite)
        .await
        .unwrap();
    assert_eq!(f.session.state(), NegotiationState::Stable);
    assert_eq!(
        f.log.calls(),
        vec![
            EngineCall::SetLocal(SessionDescription::offer("Local-offer-1")),
            EngineCall::SetRemote(SessionDescription::answer("Remote-answer-1")),
        ]
    );
}

#[tokio::test]
async fn test_renegotiation_offer_is_answered() {
    let mut f = fixture();

    let outcome = f
        .session
        .receive_offer(SessionDescription::offer("Remote-offer-2"), OfferKind::Renegotiation)
        .await
        .unwrap();

    assert_eq!(outcome, OfferOutcome::Answered);
    assert_eq!(f.session.state(), NegotiationState::Stable);
    assert_eq!(
        f.sent.try_recv().unwrap(),
        ClientMessage::NegoDone {
            to: f.remote,
            ans: SessionDescription::answer("Local-answer-1"),
        }
    );
}

#[tokio::test]
async fn test_mismatched_description_type_is_malformed() {
    let mut f = fixture();

    let as_offer = f
        .session
        .receive_offer(SessionDescription::answer("not an offer"), OfferKind::Invite)
        .await;
    assert!(matches!(as_offer, Err(CallError::MalformedDescription(_))));

    f.session.create_offer(OfferKind::Invite).await.unwrap();
    let as_answer = f
        .session
        .receive_answer(SessionDescription::offer("not an answer"), OfferKind::Invite)
        .await;
    assert!(matches!(as_answer, Err(CallError::MalformedDescription(_))));
}

#[tokio::test]
async fn test_unparseable_offer_is_malformed() {
    let mut f = fixture();

    let result = f
        .session
        .receive_offer(SessionDescription::offer("malformed"), OfferKind::Invite)
        .await;

    assert!(matches!(result, Err(CallError::MalformedDescription(_))));
    assert!(f.sent.try_recv().is_err(), "Nothing may be answered");
}

#[tokio::test]
async fn test_renegotiation_during_exchange_is_deferred() {
    let mut f = fixture();
    f.session.create_offer(OfferKind::Invite).await.unwrap();

    assert!(!f.session.request_renegotiation().await.unwrap());
    assert!(!f.session.request_renegotiation().await.unwrap());
    assert!(f.session.renegotiation_pending());
    assert!(!f.session.take_pending_renegotiation(), "Not stable yet");

    f.session
        .receive_answer(SessionDescription::answer("Remote-answer-1"), OfferKind::Invite)
        .await
        .unwrap();

    assert!(f.session.take_pending_renegotiation());
    assert!(!f.session.take_pending_renegotiation(), "Replayed once");
}

#[tokio::test]
async fn test_closed_session_rejects_everything() {
    let mut f = fixture();
    f.session.set_local_stream(audio_video_stream("Local"));
    let tracks = f.session.local_stream().unwrap().tracks().to_vec();
    f.session.create_offer(OfferKind::Invite).await.unwrap();

    assert!(f.session.close().await);
    assert!(!f.session.close().await);

    assert_eq!(f.session.state(), NegotiationState::Closed);
    assert_eq!(f.log.closes(), 1);
    for track in tracks {
        assert_eq!(track.stop_calls(), 1);
    }

    assert_eq!(
        f.session
            .receive_answer(SessionDescription::answer("late"), OfferKind::Invite)
            .await,
        Err(CallError::StaleNegotiationResult)
    );
    assert_eq!(
        f.session
            .receive_offer(SessionDescription::offer("late"), OfferKind::Renegotiation)
            .await,
        Err(CallError::StaleNegotiationResult)
    );
    assert_eq!(
        f.session.create_offer(OfferKind::Renegotiation).await,
        Err(CallError::StaleNegotiationResult)
    );
    assert_eq!(
        f.session.request_renegotiation().await,
        Err(CallError::StaleNegotiationResult)
    );
}
