use duet_client::{CallCommand, CallError, CallEvent, ClientConfig, HangupReason};
use std::time::Duration;

use crate::integration::{create_test_service, init_tracing};
use crate::utils::{PeerOptions, joined_pair};

/// An invitation nobody answers ends the call on the caller's side and
/// withdraws it on the callee's.
#[tokio::test]
async fn test_unanswered_call_times_out() {
    init_tracing();
    let service = create_test_service();

    let a_options = PeerOptions {
        config: ClientConfig::default()
            .with_timeouts(Duration::from_millis(300), Duration::from_millis(300)),
        ..Default::default()
    };
    let b_options = PeerOptions {
        config: ClientConfig::default().with_auto_accept(false),
        ..Default::default()
    };
    let (mut a, mut b) = joined_pair(&service, "R1", a_options, b_options)
        .await
        .expect("Peers should join");

    a.send(CallCommand::Call(b.id));
    b.expect(|e| matches!(e, CallEvent::IncomingCall { .. }))
        .await
        .expect("Bob should hold the call");

    let failed = a
        .expect(|e| matches!(e, CallEvent::CallFailed { .. }))
        .await
        .expect("Alice should give up");
    assert_eq!(
        failed,
        CallEvent::CallFailed {
            remote: Some(b.id),
            error: CallError::Timeout("call invitation"),
        }
    );

    let b_id = b.id;
    a.expect(|e| {
        *e == CallEvent::HungUp {
            remote: b_id,
            reason: HangupReason::Timeout,
        }
    })
    .await
    .expect("Alice should hang up");
    assert_eq!(a.sent("call:end").len(), 1);

    // The withdrawn invitation can no longer be accepted.
    b.drain().await;
    b.send(CallCommand::Accept);
    let refused = b
        .expect(|e| matches!(e, CallEvent::CallFailed { .. }))
        .await
        .expect("Accept should fail");
    assert!(matches!(
        refused,
        CallEvent::CallFailed {
            error: CallError::InvalidState { .. },
            ..
        }
    ));
    assert!(b.sent("call:accepted").is_empty());

    a.shutdown().await.unwrap();
    b.shutdown().await.unwrap();
}
