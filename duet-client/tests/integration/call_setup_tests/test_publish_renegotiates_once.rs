use duet_client::CallEvent;

use crate::integration::{create_test_service, init_tracing};
use crate::utils::{EngineCall, MockBehavior, PeerOptions, establish_call, joined_pair};

/// After the answer A publishes its two tracks. The engine asks for
/// negotiation once per track, yet only one `peer:nego:needed` goes out, B
/// answers it and A ends up stable with B receiving A's stream.
#[tokio::test]
async fn test_publish_renegotiates_once() {
    init_tracing();
    let service = create_test_service();

    let a_options = PeerOptions {
        behavior: MockBehavior {
            negotiation_needed_per_track: true,
        },
        ..Default::default()
    };
    let (mut a, mut b) = joined_pair(&service, "R1", a_options, PeerOptions::default())
        .await
        .expect("Peers should join");

    establish_call(&mut a, &mut b).await.expect("Call should be established");

    let b_id = b.id;
    a.expect(|e| matches!(e, CallEvent::Renegotiated { remote } if *remote == b_id))
        .await
        .expect("Alice should apply peer:nego:final");

    let a_id = a.id;
    let stream = b
        .expect(|e| matches!(e, CallEvent::RemoteStream { .. }))
        .await
        .expect("Bob should receive Alice's stream");
    assert_eq!(
        stream,
        CallEvent::RemoteStream {
            remote: a_id,
            stream_id: "Alice-stream".into(),
        }
    );

    let extra = a.drain().await;
    assert!(
        !extra.iter().any(|e| matches!(e, CallEvent::Renegotiated { .. })),
        "Only one renegotiation expected, got {:?}",
        extra
    );

    assert_eq!(a.sent("peer:nego:needed").len(), 1);
    assert_eq!(b.sent("peer:nego:done").len(), 1);
    assert_eq!(a.engine_log.count(|c| *c == EngineCall::Publish(2)), 1);

    a.shutdown().await.unwrap();
    b.shutdown().await.unwrap();
}
