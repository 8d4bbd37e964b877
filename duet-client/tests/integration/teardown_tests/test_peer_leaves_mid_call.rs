use duet_client::{CallEvent, HangupReason};

use crate::integration::{create_test_service, init_tracing};
use crate::utils::{PeerOptions, establish_call, joined_pair};

#[tokio::test]
async fn test_peer_leaves_mid_call() {
    init_tracing();
    let service = create_test_service();

    let (mut a, mut b) = joined_pair(&service, "R1", PeerOptions::default(), PeerOptions::default())
        .await
        .expect("Peers should join");
    establish_call(&mut a, &mut b).await.expect("Call should be established");

    let b_id = b.id;
    b.shutdown().await.expect("Bob should stop cleanly");

    // Bob's own hang up and his departure both reach Alice; whichever comes
    // first ends the call, the other is ignored.
    let hung_up = a
        .expect(|e| matches!(e, CallEvent::HungUp { .. }))
        .await
        .expect("Alice's call should end");
    assert!(matches!(
        hung_up,
        CallEvent::HungUp {
            remote,
            reason: HangupReason::Remote | HangupReason::PeerLeft,
        } if remote == b_id
    ));

    a.expect(|e| *e == CallEvent::PeerLeft(b_id))
        .await
        .expect("Alice should see Bob leave");

    let rest = a.drain().await;
    assert!(!rest.iter().any(|e| matches!(e, CallEvent::HungUp { .. })));
    assert_eq!(a.engine_log.closes(), 1);

    a.shutdown().await.unwrap();
}
