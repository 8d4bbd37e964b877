use duet_client::{CallCommand, CallEvent, HangupReason, MediaStream, MediaTrack, TrackKind};
use duet_core::ConnectionId;

use crate::integration::{create_test_service, init_tracing};
use crate::utils::{PeerOptions, Standalone, audio_video_stream, establish_call, joined_pair};

/// The engine reports Alice's audio and video one track at a time. Bob keeps
/// both under one stream and stops both when he hangs up.
#[tokio::test]
async fn test_every_remote_track_is_stopped() {
    init_tracing();
    let service = create_test_service();

    let (mut a, mut b) = joined_pair(&service, "R1", PeerOptions::default(), PeerOptions::default())
        .await
        .expect("Peers should join");
    establish_call(&mut a, &mut b).await.expect("Call should be established");

    let b_id = b.id;
    a.expect(|e| matches!(e, CallEvent::Renegotiated { remote } if *remote == b_id))
        .await
        .expect("Alice should apply peer:nego:final");
    b.expect(|e| matches!(e, CallEvent::RemoteStream { .. }))
        .await
        .expect("Bob should receive Alice's stream");

    let streams = b
        .drain()
        .await
        .into_iter()
        .filter(|e| matches!(e, CallEvent::RemoteStream { .. }))
        .count();
    assert_eq!(streams, 0, "The second track joins the first stream");

    b.send(CallCommand::HangUp);
    b.expect(|e| matches!(e, CallEvent::HungUp { reason: HangupReason::Local, .. }))
        .await
        .expect("Bob should hang up");
    b.drain().await;

    let remote_tracks = b.engine_log.remote_tracks();
    assert_eq!(remote_tracks.len(), 2);
    for track in remote_tracks {
        assert_eq!(track.stop_calls(), 1, "Remote {} track", track.kind());
    }

    a.shutdown().await.unwrap();
    b.shutdown().await.unwrap();
}

/// Tracks of one stream reported separately are held together; a track of a
/// second stream is released on arrival.
#[tokio::test]
async fn test_remote_tracks_are_merged_by_stream() {
    let mut peer = Standalone::new("Alice", PeerOptions::default()).await;
    let remote = ConnectionId::new();
    peer.controller.initiate_call(remote).await.unwrap();
    peer.take_events();

    let bob = audio_video_stream("Bob");
    for track in bob.tracks() {
        peer.controller
            .on_remote_track(MediaStream::new(bob.id(), vec![track.clone()]))
            .unwrap();
    }

    let other = audio_video_stream("Mallory");
    peer.controller.on_remote_track(other.clone()).unwrap();
    for track in other.tracks() {
        assert_eq!(track.stop_calls(), 1);
    }

    let held = peer
        .controller
        .session()
        .and_then(|s| s.remote_stream())
        .expect("A remote stream is held");
    assert_eq!(held.id(), "Bob-stream");
    assert_eq!(held.tracks().len(), 2);
    assert_eq!(held.tracks_of(TrackKind::Video).count(), 1);

    let reported = peer
        .take_events()
        .into_iter()
        .filter(|e| matches!(e, CallEvent::RemoteStream { .. }))
        .count();
    assert_eq!(reported, 1);

    peer.controller.end_call(HangupReason::Local).await;
    for track in bob.tracks() {
        assert_eq!(track.stop_calls(), 1);
    }
}
