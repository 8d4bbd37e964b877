use duet_core::{ClientMessage, RoomId, ServerMessage, SessionDescription};
use duet_server::{ServerConfig, SignalingService};

use crate::integration::init_tracing;
use crate::utils::drain_messages;

#[tokio::test]
async fn test_rapid_message_sending() {
    init_tracing();

    let service = SignalingService::new(ServerConfig::default());
    let (a, _a_rx) = service.connect();
    let (b, mut b_rx) = service.connect();

    for (id, name) in [(a, "A"), (b, "B")] {
        service
            .handle_message(
                id,
                ClientMessage::RoomJoin {
                    email: format!("{}@example.com", name),
                    room: RoomId::from("R1"),
                    name: name.into(),
                },
            )
            .await
            .expect("Join failed");
    }
    drain_messages(&mut b_rx).await;

    // Send many messages rapidly
    let message_count = 10;
    for i in 0..message_count {
        service
            .handle_message(
                a,
                ClientMessage::NegoNeeded {
                    offer: SessionDescription::offer(format!("O{}", i)),
                    to: b,
                },
            )
            .await
            .expect("Relay failed");
    }

    let received: Vec<String> = drain_messages(&mut b_rx)
        .await
        .into_iter()
        .filter_map(|m| match m {
            ServerMessage::NegoNeeded { offer, from } if from == a => Some(offer.sdp),
            _ => None,
        })
        .collect();

    let expected: Vec<String> = (0..message_count).map(|i| format!("O{}", i)).collect();
    assert_eq!(received, expected, "Relay must preserve per-sender order");
}
