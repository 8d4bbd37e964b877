use duet_core::{ConnectionId, Profile, RoomId};
use duet_server::{ServerConfig, SignalingError};

use crate::integration::{create_test_registry, init_tracing};

#[tokio::test]
async fn test_duplicate_join_rejected() {
    init_tracing();

    let (registry, signaling, _signal_rx) = create_test_registry(ServerConfig::default());

    let peer_id = ConnectionId::new();
    registry
        .join(peer_id, RoomId::from("R1"), Profile::new("a@example.com", "A"))
        .await
        .expect("First join failed");

    let before = signaling.total().await;

    let second = registry
        .join(peer_id, RoomId::from("R2"), Profile::new("a@example.com", "A"))
        .await;

    assert_eq!(second, Err(SignalingError::AlreadyJoined(peer_id)));
    assert_eq!(signaling.total().await, before, "A rejected join must be a no-op");
    assert_eq!(
        registry.lookup(&peer_id).map(|m| m.room),
        Some(RoomId::from("R1"))
    );
    assert_eq!(registry.room_count(), 1);
}
