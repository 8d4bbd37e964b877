
use std::net::SocketAddr;
use std::sync::Arc;

use duet_server::{Registry, ServerConfig, SignalingService};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::Level;

use crate::utils::{Delivery, MockSignalingOutput};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn create_test_registry(
    config: ServerConfig,
) -> (Registry, MockSignalingOutput, mpsc::UnboundedReceiver<Delivery>) {
    let (signaling, signal_rx) = MockSignalingOutput::new();
    let registry = Registry::new(&config, Arc::new(signaling.clone()));
    (registry, signaling, signal_rx)
}

/// Serve the real router on an ephemeral port.
pub async fn spawn_test_server(config: ServerConfig) -> (SocketAddr, SignalingService) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local addr");

    let service = SignalingService::new(config);
    let served = service.clone();
    tokio::spawn(async move {
        let _ = duet_server::serve_with_shutdown(listener, served, std::future::pending()).await;
    });

    (addr, service)
}
