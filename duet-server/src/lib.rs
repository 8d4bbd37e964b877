mod config;
mod error;
mod registry;
mod signaling;

pub use config::*;
pub use error::*;
pub use registry::*;
pub use signaling::*;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// HTTP routes of the signaling server: `GET /ws` upgrades to the signaling
/// socket.
pub fn router(service: SignalingService) -> Router {
    // Browser clients are served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(service)
}

/// Serves the signaling router on an already bound listener until `shutdown`
/// resolves.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    service: SignalingService,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    info!("Signaling server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Signaling server stopped");
    Ok(())
}

/// Binds `config.bind_addr` and serves until the process is interrupted.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind_addr).await?;
    let service = SignalingService::new(config);

    serve_with_shutdown(listener, service, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}
