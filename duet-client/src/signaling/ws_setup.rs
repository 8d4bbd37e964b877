use crate::error::CallError;
use crate::signaling::SignalingClient;
use duet_core::{ClientMessage, ServerMessage};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

/// Opens the signaling WebSocket at `url` (for example `ws://host:8000/ws`).
///
/// The returned task runs the socket until the server closes it or every
/// clone of the client is dropped.
pub async fn connect(url: &str) -> Result<(SignalingClient, JoinHandle<()>), CallError> {
    let (ws, _) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| CallError::Transport(e.to_string()))?;
    info!("Signaling connected to {}", url);

    let (mut sink, mut stream) = ws.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ClientMessage>();
    let (in_tx, in_rx) = mpsc::unbounded_channel::<ServerMessage>();

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    warn!("Failed to encode {}: {}", msg.type_tag(), e);
                    continue;
                }
            };
            if sink.send(Message::text(json)).await.is_err() {
                break;
            }
        }
        let _ = sink.send(Message::Close(None)).await;
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = stream.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ServerMessage>(text.as_str()) {
                    Ok(signal) => {
                        if in_tx.send(signal).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("JSON Error: {}. Text: {}", e, text.as_str()),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    let driver = tokio::spawn(async move {
        tokio::select! {
            _ = (&mut send_task) => recv_task.abort(),
            _ = (&mut recv_task) => send_task.abort(),
        };
        info!("Signaling connection closed");
    });

    Ok((SignalingClient::from_channels(out_tx, in_rx), driver))
}
