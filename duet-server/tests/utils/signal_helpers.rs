use anyhow::Result;
use duet_core::ServerMessage;
use std::time::Duration;
use tokio::sync::mpsc;

/// Timeout for signal exchange operations (ms).
pub const SIGNAL_TIMEOUT_MS: u64 = 5000;

/// How long to listen before concluding nothing else is coming (ms).
pub const QUIET_PERIOD_MS: u64 = 200;

/// Wait for the first message matching `pred`, skipping others.
pub async fn wait_for_message<F>(
    rx: &mut mpsc::UnboundedReceiver<ServerMessage>,
    mut pred: F,
) -> Result<ServerMessage>
where
    F: FnMut(&ServerMessage) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_millis(SIGNAL_TIMEOUT_MS);

    loop {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Some(msg)) if pred(&msg) => return Ok(msg),
            Ok(Some(_)) => continue,
            Ok(None) => anyhow::bail!("Signal channel closed"),
            Err(_) => anyhow::bail!("Timeout waiting for message"),
        }
    }
}

/// Collect everything that arrives within the quiet period.
pub async fn drain_messages(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
    let mut out = Vec::new();
    while let Ok(Some(msg)) =
        tokio::time::timeout(Duration::from_millis(QUIET_PERIOD_MS), rx.recv()).await
    {
        out.push(msg);
    }
    out
}

/// Poll `check` until it holds or the signal timeout passes.
pub async fn eventually<F>(mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_millis(SIGNAL_TIMEOUT_MS);
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
