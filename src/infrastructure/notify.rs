use crate::domain::ports::Notifier;
use crate::error::Result;
use async_trait::async_trait;
use serde_json::json;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

/// Queue-backed notifier stand-in that appends one JSON message per line.
///
/// Each line carries the `{"type": …, "data": …}` envelope the downstream
/// messaging consumer expects.
#[derive(Debug, Clone)]
pub struct JsonlNotifier {
    path: PathBuf,
}

impl JsonlNotifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Notifier for JsonlNotifier {
    async fn send(&self, event: &str, payload: serde_json::Value) -> Result<()> {
        let envelope = json!({ "type": event, "data": payload });
        let mut line = serde_json::to_vec(&envelope)?;
        line.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Notifier that discards all events.
///
/// Allows running without a queue backend. Logs a warning per event so
/// operators notice if it is used unintentionally.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardNotifier;

#[async_trait]
impl Notifier for DiscardNotifier {
    async fn send(&self, event: &str, _payload: serde_json::Value) -> Result<()> {
        tracing::warn!(event, "notification discarded (no queue configured)");
        Ok(())
    }
}
