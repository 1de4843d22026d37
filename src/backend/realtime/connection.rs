//! Per-connection outbound handle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::shared::ServerEvent;

pub type ConnectionId = Uuid;

/// Sending half of one socket connection
///
/// Frames are serialized once per broadcast and shared as `Arc<String>`.
/// Sends never block: a full queue drops the frame and bumps the drop
/// counter.
#[derive(Debug)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    pub user_id: Uuid,
    tx: mpsc::Sender<Arc<String>>,
    dropped: AtomicU64,
}

impl ConnectionHandle {
    pub fn new(user_id: Uuid, tx: mpsc::Sender<Arc<String>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            tx,
            dropped: AtomicU64::new(0),
        }
    }

    /// Queue a pre-serialized frame. Returns `false` if it was dropped.
    pub fn send(&self, frame: Arc<String>) -> bool {
        if self.tx.try_send(frame).is_ok() {
            true
        } else {
            let _ = self.dropped.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    pub fn send_event(&self, event: &ServerEvent) -> bool {
        match event.to_text() {
            Ok(text) => self.send(Arc::new(text)),
            Err(e) => {
                tracing::warn!("[Realtime] Failed to encode {}: {}", event.name(), e);
                false
            }
        }
    }

    pub fn drop_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
