//! Shutdown coordination.
//!
//! # Data Flow
//! ```text
//! signals::wait_for_shutdown() ─┐
//!                               ├─▶ Shutdown::trigger() ─▶ HttpServer::run drains
//! test harness ─────────────────┘
//! ```
//!
//! # Design Decisions
//! - One broadcast message; every subscriber sees it exactly once
//! - Triggering twice is a no-op, so a second SIGINT does not re-notify

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;

#[derive(Debug)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    triggered: AtomicBool,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            triggered: AtomicBool::new(false),
        }
    }

    /// Receiver that resolves once `trigger` is called.
    ///
    /// Subscribe before triggering; a receiver created afterwards never sees
    /// the message.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Notify every subscriber. Returns how many were reached (0 on repeat calls).
    pub fn trigger(&self) -> usize {
        if self.triggered.swap(true, Ordering::SeqCst) {
            tracing::debug!("Shutdown already triggered");
            return 0;
        }

        let reached = self.tx.send(()).unwrap_or(0);
        tracing::info!(listeners = reached, "Shutdown triggered");
        reached
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
