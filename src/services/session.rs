//! Session State
//!
//! A shared session-status cell replacing the original's broadcast-an-event
//! auth-expiry pattern: collaborator clients mark it on any 401, the refresh
//! scheduler reads it before issuing requests, and re-authentication clears
//! it. The last good row set is retained while expired; nothing is zeroed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Shared observable session status.
pub struct SessionState {
    expired: AtomicBool,
    tx: watch::Sender<bool>,
}

impl SessionState {
    pub fn new() -> Arc<Self> {
        let (tx, _rx) = watch::channel(false);
        Arc::new(Self {
            expired: AtomicBool::new(false),
            tx,
        })
    }

    /// Whether the broker session is currently expired.
    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::Relaxed)
    }

    /// Mark the session expired. Idempotent; only the first call logs.
    pub fn mark_expired(&self) {
        if !self.expired.swap(true, Ordering::Relaxed) {
            warn!("broker session expired, suspending automatic refreshes");
            let _ = self.tx.send(true);
        }
    }

    /// Clear the expired flag after re-authentication.
    pub fn clear(&self) {
        if self.expired.swap(false, Ordering::Relaxed) {
            info!("broker session restored, resuming automatic refreshes");
            let _ = self.tx.send(false);
        }
    }

    /// Subscribe to session status changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
