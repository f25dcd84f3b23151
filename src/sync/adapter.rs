use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PortfolioError;
use crate::models::LoanRecord;

/// Opaque remote configuration for the realtime store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub database_url: String,
    pub root_key: String,
}

/// Delivered with every whole-set snapshot the remote store emits
pub type SnapshotCallback = Box<dyn Fn(Vec<LoanRecord>) + Send + Sync>;

/// Contract an external realtime store must implement. The core never sees
/// the store's native query or document model - only whole-record
/// snapshots in, whole records out.
#[async_trait]
pub trait SyncAdapter: Send + Sync {
    /// Returns false (or an error) when the remote configuration is
    /// invalid; the session then stays disconnected and local-only
    /// operation continues unaffected.
    async fn connect(&self, config: &SyncConfig) -> Result<bool, PortfolioError>;

    /// Register for snapshot delivery. The adapter must gate delivery on
    /// the returned handle: once stopped, the callback is released and
    /// never invoked again.
    fn subscribe(&self, on_snapshot: SnapshotCallback) -> SubscriptionHandle;

    async fn push(&self, record: &LoanRecord) -> Result<(), PortfolioError>;

    async fn push_all(&self, records: &[LoanRecord]) -> Result<(), PortfolioError>;

    fn is_connected(&self) -> bool;
}

/// Cancellable subscription to a snapshot stream.
///
/// `stop` is idempotent: the first call flips the gate and runs the
/// adapter's release hook; later calls (and Drop) are no-ops.
pub struct SubscriptionHandle {
    stopped: Arc<AtomicBool>,
    on_stop: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl SubscriptionHandle {
    pub fn new(on_stop: impl FnOnce() + Send + 'static) -> Self {
        Self {
            stopped: Arc::new(AtomicBool::new(false)),
            on_stop: Mutex::new(Some(Box::new(on_stop))),
        }
    }

    /// Shared gate for the adapter's delivery loop: check before every
    /// callback invocation.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stopped)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            let hook = self.on_stop.lock().ok().and_then(|mut h| h.take());
            if let Some(hook) = hook {
                hook();
            }
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
