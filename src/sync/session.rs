use std::sync::{Arc, RwLock};

use tokio::sync::watch;

use crate::error::PortfolioError;
use crate::models::LoanRecord;
use crate::store::RecordStore;
use crate::sync::adapter::{SubscriptionHandle, SyncAdapter, SyncConfig};

/// A live connection between the local record set and a remote realtime
/// mirror.
///
/// Once connected the mirror is the single shared source of truth: every
/// snapshot it delivers replaces the local set wholesale (see MergeMode).
/// Re-delivery immediately after a local write is expected and converges -
/// applying the same snapshot twice is a no-op. Outbound pushes are
/// fire-and-forget: failures are logged and the local copy stays
/// authoritative until the next reconciling snapshot.
pub struct CloudSession {
    adapter: Arc<dyn SyncAdapter>,
    subscription: SubscriptionHandle,
}

impl CloudSession {
    /// Connect, seed the remote with the current local set, and start the
    /// snapshot stream. An invalid configuration surfaces as SyncConnect
    /// and leaves local-only operation untouched.
    pub async fn establish(
        adapter: Arc<dyn SyncAdapter>,
        config: &SyncConfig,
        records: Arc<RwLock<Vec<LoanRecord>>>,
        store: Arc<dyn RecordStore>,
        revision: Arc<watch::Sender<u64>>,
    ) -> Result<Self, PortfolioError> {
        match adapter.connect(config).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(PortfolioError::SyncConnect(
                    "remote store rejected the configuration".to_string(),
                ));
            }
            Err(e) => return Err(PortfolioError::SyncConnect(e.to_string())),
        }

        let seed = records.read().map(|r| r.clone()).unwrap_or_default();
        if let Err(e) = adapter.push_all(&seed).await {
            log::warn!("Initial cloud seed failed: {e}");
        }

        let subscription = adapter.subscribe(Box::new(move |snapshot: Vec<LoanRecord>| {
            let changed = match records.write() {
                Ok(mut guard) => {
                    if *guard == snapshot {
                        false
                    } else {
                        *guard = snapshot.clone();
                        true
                    }
                }
                Err(_) => false,
            };

            if changed {
                if let Err(e) = store.save(&snapshot) {
                    log::error!("Failed to persist cloud snapshot: {e}");
                }
                revision.send_modify(|r| *r = r.wrapping_add(1));
            }
        }));

        log::info!("Cloud session established ({} records seeded)", seed.len());
        Ok(Self {
            adapter,
            subscription,
        })
    }

    /// Outbound write for one record. Never blocks the caller; errors are
    /// logged, not surfaced.
    pub fn push_in_background(&self, record: LoanRecord) {
        let adapter = Arc::clone(&self.adapter);
        tokio::spawn(async move {
            if let Err(e) = adapter.push(&record).await {
                log::warn!("Cloud push failed for {}: {e}", record.id);
            }
        });
    }

    /// Outbound write for the full set (used after an import merges many
    /// records at once).
    pub fn push_all_in_background(&self, records: Vec<LoanRecord>) {
        let adapter = Arc::clone(&self.adapter);
        tokio::spawn(async move {
            if let Err(e) = adapter.push_all(&records).await {
                log::warn!("Cloud push of {} records failed: {e}", records.len());
            }
        });
    }

    pub fn is_connected(&self) -> bool {
        !self.subscription.is_stopped() && self.adapter.is_connected()
    }

    /// Tear the session down. Stopping the subscription releases the
    /// snapshot callback deterministically - nothing mutates local state
    /// after this returns.
    pub fn disconnect(&self) {
        self.subscription.stop();
    }
}

impl Drop for CloudSession {
    fn drop(&mut self) {
        self.subscription.stop();
    }
}
