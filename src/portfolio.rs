use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use chrono::{NaiveDate, Utc};
use tokio::sync::watch;

use crate::analysis::PortfolioAnalyst;
use crate::codec;
use crate::engine::{
    derive_alerts, derive_projection, derive_status, derive_summary, PaymentAlert,
    PortfolioSummary, ProjectionPoint,
};
use crate::error::PortfolioError;
use crate::merge::{merge_records, MergeMode};
use crate::models::{
    CreateLoanInput, LoanEdits, LoanRecord, PortfolioSettings, UpdateSettingsInput,
};
use crate::store::RecordStore;
use crate::sync::{CloudSession, SyncAdapter, SyncConfig};

/// The operations facade over one device's replicated record set.
///
/// All mutations are optimistic: the in-memory set is updated first, then
/// persisted, then pushed to the cloud fire-and-forget. A failed persist or
/// push never rolls the mutation back - the local copy stays authoritative
/// until the next reconciling snapshot. State is explicit: one service
/// object owns the set, no ambient globals.
pub struct PortfolioService {
    records: Arc<RwLock<Vec<LoanRecord>>>,
    store: Arc<dyn RecordStore>,
    settings: PortfolioSettings,
    cloud: Option<CloudSession>,
    revision: Arc<watch::Sender<u64>>,
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl PortfolioService {
    /// Load the persisted set once at startup. Malformed storage fails
    /// open to an empty portfolio.
    pub fn new(store: Arc<dyn RecordStore>, settings: PortfolioSettings) -> Self {
        let records = store.load();
        log::info!("Portfolio loaded: {} records", records.len());

        Self {
            records: Arc::new(RwLock::new(records)),
            store,
            settings,
            cloud: None,
            revision: Arc::new(watch::channel(0).0),
        }
    }

    // ── Views ────────────────────────────────────────────────────────────

    /// Full set, tombstones included (what merge and export operate on)
    pub fn records(&self) -> Vec<LoanRecord> {
        self.records.read().map(|r| r.clone()).unwrap_or_default()
    }

    /// Live records only - every user-facing aggregation starts here
    pub fn active_records(&self) -> Vec<LoanRecord> {
        self.records()
            .into_iter()
            .filter(|r| !r.is_deleted)
            .collect()
    }

    pub fn deleted_records(&self) -> Vec<LoanRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.is_deleted)
            .collect()
    }

    /// Live records grouped by case-normalized client name
    pub fn grouped_by_client(&self) -> BTreeMap<String, Vec<LoanRecord>> {
        let mut groups: BTreeMap<String, Vec<LoanRecord>> = BTreeMap::new();
        for record in self.active_records() {
            groups.entry(record.client_key()).or_default().push(record);
        }
        groups
    }

    pub fn settings(&self) -> &PortfolioSettings {
        &self.settings
    }

    pub fn update_settings(&mut self, input: UpdateSettingsInput) {
        self.settings.apply(input);
    }

    /// Changes on every reconciled state change - views recompute on it
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    // ── Mutations ────────────────────────────────────────────────────────

    pub fn create_loan(&self, input: CreateLoanInput) -> LoanRecord {
        let record = LoanRecord::create(input, now_millis());

        if let Ok(mut guard) = self.records.write() {
            guard.push(record.clone());
        }
        self.after_mutation(Some(record.clone()));
        record
    }

    pub fn update_loan(&self, id: &str, edits: LoanEdits) -> bool {
        self.mutate_record(id, |record, now| {
            record.apply_edits(edits, now);
            true
        })
    }

    pub fn toggle_installment(&self, id: &str, number: u32) -> bool {
        self.mutate_record(id, |record, now| record.toggle_installment(number, now))
    }

    pub fn set_observation(&self, id: &str, observation: String) -> bool {
        self.mutate_record(id, |record, now| {
            record.set_observation(observation, now);
            true
        })
    }

    /// Soft delete: flips the tombstone and bumps the stamp so the delete
    /// propagates with the same precedence as any other edit.
    pub fn delete_loan(&self, id: &str) -> bool {
        self.mutate_record(id, |record, now| {
            record.tombstone(now);
            true
        })
    }

    pub fn restore_loan(&self, id: &str) -> bool {
        self.mutate_record(id, |record, now| {
            record.restore(now);
            true
        })
    }

    /// Rewrite the derived status cache from "today". A cache rewrite is
    /// not an edit: last_updated is untouched and nothing is pushed, so a
    /// routine recompute can never win a merge against a real change.
    pub fn refresh_statuses(&self, today: NaiveDate) {
        let mut changed = false;
        if let Ok(mut guard) = self.records.write() {
            for record in guard.iter_mut().filter(|r| !r.is_deleted) {
                let status = derive_status(&record.installments, today);
                if record.status != status {
                    record.status = status;
                    changed = true;
                }
            }
        }

        if changed {
            let snapshot = self.records();
            if let Err(e) = self.store.save(&snapshot) {
                log::error!("Failed to persist status refresh: {e}");
            }
            self.revision.send_modify(|r| *r = r.wrapping_add(1));
        }
    }

    // ── Derivations ──────────────────────────────────────────────────────

    pub fn alerts(&self, today: NaiveDate) -> Vec<PaymentAlert> {
        derive_alerts(&self.records(), self.settings.warning_days, today)
    }

    pub fn projection(&self) -> Vec<ProjectionPoint> {
        derive_projection(&self.records())
    }

    pub fn summary(&self, today: NaiveDate) -> PortfolioSummary {
        derive_summary(&self.records(), today)
    }

    pub async fn analyze(&self, analyst: &dyn PortfolioAnalyst) -> String {
        analyst.analyze(&self.active_records()).await
    }

    // ── Exchange ─────────────────────────────────────────────────────────

    /// File/clipboard export. Tombstones travel too - that is how deletes
    /// reach devices that import the file.
    pub fn export_json(&self) -> Result<String, PortfolioError> {
        codec::encode_json(&self.records())
    }

    pub fn export_link(&self) -> Result<String, PortfolioError> {
        codec::encode_link(&self.records())
    }

    /// Apply an already-decoded incoming set under the caller's
    /// merge-vs-replace decision. Returns the resulting set size.
    pub fn import_records(&self, incoming: Vec<LoanRecord>, mode: MergeMode) -> usize {
        let merged = {
            let mut guard = match self.records.write() {
                Ok(guard) => guard,
                Err(_) => return 0,
            };
            let merged = merge_records(&guard, &incoming, mode);
            *guard = merged.clone();
            merged
        };

        if let Err(e) = self.store.save(&merged) {
            log::error!("Failed to persist import: {e}");
        }
        if let Some(session) = &self.cloud {
            session.push_all_in_background(merged.clone());
        }
        self.revision.send_modify(|r| *r = r.wrapping_add(1));
        merged.len()
    }

    /// Decode-then-import for a pasted/opened JSON payload. A decode
    /// failure changes no state.
    pub fn import_json(&self, payload: &str, mode: MergeMode) -> Result<usize, PortfolioError> {
        let incoming = codec::decode_json(payload)?;
        Ok(self.import_records(incoming, mode))
    }

    /// Decode-then-import for a share-link payload
    pub fn import_link(&self, payload: &str, mode: MergeMode) -> Result<usize, PortfolioError> {
        let incoming = codec::decode_link(payload)?;
        Ok(self.import_records(incoming, mode))
    }

    // ── Cloud ────────────────────────────────────────────────────────────

    /// Connect the portfolio to a realtime mirror. Requires a tokio
    /// runtime (pushes are spawned tasks). On failure the service keeps
    /// running local-only.
    pub async fn connect_cloud(
        &mut self,
        adapter: Arc<dyn SyncAdapter>,
        config: &SyncConfig,
    ) -> Result<(), PortfolioError> {
        let session = CloudSession::establish(
            adapter,
            config,
            Arc::clone(&self.records),
            Arc::clone(&self.store),
            Arc::clone(&self.revision),
        )
        .await?;

        self.cloud = Some(session);
        Ok(())
    }

    pub fn disconnect_cloud(&mut self) {
        if let Some(session) = self.cloud.take() {
            session.disconnect();
            log::info!("Cloud session closed");
        }
    }

    pub fn cloud_connected(&self) -> bool {
        self.cloud.as_ref().is_some_and(|s| s.is_connected())
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn mutate_record(&self, id: &str, apply: impl FnOnce(&mut LoanRecord, i64) -> bool) -> bool {
        let touched = {
            let mut guard = match self.records.write() {
                Ok(guard) => guard,
                Err(_) => return false,
            };
            match guard.iter_mut().find(|r| r.id == id) {
                Some(record) => {
                    if apply(record, now_millis()) {
                        Some(record.clone())
                    } else {
                        None
                    }
                }
                _ => None,
            }
        };

        match touched {
            Some(record) => {
                self.after_mutation(Some(record));
                true
            }
            None => false,
        }
    }

    /// Persist, push, announce - the optimistic-write tail of every
    /// mutation. Storage failures are logged and swallowed: the mutation
    /// that triggered them must not be undone.
    fn after_mutation(&self, touched: Option<LoanRecord>) {
        let snapshot = self.records();

        if let Err(e) = self.store.save(&snapshot) {
            log::error!("Failed to persist portfolio: {e}");
        }

        if let Some(session) = &self.cloud {
            match touched {
                Some(record) => session.push_in_background(record),
                None => session.push_all_in_background(snapshot),
            }
        }

        self.revision.send_modify(|r| *r = r.wrapping_add(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LoanStatus;
    use crate::store::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn input(name: &str) -> CreateLoanInput {
        CreateLoanInput {
            name: name.to_string(),
            phone: "555".to_string(),
            principal: 1000.0,
            total_receivable: 1200.0,
            installments_count: 4,
            start_date: date(2026, 1, 15),
            observation: String::new(),
        }
    }

    fn service() -> PortfolioService {
        PortfolioService::new(Arc::new(MemoryStore::new()), PortfolioSettings::default())
    }

    #[test]
    fn test_create_persists_immediately() {
        let store = Arc::new(MemoryStore::new());
        let service =
            PortfolioService::new(store.clone(), PortfolioSettings::default());

        let created = service.create_loan(input("maria"));
        assert_eq!(created.status, LoanStatus::Active);
        assert_eq!(store.load().len(), 1, "mutation must rewrite the store");
    }

    #[test]
    fn test_startup_loads_persisted_set() {
        let store = Arc::new(MemoryStore::new());
        {
            let service =
                PortfolioService::new(store.clone(), PortfolioSettings::default());
            service.create_loan(input("maria"));
            service.create_loan(input("joão"));
        }

        let reopened = PortfolioService::new(store, PortfolioSettings::default());
        assert_eq!(reopened.records().len(), 2);
    }

    #[test]
    fn test_delete_keeps_tombstone_in_set_and_export() {
        let service = service();
        let id = service.create_loan(input("maria")).id;

        assert!(service.delete_loan(&id));
        assert!(service.active_records().is_empty());
        assert_eq!(service.deleted_records().len(), 1);
        assert_eq!(service.records().len(), 1, "tombstone is retained, not purged");

        let exported = service.export_json().unwrap();
        assert!(exported.contains(&id), "tombstones must travel in exports");
    }

    #[test]
    fn test_restore_brings_a_loan_back() {
        let service = service();
        let id = service.create_loan(input("maria")).id;
        let stamp_after_delete = {
            service.delete_loan(&id);
            service.records()[0].last_updated
        };

        assert!(service.restore_loan(&id));
        let restored = &service.records()[0];
        assert!(!restored.is_deleted);
        assert!(restored.last_updated >= stamp_after_delete);
    }

    #[test]
    fn test_toggle_and_refresh_status() {
        let service = service();
        let id = service.create_loan(input("maria")).id;

        for number in 1..=4 {
            assert!(service.toggle_installment(&id, number));
        }
        service.refresh_statuses(date(2026, 6, 1));

        assert_eq!(service.records()[0].status, LoanStatus::Completed);
    }

    #[test]
    fn test_refresh_statuses_does_not_stamp() {
        let service = service();
        let before = service.create_loan(input("maria")).last_updated;

        service.refresh_statuses(date(2030, 1, 1));
        assert_eq!(service.records()[0].last_updated, before);
        assert_eq!(service.records()[0].status, LoanStatus::Late);
    }

    #[test]
    fn test_import_merge_honors_lww() {
        let service = service();
        let local = service.create_loan(input("maria"));

        let mut newer = local.clone();
        newer.observation = "paid a visit".to_string();
        newer.last_updated = local.last_updated + 1_000;

        let count = service.import_records(vec![newer], MergeMode::Merge);
        assert_eq!(count, 1);
        assert_eq!(service.records()[0].observation, "paid a visit");
    }

    #[test]
    fn test_import_replace_supersedes() {
        let service = service();
        service.create_loan(input("maria"));
        service.create_loan(input("joão"));

        let replacement = LoanRecord::create(input("ana"), 1);
        let count = service.import_records(vec![replacement], MergeMode::Replace);

        assert_eq!(count, 1);
        assert_eq!(service.records()[0].name, "ana");
    }

    #[test]
    fn test_bad_import_changes_nothing() {
        let service = service();
        service.create_loan(input("maria"));

        assert!(service.import_json("not json", MergeMode::Merge).is_err());
        assert!(service
            .import_json(r#"[{"name": "no id"}]"#, MergeMode::Merge)
            .is_err());
        assert!(service.import_link("%%%", MergeMode::Merge).is_err());

        assert_eq!(service.records().len(), 1);
        assert_eq!(service.records()[0].name, "maria");
    }

    #[test]
    fn test_link_round_trip_between_two_devices() {
        let device_a = service();
        device_a.create_loan(input("maria"));
        let link = device_a.export_link().unwrap();

        let device_b = service();
        device_b.create_loan(input("joão"));
        let count = device_b.import_link(&link, MergeMode::Merge).unwrap();

        assert_eq!(count, 2);
        let mut names: Vec<String> =
            device_b.records().iter().map(|r| r.name.clone()).collect();
        names.sort();
        assert_eq!(names, vec!["joão", "maria"]);
    }

    #[test]
    fn test_alerts_use_warning_window_from_settings() {
        let mut service = service();
        service.update_settings(UpdateSettingsInput {
            warning_days: Some(30),
            currency: None,
        });
        service.create_loan(input("maria"));

        // First installment lands one month after start
        let alerts = service.alerts(date(2026, 2, 1));
        assert!(!alerts.is_empty());
    }

    #[test]
    fn test_grouped_by_client_is_case_normalized() {
        let service = service();
        service.create_loan(input("Maria"));
        service.create_loan(input("MARIA"));
        service.create_loan(input("joão"));

        let groups = service.grouped_by_client();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.get("maria").map(|g| g.len()), Some(2));
    }

    #[tokio::test]
    async fn test_analyze_feeds_live_records_only() {
        use crate::analysis::UnavailableAnalyst;

        let service = service();
        let id = service.create_loan(input("maria")).id;
        service.delete_loan(&id);

        let text = service.analyze(&UnavailableAnalyst).await;
        assert!(!text.is_empty());
    }

    #[test]
    fn test_revision_bumps_on_mutation() {
        let service = service();
        let mut rx = service.subscribe_changes();

        service.create_loan(input("maria"));
        assert!(rx.has_changed().unwrap());
    }
}
