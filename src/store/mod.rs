use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::PortfolioError;
use crate::models::LoanRecord;

/// Full-set local persistence: one JSON array, read once at startup and
/// rewritten after every mutation.
pub trait RecordStore: Send + Sync {
    /// Load the persisted set. Fails open: missing or malformed content
    /// yields the empty set, never an error.
    fn load(&self) -> Vec<LoanRecord>;

    /// Persist the full set. Failures are storage-quota class: callers log
    /// them and carry on - the in-memory copy stays authoritative.
    fn save(&self, records: &[LoanRecord]) -> Result<(), PortfolioError>;
}

/// Store backed by a single JSON document on disk.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordStore for JsonFileStore {
    fn load(&self) -> Vec<LoanRecord> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                log::info!("No persisted portfolio at {:?} ({e}), starting empty", self.path);
                return Vec::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(e) => {
                log::warn!("Malformed portfolio file {:?}: {e} - starting empty", self.path);
                Vec::new()
            }
        }
    }

    fn save(&self, records: &[LoanRecord]) -> Result<(), PortfolioError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(records)
            .map_err(|e| PortfolioError::Quota(e.to_string()))?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// In-memory store for tests and cloud-only setups.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<LoanRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn load(&self) -> Vec<LoanRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn save(&self, records: &[LoanRecord]) -> Result<(), PortfolioError> {
        if let Ok(mut guard) = self.records.lock() {
            *guard = records.to_vec();
        }
        Ok(())
    }
}
