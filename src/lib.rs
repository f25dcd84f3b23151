pub mod analysis;
pub mod codec;
pub mod engine;
pub mod error;
pub mod merge;
pub mod models;
pub mod portfolio;
pub mod store;
pub mod sync;

pub use analysis::{PortfolioAnalyst, UnavailableAnalyst};
pub use engine::{
    derive_alerts, derive_projection, derive_status, derive_summary, AlertSeverity, PaymentAlert,
    PortfolioSummary, ProjectionPoint,
};
pub use error::PortfolioError;
pub use merge::{merge_records, MergeMode};
pub use models::{
    CreateLoanInput, Installment, LoanEdits, LoanRecord, LoanStatus, PortfolioSettings,
    UpdateSettingsInput,
};
pub use portfolio::PortfolioService;
pub use store::{JsonFileStore, MemoryStore, RecordStore};
pub use sync::{SnapshotCallback, SubscriptionHandle, SyncAdapter, SyncConfig};
