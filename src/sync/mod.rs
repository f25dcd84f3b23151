pub mod adapter;
pub mod session;

pub use adapter::{SnapshotCallback, SubscriptionHandle, SyncAdapter, SyncConfig};
pub use session::CloudSession;
