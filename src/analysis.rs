use async_trait::async_trait;

use crate::models::LoanRecord;

/// Opaque natural-language portfolio analysis.
///
/// Implementations wrap whatever text-generation service is available and
/// map their own failures to an explicit unavailable message - the only
/// two outcomes are text and text. Nothing here may error into the core.
#[async_trait]
pub trait PortfolioAnalyst: Send + Sync {
    async fn analyze(&self, records: &[LoanRecord]) -> String;
}

/// Fallback analyst for builds without a text-generation service wired in.
pub struct UnavailableAnalyst;

#[async_trait]
impl PortfolioAnalyst for UnavailableAnalyst {
    async fn analyze(&self, _records: &[LoanRecord]) -> String {
        "Portfolio analysis is not available right now.".to_string()
    }
}
