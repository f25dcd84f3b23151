use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::engine::status::derive_status;
use crate::models::{LoanRecord, LoanStatus};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_loans: u32,
    pub active: u32,
    pub late: u32,
    pub completed: u32,
    pub total_loaned: f64,
    pub total_receivable: f64,
    pub total_received: f64,
    pub outstanding: f64,
}

/// Dashboard totals over the live record set. Status is derived fresh from
/// each schedule, not read from the cached field.
pub fn derive_summary(records: &[LoanRecord], today: NaiveDate) -> PortfolioSummary {
    let mut summary = PortfolioSummary::default();

    for record in records.iter().filter(|r| !r.is_deleted) {
        summary.total_loans += 1;
        match derive_status(&record.installments, today) {
            LoanStatus::Active => summary.active += 1,
            LoanStatus::Late => summary.late += 1,
            LoanStatus::Completed => summary.completed += 1,
        }

        summary.total_loaned += record.principal;
        summary.total_receivable += record.total_receivable();
        summary.total_received += record
            .installments
            .iter()
            .filter(|i| i.is_paid)
            .map(|i| i.value)
            .sum::<f64>();
    }

    summary.outstanding = summary.total_receivable - summary.total_received;
    summary
}
