use chrono::NaiveDate;

use crate::models::{Installment, LoanStatus};

/// Derive a loan's lifecycle state from its schedule and "today".
///
/// Completed is checked first: a fully paid loan is never Late, even when
/// some of its due dates are in the past. Pure and idempotent - safe to
/// call on every render, callers persist the result only as a cache.
pub fn derive_status(installments: &[Installment], today: NaiveDate) -> LoanStatus {
    if installments.iter().all(|i| i.is_paid) {
        return LoanStatus::Completed;
    }
    if installments
        .iter()
        .any(|i| !i.is_paid && i.due_date < today)
    {
        return LoanStatus::Late;
    }
    LoanStatus::Active
}
