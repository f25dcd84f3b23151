use serde::{Deserialize, Serialize};

use crate::models::LoanRecord;

/// Horizon shown when the portfolio has no live records
const MIN_HORIZON: u32 = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    pub period: u32,
    pub cumulative_principal: f64,
    pub cumulative_interest: f64,
    pub cumulative_total: f64,
}

/// Round to the currency's minor unit. Applied only at output - cumulative
/// sums accumulate in full precision so rounding error never compounds.
fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Cumulative monthly principal/interest recovery curve over the live
/// record set.
///
/// For period i (1-based), every record whose schedule reaches period i
/// contributes one even share of its principal and one even share of its
/// interest margin.
pub fn derive_projection(records: &[LoanRecord]) -> Vec<ProjectionPoint> {
    let live: Vec<&LoanRecord> = records.iter().filter(|r| !r.is_deleted).collect();

    let horizon = live
        .iter()
        .map(|r| r.installments_count)
        .max()
        .unwrap_or(MIN_HORIZON);

    let mut curve = Vec::with_capacity(horizon as usize);
    let mut principal_acc = 0.0_f64;
    let mut interest_acc = 0.0_f64;

    for period in 1..=horizon {
        for record in live.iter().filter(|r| period <= r.installments_count) {
            let count = record.installments_count as f64;
            let principal_share = record.principal / count;
            let receivable_share = record.total_receivable() / count;

            principal_acc += principal_share;
            interest_acc += receivable_share - principal_share;
        }

        curve.push(ProjectionPoint {
            period,
            cumulative_principal: round_currency(principal_acc),
            cumulative_interest: round_currency(interest_acc),
            cumulative_total: round_currency(principal_acc + interest_acc),
        });
    }

    curve
}
