use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::LoanRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Overdue,
    Due,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAlert {
    pub record_id: String,
    pub client_name: String,
    pub phone: String,
    pub installment_number: u32,
    pub value: f64,
    pub due_date: NaiveDate,
    pub days_until_due: i64,
    pub severity: AlertSeverity,
}

/// Scan the live record set for unpaid installments that are overdue or
/// falling due within `warning_days`.
///
/// Date-only arithmetic throughout - calendar dates are compared directly,
/// never through a timezone-sensitive timestamp. Output order: every
/// Overdue entry before every Due entry, ascending days_until_due within
/// each group (most overdue / soonest due first); ties keep the input's
/// record iteration order. Recomputed fresh on every call, no cached state.
pub fn derive_alerts(
    records: &[LoanRecord],
    warning_days: i64,
    today: NaiveDate,
) -> Vec<PaymentAlert> {
    let mut alerts = Vec::new();

    for record in records.iter().filter(|r| !r.is_deleted) {
        for installment in record.installments.iter().filter(|i| !i.is_paid) {
            let days_until_due = (installment.due_date - today).num_days();

            let severity = if days_until_due < 0 {
                AlertSeverity::Overdue
            } else if days_until_due <= warning_days {
                AlertSeverity::Due
            } else {
                continue;
            };

            alerts.push(PaymentAlert {
                record_id: record.id.clone(),
                client_name: record.name.clone(),
                phone: record.phone.clone(),
                installment_number: installment.number,
                value: installment.value,
                due_date: installment.due_date,
                days_until_due,
                severity,
            });
        }
    }

    // Stable sort preserves record iteration order on ties
    alerts.sort_by_key(|a| (a.severity == AlertSeverity::Due, a.days_until_due));
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateLoanInput, Installment};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loan_with_due_dates(name: &str, dues: &[(NaiveDate, bool)]) -> LoanRecord {
        let mut loan = LoanRecord::create(
            CreateLoanInput {
                name: name.to_string(),
                phone: "123".to_string(),
                principal: 100.0,
                total_receivable: 110.0,
                installments_count: dues.len().max(1) as u32,
                start_date: date(2026, 1, 1),
                observation: String::new(),
            },
            0,
        );
        loan.installments = dues
            .iter()
            .enumerate()
            .map(|(idx, (due, is_paid))| Installment {
                number: idx as u32 + 1,
                due_date: *due,
                value: 55.0,
                is_paid: *is_paid,
            })
            .collect();
        loan
    }

    #[test]
    fn test_window_boundaries() {
        let today = date(2026, 6, 10);
        let records = vec![loan_with_due_dates(
            "a",
            &[
                (today, false),                // due today -> Due, 0
                (date(2026, 6, 13), false),    // warning_days -> Due, 3
                (date(2026, 6, 14), false),    // warning_days + 1 -> excluded
                (date(2026, 6, 9), false),     // yesterday -> Overdue, -1
            ],
        )];

        let alerts = derive_alerts(&records, 3, today);
        assert_eq!(alerts.len(), 3);

        assert_eq!(alerts[0].severity, AlertSeverity::Overdue);
        assert_eq!(alerts[0].days_until_due, -1);
        assert_eq!(alerts[1].severity, AlertSeverity::Due);
        assert_eq!(alerts[1].days_until_due, 0);
        assert_eq!(alerts[2].days_until_due, 3);
    }

    #[test]
    fn test_overdue_precede_due_and_sort_ascending() {
        let today = date(2026, 6, 10);
        let records = vec![
            loan_with_due_dates("a", &[(date(2026, 6, 12), false)]), // Due, 2
            loan_with_due_dates("b", &[(date(2026, 6, 5), false)]),  // Overdue, -5
            loan_with_due_dates("c", &[(date(2026, 6, 9), false)]),  // Overdue, -1
        ];

        let alerts = derive_alerts(&records, 3, today);
        let order: Vec<i64> = alerts.iter().map(|a| a.days_until_due).collect();
        assert_eq!(order, vec![-5, -1, 2]);
    }

    #[test]
    fn test_five_days_overdue_with_short_window() {
        let today = date(2026, 6, 10);
        let records = vec![loan_with_due_dates("a", &[(date(2026, 6, 5), false)])];

        let alerts = derive_alerts(&records, 1, today);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Overdue);
        assert_eq!(alerts[0].days_until_due, -5);
    }

    #[test]
    fn test_paid_and_tombstoned_are_skipped() {
        let today = date(2026, 6, 10);
        let mut deleted = loan_with_due_dates("gone", &[(date(2026, 6, 9), false)]);
        deleted.tombstone(1);
        let records = vec![
            deleted,
            loan_with_due_dates("paid", &[(date(2026, 6, 9), true)]),
        ];

        assert!(derive_alerts(&records, 3, today).is_empty());
    }

    #[test]
    fn test_ties_keep_record_order() {
        let today = date(2026, 6, 10);
        let due = date(2026, 6, 11);
        let records = vec![
            loan_with_due_dates("first", &[(due, false)]),
            loan_with_due_dates("second", &[(due, false)]),
        ];

        let alerts = derive_alerts(&records, 3, today);
        assert_eq!(alerts[0].client_name, "first");
        assert_eq!(alerts[1].client_name, "second");
    }
}
