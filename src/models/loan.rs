use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One scheduled payment within a loan's repayment plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub number: u32,
    pub due_date: NaiveDate,
    pub value: f64,
    pub is_paid: bool,
}

/// Derived lifecycle state - cache, never the source of truth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Active,
    Late,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub principal: f64,
    pub installments_count: u32,
    pub interest_rate: f64,
    pub start_date: NaiveDate,
    pub status: LoanStatus,
    pub installments: Vec<Installment>,
    pub observation: String,

    // Sync metadata. Defaults keep payloads from before these fields
    // existed deserializable: a record with no stamp is the oldest
    // possible copy and loses every merge contest.
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub last_updated: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLoanInput {
    pub name: String,
    pub phone: String,
    pub principal: f64,
    pub total_receivable: f64,
    pub installments_count: u32,
    pub start_date: NaiveDate,
    pub observation: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoanEdits {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub observation: Option<String>,
}

/// Due date for the 1-based installment `number`: fixed month offsets from
/// the loan's start date. chrono clamps end-of-month overflow (Jan 31 + 1
/// month lands on the last day of February).
fn schedule_due_date(start_date: NaiveDate, number: u32) -> NaiveDate {
    start_date
        .checked_add_months(Months::new(number))
        .unwrap_or(start_date)
}

impl LoanRecord {
    /// Build a new loan with its full installment schedule.
    /// Starts Active, live, stamped with `now_millis`.
    pub fn create(input: CreateLoanInput, now_millis: i64) -> Self {
        let count = input.installments_count.max(1);
        let per_installment = input.total_receivable / count as f64;

        let installments = (1..=count)
            .map(|number| Installment {
                number,
                due_date: schedule_due_date(input.start_date, number),
                value: per_installment,
                is_paid: false,
            })
            .collect();

        let interest_rate = if input.principal > 0.0 {
            (input.total_receivable - input.principal) / input.principal * 100.0
        } else {
            0.0
        };

        LoanRecord {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            phone: input.phone,
            principal: input.principal,
            installments_count: count,
            interest_rate,
            start_date: input.start_date,
            status: LoanStatus::Active,
            installments,
            observation: input.observation,
            is_deleted: false,
            last_updated: now_millis,
        }
    }

    /// Total the borrower owes over the whole schedule
    pub fn total_receivable(&self) -> f64 {
        self.principal * (1.0 + self.interest_rate / 100.0)
    }

    /// Flip the paid flag on one installment. Returns false when the
    /// number is not part of the schedule.
    pub fn toggle_installment(&mut self, number: u32, now_millis: i64) -> bool {
        match self.installments.iter_mut().find(|i| i.number == number) {
            Some(installment) => {
                installment.is_paid = !installment.is_paid;
                self.last_updated = now_millis;
                true
            }
            None => false,
        }
    }

    pub fn apply_edits(&mut self, edits: LoanEdits, now_millis: i64) {
        if let Some(name) = edits.name {
            self.name = name;
        }
        if let Some(phone) = edits.phone {
            self.phone = phone;
        }
        if let Some(observation) = edits.observation {
            self.observation = observation;
        }
        self.last_updated = now_millis;
    }

    pub fn set_observation(&mut self, observation: String, now_millis: i64) {
        self.observation = observation;
        self.last_updated = now_millis;
    }

    /// Soft delete. The record stays in the set so the tombstone can
    /// propagate to other devices.
    pub fn tombstone(&mut self, now_millis: i64) {
        self.is_deleted = true;
        self.last_updated = now_millis;
    }

    pub fn restore(&mut self, now_millis: i64) {
        self.is_deleted = false;
        self.last_updated = now_millis;
    }

    /// Display grouping key: case-normalized client name
    pub fn client_key(&self) -> String {
        self.name.trim().to_lowercase()
    }
}
