use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSettings {
    /// Days before a due date during which an installment is flagged
    pub warning_days: i64,
    pub currency: String,
}

impl Default for PortfolioSettings {
    fn default() -> Self {
        Self {
            warning_days: 3,
            currency: "R$".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSettingsInput {
    pub warning_days: Option<i64>,
    pub currency: Option<String>,
}

impl PortfolioSettings {
    pub fn apply(&mut self, input: UpdateSettingsInput) {
        if let Some(warning_days) = input.warning_days {
            self.warning_days = warning_days.max(0);
        }
        if let Some(currency) = input.currency {
            self.currency = currency;
        }
    }
}
